//! Story Controller configuration.
//!
//! Configuration is loaded from environment variables; every setting has a
//! sensible default so the engine starts with no environment at all.

use std::collections::HashMap;
use std::env;
use std::time::Duration;

use thiserror::Error;

/// Default number of pooled players promoted into one game.
pub const DEFAULT_MATCH_SIZE: usize = 2;

/// Default seconds every player gets per turn.
pub const DEFAULT_SECONDS_PER_TURN: u32 = 10;

/// Default turn-scheduler tick interval in milliseconds.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1000;

/// Default minimum roster size for a game to keep running.
pub const DEFAULT_MIN_PLAYERS: usize = 2;

/// Default minimum display-name length accepted at join.
pub const DEFAULT_DISPLAY_NAME_MIN_LEN: usize = 3;

/// Story Controller configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// How many pooled players form a game (default: 2).
    pub match_size: usize,

    /// Seconds granted to every player per turn (default: 10).
    pub seconds_per_turn: u32,

    /// Turn-scheduler tick interval (default: 1s).
    pub tick_interval: Duration,

    /// A game ends once its roster drops below this size (default: 2).
    pub min_players: usize,

    /// Minimum display-name length accepted by the player factory
    /// (default: 3).
    pub display_name_min_len: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            match_size: DEFAULT_MATCH_SIZE,
            seconds_per_turn: DEFAULT_SECONDS_PER_TURN,
            tick_interval: Duration::from_millis(DEFAULT_TICK_INTERVAL_MS),
            min_players: DEFAULT_MIN_PLAYERS,
            display_name_min_len: DEFAULT_DISPLAY_NAME_MIN_LEN,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let match_size = vars
            .get("SL_MATCH_SIZE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_MATCH_SIZE);

        let seconds_per_turn = vars
            .get("SL_SECONDS_PER_TURN")
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_SECONDS_PER_TURN);

        let tick_interval_ms = vars
            .get("SL_TICK_INTERVAL_MS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_TICK_INTERVAL_MS);

        let min_players = vars
            .get("SL_MIN_PLAYERS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_MIN_PLAYERS);

        let display_name_min_len = vars
            .get("SL_DISPLAY_NAME_MIN_LEN")
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_DISPLAY_NAME_MIN_LEN);

        let config = Config {
            match_size,
            seconds_per_turn,
            tick_interval: Duration::from_millis(tick_interval_ms),
            min_players,
            display_name_min_len,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.match_size < 2 {
            return Err(ConfigError::InvalidValue(format!(
                "SL_MATCH_SIZE must be at least 2, got {}",
                self.match_size
            )));
        }
        if self.min_players < 2 {
            return Err(ConfigError::InvalidValue(format!(
                "SL_MIN_PLAYERS must be at least 2, got {}",
                self.min_players
            )));
        }
        if self.seconds_per_turn == 0 {
            return Err(ConfigError::InvalidValue(
                "SL_SECONDS_PER_TURN must be at least 1".to_string(),
            ));
        }
        if self.tick_interval < Duration::from_millis(10) {
            return Err(ConfigError::InvalidValue(format!(
                "SL_TICK_INTERVAL_MS must be at least 10, got {}",
                self.tick_interval.as_millis()
            )));
        }
        Ok(())
    }
}
