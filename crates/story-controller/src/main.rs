//! Story Controller
//!
//! Server-side engine for the Storyloom collaborative word game.
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment
//! 2. Construct checkers, statistics factory, and repositories
//! 3. Start the actor system behind the [`GameService`] facade
//! 4. Spawn the snapshot observer (the presentation layer's stand-in)
//! 5. Wait for shutdown signal
//!
//! Shutdown is cooperative: new operations are rejected with
//! `SHUTTING_DOWN` while pending waits are drained with the same signal
//! and all schedulers stop.

#![warn(clippy::pedantic)]

use std::time::Duration;

use story_controller::config::Config;
use story_controller::service::{EngineDeps, GameService};
use tokio::signal;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use common::types::RequestId;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "story_controller=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Story Controller");

    // Load configuration
    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        match_size = config.match_size,
        seconds_per_turn = config.seconds_per_turn,
        tick_interval_ms = config.tick_interval.as_millis() as u64,
        min_players = config.min_players,
        display_name_min_len = config.display_name_min_len,
        "Configuration loaded successfully"
    );

    // Wire checkers, statistics, and repositories into the actor system
    let deps = EngineDeps::standard(&config);
    let service = GameService::new(config, deps);
    info!("Actor system initialized");

    // Snapshot observer: stands in for the presentation layer, logging the
    // active game's state as it evolves.
    let observer = tokio::spawn(run_snapshot_observer(service.clone()));

    // Wait for shutdown signal
    info!("Story Controller running - press Ctrl+C to shutdown");
    shutdown_signal().await;

    info!("Shutdown signal received, initiating graceful shutdown...");
    let response = service
        .shutdown(RequestId::from("signal-shutdown"))
        .await;
    debug!(code = ?response.code, "Shutdown request completed");

    observer.abort();

    // Give detached cleanup tasks a moment to finish
    tokio::time::sleep(Duration::from_millis(500)).await;

    info!("Story Controller shutdown complete");
    Ok(())
}

/// Periodically log the active game's snapshot.
///
/// A real deployment would push these DTOs to the presentation layer; the
/// engine treats that layer as out of scope, so this task just traces them.
async fn run_snapshot_observer(service: GameService) {
    let mut ticker = tokio::time::interval(Duration::from_secs(2));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut last_story = String::new();

    loop {
        ticker.tick().await;
        if let Some(snapshot) = service.game_snapshot().await {
            if snapshot.story_text != last_story {
                last_story = snapshot.story_text.clone();
                info!(
                    target: "sl.observer",
                    game_id = %snapshot.game_id,
                    story = %snapshot.story_text,
                    "Story progressed"
                );
            }
            let current_turn = snapshot
                .current_turn_player()
                .map_or_else(|| "-".to_string(), |p| p.player_id.to_string());
            debug!(
                target: "sl.observer",
                game_id = %snapshot.game_id,
                current_turn = %current_turn,
                seconds_left = snapshot.seconds_left_in_turn,
                game_over = snapshot.game_over,
                "Game state"
            );
        }
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
///
/// # Panics
///
/// Panics if signal handlers cannot be installed. This is acceptable
/// because without signal handlers, we cannot gracefully shut down the
/// service.
async fn shutdown_signal() {
    let ctrl_c = async {
        #[expect(
            clippy::expect_used,
            reason = "Signal handler installation is critical - panic is appropriate if it fails"
        )]
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        #[expect(
            clippy::expect_used,
            reason = "Signal handler installation is critical - panic is appropriate if it fails"
        )]
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
