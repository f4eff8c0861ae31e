//! Player entity and factory.

use std::sync::Arc;

use common::types::PlayerId;
use common::validity::TextChecker;

use crate::errors::EngineError;

/// A seated or queued player: immutable id plus a mutable display name.
/// Equality is by id only.
#[derive(Debug, Clone)]
pub struct Player {
    id: PlayerId,
    display_name: String,
}

impl Player {
    /// Construct directly, bypassing display-name validation. Prefer
    /// [`PlayerFactory::create`] outside of tests.
    #[must_use]
    pub fn new(id: PlayerId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
        }
    }

    #[must_use]
    pub fn id(&self) -> &PlayerId {
        &self.id
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn set_display_name(&mut self, display_name: impl Into<String>) {
        self.display_name = display_name.into();
    }
}

impl PartialEq for Player {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Player {}

/// Creates players, rejecting display names the injected checker refuses.
#[derive(Clone)]
pub struct PlayerFactory {
    display_name_checker: Arc<dyn TextChecker>,
}

impl PlayerFactory {
    #[must_use]
    pub fn new(display_name_checker: Arc<dyn TextChecker>) -> Self {
        Self {
            display_name_checker,
        }
    }

    /// Create a player, or fail with `InvalidInput` when the display name
    /// does not pass the checker.
    pub fn create(
        &self,
        id: PlayerId,
        display_name: impl Into<String>,
    ) -> Result<Player, EngineError> {
        let display_name = display_name.into();
        if !self.display_name_checker.is_valid(&display_name) {
            return Err(EngineError::InvalidInput("display name"));
        }
        Ok(Player { id, display_name })
    }
}
