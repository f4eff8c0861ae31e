//! Shared identifier types for Storyloom components.
//!
//! Player and request ids are caller-supplied opaque strings; game ids are
//! generated server-side, and story ids are sequential numbers assigned by
//! the story repository.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a player. Supplied by the caller; two players are
/// the same player exactly when their ids are equal, regardless of display
/// name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub String);

impl PlayerId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Caller-chosen identifier for one inbound request. Must be unique among
/// requests that are still pending.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub String);

impl RequestId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RequestId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Unique identifier for a game instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameId(pub Uuid);

impl GameId {
    /// Create a new random game ID
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for GameId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier for a published story, assigned sequentially by the story
/// repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StoryId(pub u64);

impl fmt::Display for StoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_player_equality_is_by_id() {
        assert_eq!(PlayerId::from("1"), PlayerId::from("1"));
        assert_ne!(PlayerId::from("1"), PlayerId::from("2"));
    }

    #[test]
    fn test_game_ids_are_unique() {
        assert_ne!(GameId::new(), GameId::new());
    }

    #[test]
    fn test_ids_serialize_transparently() {
        let json = serde_json::to_string(&PlayerId::from("p-7")).unwrap();
        assert_eq!(json, "\"p-7\"");

        let story = serde_json::to_string(&StoryId(42)).unwrap();
        assert_eq!(story, "42");
    }
}
