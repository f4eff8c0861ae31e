//! Story Controller error types.
//!
//! Errors come in two tiers. Contract violations (`IdInUse`, `GameRunning`,
//! `DuplicateRequest`) indicate a caller sequencing bug: they abort only the
//! offending call and are logged loudly. Domain outcomes (`NotYourTurn`,
//! `InvalidWord`, `GameOver`, ...) are ordinary results of gameplay and are
//! delivered to the presentation layer as response codes.

use common::types::{RequestId, StoryId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Story Controller error type.
///
/// Every variant maps to a [`ResponseCode`] via [`EngineError::response_code`].
#[derive(Debug, Error)]
pub enum EngineError {
    /// Player id is already queued or seated.
    #[error("player id already in use")]
    IdInUse,

    /// A non-terminal game already occupies the active slot.
    #[error("a game is already running")]
    GameRunning,

    /// Request id is already pending in the registrar.
    #[error("duplicate request id: {0}")]
    DuplicateRequest(RequestId),

    /// The engine is draining; no new work is accepted.
    #[error("server is shutting down")]
    ShuttingDown,

    /// No game occupies the active slot.
    #[error("no active game")]
    NoActiveGame,

    /// Submission by a player who does not hold the turn.
    #[error("not this player's turn")]
    NotYourTurn,

    /// Word rejected by the injected validity checker.
    #[error("word rejected by validity checker")]
    InvalidWord,

    /// Mutating operation against a game that is already over.
    #[error("game is over")]
    GameOver,

    /// Unknown story id.
    #[error("story not found: {0}")]
    StoryNotFound(StoryId),

    /// Unknown suggested title for the story.
    #[error("title not found")]
    TitleNotFound,

    /// Player-supplied text rejected by a checker (display name, title,
    /// comment, guest name).
    #[error("input rejected: {0}")]
    InvalidInput(&'static str),
}

/// Response codes delivered to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseCode {
    Ok,
    InvalidWord,
    NotYourTurn,
    NoActiveGame,
    GameOver,
    IdInUse,
    GameRunning,
    DuplicateRequest,
    ShuttingDown,
    InvalidInput,
    NotFound,
}

impl EngineError {
    /// Returns the response code for this error.
    #[must_use]
    pub fn response_code(&self) -> ResponseCode {
        match self {
            EngineError::IdInUse => ResponseCode::IdInUse,
            EngineError::GameRunning => ResponseCode::GameRunning,
            EngineError::DuplicateRequest(_) => ResponseCode::DuplicateRequest,
            EngineError::ShuttingDown => ResponseCode::ShuttingDown,
            EngineError::NoActiveGame => ResponseCode::NoActiveGame,
            EngineError::NotYourTurn => ResponseCode::NotYourTurn,
            EngineError::InvalidWord => ResponseCode::InvalidWord,
            EngineError::GameOver => ResponseCode::GameOver,
            EngineError::StoryNotFound(_) | EngineError::TitleNotFound => ResponseCode::NotFound,
            EngineError::InvalidInput(_) => ResponseCode::InvalidInput,
        }
    }

    /// Whether this error indicates a caller sequencing bug rather than a
    /// reachable gameplay outcome.
    #[must_use]
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            EngineError::IdInUse | EngineError::GameRunning | EngineError::DuplicateRequest(_)
        )
    }
}
