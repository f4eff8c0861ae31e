//! Message and snapshot types for the lobby and game actors.
//!
//! Handles talk to actors by sending one of these messages over the actor's
//! mailbox; request/response messages carry a `respond_to` oneshot sender.

use common::types::{GameId, PlayerId, RequestId};
use serde::Serialize;
use tokio::sync::oneshot;

use crate::errors::EngineError;
use crate::player::Player;
use crate::stats::GameStats;

/// One roster member as seen by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerView {
    pub player_id: PlayerId,
    pub display_name: String,
    pub is_current_turn: bool,
}

/// Point-in-time view of one game, published after every mutation and tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameSnapshot {
    pub game_id: GameId,
    /// Roster in turn order; exactly one entry has `is_current_turn` while
    /// the game is running.
    pub players: Vec<PlayerView>,
    pub seconds_per_turn: u32,
    pub seconds_left_in_turn: u32,
    pub story_text: String,
    pub game_over: bool,
}

impl GameSnapshot {
    /// The player currently holding the turn, if the game is running.
    #[must_use]
    pub fn current_turn_player(&self) -> Option<&PlayerView> {
        if self.game_over {
            return None;
        }
        self.players.iter().find(|p| p.is_current_turn)
    }
}

/// Messages handled by a game actor.
#[derive(Debug)]
pub enum GameMessage {
    SubmitWord {
        player_id: PlayerId,
        word: String,
        respond_to: oneshot::Sender<Result<GameSnapshot, EngineError>>,
    },
    RemovePlayer {
        player_id: PlayerId,
        /// Resolves with whether the player was present.
        respond_to: oneshot::Sender<Result<bool, EngineError>>,
    },
    AddPlayer {
        player: Player,
        respond_to: oneshot::Sender<Result<GameSnapshot, EngineError>>,
    },
    GetStats {
        respond_to: oneshot::Sender<GameStats>,
    },
}

/// Events a game actor reports back to its lobby.
#[derive(Debug)]
pub enum GameEvent {
    /// A player left the roster (the game keeps running).
    PlayerRemoved { game_id: GameId, player_id: PlayerId },
    /// The game reached its terminal state.
    Ended {
        game_id: GameId,
        final_snapshot: GameSnapshot,
        stats: GameStats,
    },
}

/// Messages handled by the lobby actor.
#[derive(Debug)]
pub enum LobbyMessage {
    JoinPool {
        player: Player,
        /// The join request's registrar id; promotion or cancellation
        /// resolves it.
        request_id: RequestId,
        respond_to: oneshot::Sender<Result<(), EngineError>>,
    },
    Disconnect {
        player_id: PlayerId,
        respond_to: oneshot::Sender<()>,
    },
    GetActiveGame {
        respond_to: oneshot::Sender<Option<ActiveGame>>,
    },
    Shutdown {
        respond_to: oneshot::Sender<()>,
    },
}

/// Handle plus snapshot feed for the game currently occupying the active
/// slot.
#[derive(Debug, Clone)]
pub struct ActiveGame {
    pub handle: super::game::GameActorHandle,
    pub snapshots: tokio::sync::watch::Receiver<GameSnapshot>,
}
