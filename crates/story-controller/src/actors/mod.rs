//! Actor model implementation.
//!
//! Two actor types form the concurrency core:
//!
//! - [`lobby::LobbyActor`] (one per engine) owns the matchmaking pool and
//!   the active-game slot.
//! - [`game::GameActor`] (one per running game) owns all turn state and
//!   runs its own turn scheduler.
//!
//! Handles communicate with actors over bounded mailboxes; request-style
//! messages carry a oneshot `respond_to` channel.

pub mod game;
pub mod lobby;
pub mod messages;

pub use game::{GameActorHandle, GameSettings};
pub use lobby::{LobbyActorHandle, LobbyDeps};
pub use messages::{ActiveGame, GameEvent, GameSnapshot, PlayerView};
