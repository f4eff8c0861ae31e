//! `GameActor` - per-game actor that owns all turn state.
//!
//! Each `GameActor`:
//! - Owns one game's roster, turn pointer, countdown, story, and statistics
//! - Runs the turn scheduler as an interval arm of its own message loop,
//!   so a timeout-driven turn switch can never interleave with a
//!   submission-driven one
//! - Reports roster changes and its terminal transition to the lobby over
//!   an event channel
//! - Publishes a snapshot on every mutation and tick for observers
//!
//! All mutating operations on one game are serialized by the mailbox; the
//! observable effect is as if they executed in some serial order.

use std::time::Duration;

use common::types::{GameId, PlayerId};
use common::validity::TextChecker;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::messages::{GameEvent, GameMessage, GameSnapshot, PlayerView};
use crate::errors::EngineError;
use crate::player::Player;
use crate::stats::{GameStats, MetricSet};
use crate::story::Story;

/// Channel buffer size for the game mailbox.
const GAME_CHANNEL_BUFFER: usize = 256;

/// Fixed per-game rules, set at promotion time.
#[derive(Debug, Clone)]
pub struct GameSettings {
    /// Seconds granted to every player per turn.
    pub seconds_per_turn: u32,
    /// Scheduler tick interval; one second of turn time elapses per tick.
    pub tick_interval: Duration,
    /// The game ends once the roster drops below this size.
    pub min_players: usize,
}

/// Handle to a `GameActor`.
#[derive(Debug, Clone)]
pub struct GameActorHandle {
    sender: mpsc::Sender<GameMessage>,
    cancel_token: CancellationToken,
    game_id: GameId,
}

impl GameActorHandle {
    /// Get the game ID.
    #[must_use]
    pub fn game_id(&self) -> GameId {
        self.game_id
    }

    /// Submit a word for the given player. Returns the post-submission
    /// snapshot on success.
    pub async fn submit_word(
        &self,
        player_id: PlayerId,
        word: String,
    ) -> Result<GameSnapshot, EngineError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(GameMessage::SubmitWord {
                player_id,
                word,
                respond_to: tx,
            })
            .await
            .map_err(|_| EngineError::GameOver)?;

        rx.await.map_err(|_| EngineError::GameOver)?
    }

    /// Remove a player from the roster. Resolves with whether the player
    /// was present; removal from an already-over game reports `GameOver`.
    pub async fn remove_player(&self, player_id: PlayerId) -> Result<bool, EngineError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(GameMessage::RemovePlayer {
                player_id,
                respond_to: tx,
            })
            .await
            .map_err(|_| EngineError::GameOver)?;

        rx.await.map_err(|_| EngineError::GameOver)?
    }

    /// Seat an additional player mid-game.
    pub async fn add_player(&self, player: Player) -> Result<GameSnapshot, EngineError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(GameMessage::AddPlayer {
                player,
                respond_to: tx,
            })
            .await
            .map_err(|_| EngineError::GameOver)?;

        rx.await.map_err(|_| EngineError::GameOver)?
    }

    /// Current per-player statistics.
    pub async fn stats(&self) -> Result<GameStats, EngineError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(GameMessage::GetStats { respond_to: tx })
            .await
            .map_err(|_| EngineError::GameOver)?;

        rx.await.map_err(|_| EngineError::GameOver)
    }

    /// Cancel the game actor.
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    /// Check if the actor is cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }
}

/// The `GameActor` implementation.
pub struct GameActor {
    game_id: GameId,
    receiver: mpsc::Receiver<GameMessage>,
    /// Cancellation token (child of the lobby's token).
    cancel_token: CancellationToken,
    /// Roster in insertion order; turn sequencing follows this order.
    roster: Vec<Player>,
    /// Index into `roster` of the player whose turn it is.
    turn_index: usize,
    settings: GameSettings,
    seconds_left: u32,
    story: Story,
    metrics: MetricSet,
    game_over: bool,
    /// Events back to the lobby.
    events: mpsc::Sender<GameEvent>,
    /// Snapshot feed for observers.
    snapshots: watch::Sender<GameSnapshot>,
}

impl GameActor {
    /// Spawn a new game actor over the given roster.
    ///
    /// Returns a handle, the snapshot feed, and the task join handle.
    pub fn spawn(
        game_id: GameId,
        roster: Vec<Player>,
        settings: GameSettings,
        word_checker: Arc<dyn TextChecker>,
        metrics: MetricSet,
        events: mpsc::Sender<GameEvent>,
        cancel_token: CancellationToken,
    ) -> (
        GameActorHandle,
        watch::Receiver<GameSnapshot>,
        JoinHandle<()>,
    ) {
        let (sender, receiver) = mpsc::channel(GAME_CHANNEL_BUFFER);

        let seconds_left = settings.seconds_per_turn;
        let mut actor = Self {
            game_id,
            receiver,
            cancel_token: cancel_token.clone(),
            roster,
            turn_index: 0,
            settings,
            seconds_left,
            story: Story::new(word_checker),
            metrics,
            game_over: false,
            events,
            snapshots: watch::channel(GameSnapshot {
                game_id,
                players: Vec::new(),
                seconds_per_turn: seconds_left,
                seconds_left_in_turn: seconds_left,
                story_text: String::new(),
                game_over: false,
            })
            .0,
        };
        actor.publish_snapshot();
        let snapshot_rx = actor.snapshots.subscribe();

        let task_handle = tokio::spawn(actor.run());

        let handle = GameActorHandle {
            sender,
            cancel_token,
            game_id,
        };

        (handle, snapshot_rx, task_handle)
    }

    /// Run the actor message loop. The turn scheduler is the interval arm:
    /// it shares the mailbox's exclusion domain and is disabled the moment
    /// the game is over.
    #[instrument(skip_all, name = "sl.actor.game", fields(game_id = %self.game_id))]
    async fn run(mut self) {
        info!(
            target: "sl.actor.game",
            roster = self.roster.len(),
            seconds_per_turn = self.settings.seconds_per_turn,
            "GameActor started"
        );

        let mut ticker = tokio::time::interval_at(
            Instant::now() + self.settings.tick_interval,
            self.settings.tick_interval,
        );
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                () = self.cancel_token.cancelled() => {
                    info!(
                        target: "sl.actor.game",
                        game_id = %self.game_id,
                        "GameActor received cancellation signal"
                    );
                    break;
                }

                _ = ticker.tick(), if !self.game_over => {
                    self.handle_tick().await;
                }

                msg = self.receiver.recv() => {
                    match msg {
                        Some(message) => self.handle_message(message).await,
                        None => {
                            info!(
                                target: "sl.actor.game",
                                game_id = %self.game_id,
                                "GameActor channel closed, exiting"
                            );
                            break;
                        }
                    }
                }
            }
        }

        info!(
            target: "sl.actor.game",
            game_id = %self.game_id,
            game_over = self.game_over,
            words = self.story.len(),
            "GameActor stopped"
        );
    }

    /// Handle a single message.
    async fn handle_message(&mut self, message: GameMessage) {
        match message {
            GameMessage::SubmitWord {
                player_id,
                word,
                respond_to,
            } => {
                let result = self.handle_submit(&player_id, &word);
                let _ = respond_to.send(result);
            }

            GameMessage::RemovePlayer {
                player_id,
                respond_to,
            } => {
                let result = self.handle_remove(&player_id).await;
                let _ = respond_to.send(result);
            }

            GameMessage::AddPlayer { player, respond_to } => {
                let result = self.handle_add(player);
                let _ = respond_to.send(result);
            }

            GameMessage::GetStats { respond_to } => {
                let _ = respond_to.send(self.metrics.snapshot());
            }
        }
    }

    /// One scheduler tick: burn one second of the current turn and switch
    /// on timeout. Timeouts record no statistics for the skipped player.
    async fn handle_tick(&mut self) {
        self.seconds_left = self.seconds_left.saturating_sub(1);
        if self.seconds_left == 0 {
            if let Some(timed_out) = self.current_player_id() {
                debug!(
                    target: "sl.actor.game",
                    game_id = %self.game_id,
                    timed_out_player = %timed_out,
                    "Turn timed out, switching"
                );
            }
            self.switch_turn();
        }
        self.publish_snapshot();
    }

    /// Handle a word submission by the given player.
    fn handle_submit(
        &mut self,
        player_id: &PlayerId,
        word: &str,
    ) -> Result<GameSnapshot, EngineError> {
        if self.game_over {
            return Err(EngineError::GameOver);
        }
        let current = self.current_player_id().ok_or(EngineError::GameOver)?;
        if &current != player_id {
            debug!(
                target: "sl.actor.game",
                game_id = %self.game_id,
                player_id = %player_id,
                "Submission out of turn"
            );
            return Err(EngineError::NotYourTurn);
        }

        self.story.try_append(player_id, word)?;

        let seconds_elapsed = self
            .settings
            .seconds_per_turn
            .saturating_sub(self.seconds_left);
        self.metrics.record_turn(player_id, word, seconds_elapsed);

        debug!(
            target: "sl.actor.game",
            game_id = %self.game_id,
            player_id = %player_id,
            seconds_elapsed,
            words = self.story.len(),
            "Word accepted"
        );

        self.switch_turn();
        self.publish_snapshot();
        Ok(self.snapshot())
    }

    /// Remove a player from the roster with turn-pointer fix-up.
    async fn handle_remove(&mut self, player_id: &PlayerId) -> Result<bool, EngineError> {
        if self.game_over {
            return Err(EngineError::GameOver);
        }
        let Some(idx) = self.roster.iter().position(|p| p.id() == player_id) else {
            return Ok(false);
        };

        self.roster.remove(idx);
        info!(
            target: "sl.actor.game",
            game_id = %self.game_id,
            player_id = %player_id,
            remaining = self.roster.len(),
            "Player removed from roster"
        );
        let _ = self
            .events
            .send(GameEvent::PlayerRemoved {
                game_id: self.game_id,
                player_id: player_id.clone(),
            })
            .await;

        if self.roster.is_empty() {
            self.end_game("roster emptied").await;
            return Ok(true);
        }

        if idx < self.turn_index {
            // Removal shifted the current player down by one.
            self.turn_index -= 1;
        } else if idx == self.turn_index {
            // The removed player held the turn: the pointer now references
            // the next player in order, who gets a fresh countdown.
            if self.turn_index >= self.roster.len() {
                self.turn_index = 0;
            }
            self.seconds_left = self.settings.seconds_per_turn;
        }

        if self.roster.len() < self.settings.min_players {
            self.end_game("roster below minimum").await;
            return Ok(true);
        }

        self.publish_snapshot();
        Ok(true)
    }

    /// Seat an additional player at the end of the turn order.
    fn handle_add(&mut self, player: Player) -> Result<GameSnapshot, EngineError> {
        if self.game_over {
            return Err(EngineError::GameOver);
        }
        if self.roster.iter().any(|p| p.id() == player.id()) {
            return Err(EngineError::IdInUse);
        }
        info!(
            target: "sl.actor.game",
            game_id = %self.game_id,
            player_id = %player.id(),
            "Player joined mid-game"
        );
        self.roster.push(player);
        self.publish_snapshot();
        Ok(self.snapshot())
    }

    /// Advance the turn pointer cyclically and reset the countdown.
    fn switch_turn(&mut self) {
        if self.roster.is_empty() {
            return;
        }
        self.turn_index = (self.turn_index + 1) % self.roster.len();
        self.seconds_left = self.settings.seconds_per_turn;
    }

    /// Transition to the terminal state exactly once: final snapshot, stop
    /// ticking, report to the lobby.
    async fn end_game(&mut self, reason: &'static str) {
        if self.game_over {
            return;
        }
        self.game_over = true;
        self.publish_snapshot();

        info!(
            target: "sl.actor.game",
            game_id = %self.game_id,
            reason,
            words = self.story.len(),
            "Game over"
        );

        let event = GameEvent::Ended {
            game_id: self.game_id,
            final_snapshot: self.snapshot(),
            stats: self.metrics.snapshot(),
        };
        if self.events.send(event).await.is_err() {
            warn!(
                target: "sl.actor.game",
                game_id = %self.game_id,
                "Lobby gone, game-over event dropped"
            );
        }
    }

    fn current_player_id(&self) -> Option<PlayerId> {
        if self.game_over {
            return None;
        }
        self.roster.get(self.turn_index).map(|p| p.id().clone())
    }

    fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            game_id: self.game_id,
            players: self
                .roster
                .iter()
                .enumerate()
                .map(|(i, p)| PlayerView {
                    player_id: p.id().clone(),
                    display_name: p.display_name().to_string(),
                    is_current_turn: !self.game_over && i == self.turn_index,
                })
                .collect(),
            seconds_per_turn: self.settings.seconds_per_turn,
            seconds_left_in_turn: self.seconds_left,
            story_text: self.story.text(),
            game_over: self.game_over,
        }
    }

    fn publish_snapshot(&self) {
        self.snapshots.send_replace(self.snapshot());
    }
}
