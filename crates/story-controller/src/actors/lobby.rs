//! `LobbyActor` - supervisor that owns the player pool and the active game.
//!
//! The lobby's mailbox is the mutual-exclusion domain for everything the
//! pool and the active-game slot do: enqueue, cancel, promotion, and
//! disconnect routing are serialized here, so a player can never be
//! double-matched or match while being cancelled.
//!
//! Promotion policy: when the pool reaches the match size *and* the active
//! slot is free (empty, or holding a finished game), the earliest entries
//! are drained atomically into a new `GameActor` and every drained join
//! request is resolved with the new game's snapshot. While a game is
//! running the pool keeps accumulating; promotion re-fires when the game
//! reports its end.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use common::types::{GameId, PlayerId, RequestId};
use common::validity::TextChecker;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use super::game::{GameActor, GameActorHandle, GameSettings};
use super::messages::{ActiveGame, GameEvent, GameSnapshot, LobbyMessage};
use crate::config::Config;
use crate::errors::{EngineError, ResponseCode};
use crate::player::Player;
use crate::registrar::RequestRegistrar;
use crate::response::{Response, ResponseBody};
use crate::stats::{MetricSet, MetricsFactory};
use crate::storage::stories::StoryRepo;

/// Channel buffer size for the lobby mailbox.
const LOBBY_CHANNEL_BUFFER: usize = 256;

/// Channel buffer size for game -> lobby events.
const GAME_EVENT_BUFFER: usize = 64;

/// Collaborators injected into the lobby at construction.
pub struct LobbyDeps {
    /// Word validity checker handed to every new game.
    pub word_checker: Arc<dyn TextChecker>,
    /// Produces a fresh statistics collector set per game.
    pub metrics_factory: MetricsFactory,
    /// Finished stories are published here.
    pub stories: Arc<StoryRepo>,
    /// Pool join requests are resolved through the registrar.
    pub registrar: Arc<RequestRegistrar>,
}

/// Handle to the `LobbyActor`.
#[derive(Clone)]
pub struct LobbyActorHandle {
    sender: mpsc::Sender<LobbyMessage>,
    cancel_token: CancellationToken,
}

impl LobbyActorHandle {
    /// Create a new `LobbyActor` and return a handle to it.
    ///
    /// This spawns the actor task and returns immediately.
    #[must_use]
    pub fn new(config: Config, deps: LobbyDeps) -> Self {
        let (sender, receiver) = mpsc::channel(LOBBY_CHANNEL_BUFFER);
        let cancel_token = CancellationToken::new();

        let actor = LobbyActor::new(config, deps, receiver, cancel_token.clone());
        tokio::spawn(actor.run());

        Self {
            sender,
            cancel_token,
        }
    }

    /// Queue a player for matchmaking. The join request resolves through
    /// the registrar when the player is promoted or cancelled.
    pub async fn join_pool(
        &self,
        player: Player,
        request_id: RequestId,
    ) -> Result<(), EngineError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(LobbyMessage::JoinPool {
                player,
                request_id,
                respond_to: tx,
            })
            .await
            .map_err(|_| EngineError::ShuttingDown)?;

        rx.await.map_err(|_| EngineError::ShuttingDown)?
    }

    /// Disconnect a player wherever they are (pool or active game).
    /// Idempotent: unknown ids are a no-op.
    pub async fn disconnect(&self, player_id: PlayerId) -> Result<(), EngineError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(LobbyMessage::Disconnect {
                player_id,
                respond_to: tx,
            })
            .await
            .map_err(|_| EngineError::ShuttingDown)?;

        rx.await.map_err(|_| EngineError::ShuttingDown)
    }

    /// The game currently occupying the active slot, if any (terminal games
    /// included; they answer every mutation with the game-over signal).
    pub async fn active_game(&self) -> Result<Option<ActiveGame>, EngineError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(LobbyMessage::GetActiveGame { respond_to: tx })
            .await
            .map_err(|_| EngineError::ShuttingDown)?;

        rx.await.map_err(|_| EngineError::ShuttingDown)
    }

    /// Initiate graceful shutdown: stop accepting joins, cancel the active
    /// game, resolve queued joins with the shutdown signal.
    pub async fn shutdown(&self) -> Result<(), EngineError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(LobbyMessage::Shutdown { respond_to: tx })
            .await
            .map_err(|_| EngineError::ShuttingDown)?;

        rx.await.map_err(|_| EngineError::ShuttingDown)
    }

    /// Cancel the actor (for immediate shutdown).
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    /// Check if the actor is cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    /// Get a child token for spawning dependent tasks.
    #[must_use]
    pub fn child_token(&self) -> CancellationToken {
        self.cancel_token.child_token()
    }
}

/// A waiting player plus the join request that will be resolved on
/// promotion or cancellation.
struct PoolEntry {
    player: Player,
    request_id: RequestId,
}

/// Internal state for the game occupying the active slot.
struct ManagedGame {
    handle: GameActorHandle,
    snapshots: tokio::sync::watch::Receiver<GameSnapshot>,
    task_handle: JoinHandle<()>,
    /// Set when the game reports its terminal transition; a terminal game
    /// frees the slot for the next promotion.
    over: bool,
}

/// The `LobbyActor` implementation.
pub struct LobbyActor {
    receiver: mpsc::Receiver<LobbyMessage>,
    /// Root cancellation token; each game gets a child.
    cancel_token: CancellationToken,
    config: Config,
    word_checker: Arc<dyn TextChecker>,
    metrics_factory: MetricsFactory,
    stories: Arc<StoryRepo>,
    registrar: Arc<RequestRegistrar>,
    /// FIFO matchmaking pool; queue order is fairness order.
    pool: VecDeque<PoolEntry>,
    active: Option<ManagedGame>,
    /// Ids seated in the active game; kept in sync via game events.
    seated: HashSet<PlayerId>,
    game_events_tx: mpsc::Sender<GameEvent>,
    game_events_rx: mpsc::Receiver<GameEvent>,
    draining: bool,
}

impl LobbyActor {
    fn new(
        config: Config,
        deps: LobbyDeps,
        receiver: mpsc::Receiver<LobbyMessage>,
        cancel_token: CancellationToken,
    ) -> Self {
        let (game_events_tx, game_events_rx) = mpsc::channel(GAME_EVENT_BUFFER);

        Self {
            receiver,
            cancel_token,
            config,
            word_checker: deps.word_checker,
            metrics_factory: deps.metrics_factory,
            stories: deps.stories,
            registrar: deps.registrar,
            pool: VecDeque::new(),
            active: None,
            seated: HashSet::new(),
            game_events_tx,
            game_events_rx,
            draining: false,
        }
    }

    /// Run the actor message loop.
    #[instrument(skip_all, name = "sl.actor.lobby")]
    async fn run(mut self) {
        info!(
            target: "sl.actor.lobby",
            match_size = self.config.match_size,
            "LobbyActor started"
        );

        loop {
            tokio::select! {
                () = self.cancel_token.cancelled() => {
                    info!(
                        target: "sl.actor.lobby",
                        "LobbyActor received cancellation signal"
                    );
                    self.graceful_shutdown();
                    break;
                }

                event = self.game_events_rx.recv() => {
                    if let Some(event) = event {
                        self.handle_game_event(event).await;
                    }
                }

                msg = self.receiver.recv() => {
                    match msg {
                        Some(message) => self.handle_message(message).await,
                        None => {
                            info!(
                                target: "sl.actor.lobby",
                                "LobbyActor channel closed, exiting"
                            );
                            self.graceful_shutdown();
                            break;
                        }
                    }
                }
            }
        }

        info!(
            target: "sl.actor.lobby",
            pooled = self.pool.len(),
            "LobbyActor stopped"
        );
    }

    /// Handle a single message.
    async fn handle_message(&mut self, message: LobbyMessage) {
        match message {
            LobbyMessage::JoinPool {
                player,
                request_id,
                respond_to,
            } => {
                let result = self.handle_join(player, request_id);
                let accepted = result.is_ok();
                let _ = respond_to.send(result);
                if accepted {
                    self.try_promote();
                }
            }

            LobbyMessage::Disconnect {
                player_id,
                respond_to,
            } => {
                self.handle_disconnect(&player_id);
                let _ = respond_to.send(());
            }

            LobbyMessage::GetActiveGame { respond_to } => {
                let active = self.active.as_ref().map(|g| ActiveGame {
                    handle: g.handle.clone(),
                    snapshots: g.snapshots.clone(),
                });
                let _ = respond_to.send(active);
            }

            LobbyMessage::Shutdown { respond_to } => {
                info!(
                    target: "sl.actor.lobby",
                    pooled = self.pool.len(),
                    "Initiating graceful shutdown"
                );
                self.draining = true;
                self.cancel_token.cancel();
                let _ = respond_to.send(());
            }
        }
    }

    /// Queue a player, enforcing the one-place-at-a-time invariant.
    fn handle_join(&mut self, player: Player, request_id: RequestId) -> Result<(), EngineError> {
        if self.draining {
            return Err(EngineError::ShuttingDown);
        }

        let id = player.id().clone();
        let pooled = self.pool.iter().any(|e| e.player.id() == &id);
        if pooled || self.seated.contains(&id) {
            warn!(
                target: "sl.actor.lobby",
                player_id = %id,
                pooled,
                "Join rejected, id already in use"
            );
            return Err(EngineError::IdInUse);
        }

        self.pool.push_back(PoolEntry { player, request_id });
        debug!(
            target: "sl.actor.lobby",
            player_id = %id,
            pooled = self.pool.len(),
            "Player queued"
        );
        Ok(())
    }

    /// Cancel from the pool, or forward removal to the active game.
    fn handle_disconnect(&mut self, player_id: &PlayerId) {
        if let Some(pos) = self.pool.iter().position(|e| e.player.id() == player_id) {
            if let Some(entry) = self.pool.remove(pos) {
                info!(
                    target: "sl.actor.lobby",
                    player_id = %player_id,
                    "Pool entry cancelled"
                );
                self.registrar
                    .resolve(&entry.request_id, Response::ok_with(ResponseBody::PoolCancelled));
            }
            return;
        }

        if self.seated.contains(player_id) {
            if let Some(game) = &self.active {
                debug!(
                    target: "sl.actor.lobby",
                    player_id = %player_id,
                    game_id = %game.handle.game_id(),
                    "Forwarding disconnect to active game"
                );
                // Forwarded outside the lobby's loop; the game's own mailbox
                // serializes it and removal is idempotent there.
                let handle = game.handle.clone();
                let player_id = player_id.clone();
                tokio::spawn(async move {
                    match handle.remove_player(player_id.clone()).await {
                        Ok(removed) => debug!(
                            target: "sl.actor.lobby",
                            player_id = %player_id,
                            removed,
                            "Disconnect removal completed"
                        ),
                        Err(e) => debug!(
                            target: "sl.actor.lobby",
                            player_id = %player_id,
                            error = %e,
                            "Disconnect removal not applied"
                        ),
                    }
                });
            }
            return;
        }

        debug!(
            target: "sl.actor.lobby",
            player_id = %player_id,
            "Disconnect for id in neither pool nor game, no-op"
        );
    }

    /// Promote pooled players whenever a full batch and a free slot line up.
    fn try_promote(&mut self) {
        while !self.draining && self.pool.len() >= self.config.match_size && self.slot_free() {
            let batch: Vec<PoolEntry> = self.pool.drain(..self.config.match_size).collect();
            if let Err(e) = self.install_game(batch) {
                // Contract violation: the slot must be free here.
                error!(
                    target: "sl.actor.lobby",
                    error = %e,
                    "Promotion failed against an occupied slot"
                );
                break;
            }
        }
    }

    fn slot_free(&self) -> bool {
        self.active.as_ref().map_or(true, |g| g.over)
    }

    /// Install a new game over the batch. Fails with `GameRunning` when a
    /// non-terminal game already occupies the slot.
    fn install_game(&mut self, batch: Vec<PoolEntry>) -> Result<(), EngineError> {
        if !self.slot_free() {
            for entry in batch {
                self.registrar.resolve(
                    &entry.request_id,
                    Response::code_only(ResponseCode::GameRunning),
                );
            }
            return Err(EngineError::GameRunning);
        }

        // Discard the previous, terminal game actor.
        if let Some(old) = self.active.take() {
            old.handle.cancel();
            self.detach_cleanup(old);
        }

        let game_id = GameId::new();
        let roster: Vec<Player> = batch.iter().map(|e| e.player.clone()).collect();
        let settings = GameSettings {
            seconds_per_turn: self.config.seconds_per_turn,
            tick_interval: self.config.tick_interval,
            min_players: self.config.min_players,
        };
        let metrics = MetricSet::new((self.metrics_factory)());

        let (handle, snapshots, task_handle) = GameActor::spawn(
            game_id,
            roster,
            settings,
            Arc::clone(&self.word_checker),
            metrics,
            self.game_events_tx.clone(),
            self.cancel_token.child_token(),
        );

        self.seated = batch.iter().map(|e| e.player.id().clone()).collect();

        let initial = snapshots.borrow().clone();
        for entry in batch {
            self.registrar.resolve(
                &entry.request_id,
                Response::ok_with(ResponseBody::PoolJoined(initial.clone())),
            );
        }

        info!(
            target: "sl.actor.lobby",
            game_id = %game_id,
            players = self.seated.len(),
            remaining_pool = self.pool.len(),
            "Pool promoted into new game"
        );

        self.active = Some(ManagedGame {
            handle,
            snapshots,
            task_handle,
            over: false,
        });

        Ok(())
    }

    /// Handle an event reported by a game actor.
    async fn handle_game_event(&mut self, event: GameEvent) {
        match event {
            GameEvent::PlayerRemoved { game_id, player_id } => {
                if self.is_active_game(game_id) {
                    self.seated.remove(&player_id);
                }
            }

            GameEvent::Ended {
                game_id,
                final_snapshot,
                stats,
            } => {
                if !self.is_active_game(game_id) {
                    // A replaced game ended after its slot was reused.
                    return;
                }
                if let Some(active) = self.active.as_mut() {
                    active.over = true;
                }
                self.seated.clear();

                if final_snapshot.story_text.is_empty() {
                    info!(
                        target: "sl.actor.lobby",
                        game_id = %game_id,
                        "Game ended with no accepted words, nothing published"
                    );
                } else {
                    let story_id = self.stories.publish(final_snapshot.story_text.clone());
                    info!(
                        target: "sl.actor.lobby",
                        game_id = %game_id,
                        story_id = %story_id,
                        "Finished story published"
                    );
                }
                debug!(
                    target: "sl.actor.lobby",
                    game_id = %game_id,
                    stats = ?stats,
                    "Final game statistics"
                );

                self.try_promote();
            }
        }
    }

    fn is_active_game(&self, game_id: GameId) -> bool {
        self.active
            .as_ref()
            .is_some_and(|g| g.handle.game_id() == game_id)
    }

    /// Drain state on the way out: cancel the game, resolve queued joins.
    fn graceful_shutdown(&mut self) {
        self.draining = true;

        if let Some(game) = self.active.take() {
            debug!(
                target: "sl.actor.lobby",
                game_id = %game.handle.game_id(),
                "Cancelling active game"
            );
            game.handle.cancel();
            self.detach_cleanup(game);
        }

        while let Some(entry) = self.pool.pop_front() {
            self.registrar.resolve(
                &entry.request_id,
                Response::code_only(ResponseCode::ShuttingDown),
            );
        }
        self.seated.clear();
    }

    /// Wait out a discarded game task without blocking the message loop.
    fn detach_cleanup(&self, game: ManagedGame) {
        let game_id = game.handle.game_id();
        tokio::spawn(async move {
            match tokio::time::timeout(std::time::Duration::from_secs(5), game.task_handle).await {
                Ok(Ok(())) => debug!(
                    target: "sl.actor.lobby",
                    game_id = %game_id,
                    "Game actor task completed cleanly"
                ),
                Ok(Err(e)) => warn!(
                    target: "sl.actor.lobby",
                    game_id = %game_id,
                    error = ?e,
                    "Game actor task failed during removal"
                ),
                Err(_) => warn!(
                    target: "sl.actor.lobby",
                    game_id = %game_id,
                    "Game actor task cleanup timed out"
                ),
            }
        });
    }
}
