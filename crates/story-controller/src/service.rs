//! `GameService` - the inbound operation surface.
//!
//! Every operation takes a caller-chosen request id plus domain parameters
//! and yields exactly one [`Response`]. All operations pass through the
//! request registrar: synchronous ones resolve their own slot before
//! awaiting it, while a pool join is resolved later by promotion,
//! cancellation, or shutdown. This keeps shutdown semantics uniform - the
//! registrar can always drain every pending request with `SHUTTING_DOWN`.

use std::sync::Arc;

use common::types::{PlayerId, RequestId, StoryId};
use common::validity::{
    BasicCommentChecker, BasicDisplayNameChecker, BasicTitleChecker, BasicWordChecker, TextChecker,
};
use tracing::{info, warn};

use crate::actors::lobby::{LobbyActorHandle, LobbyDeps};
use crate::actors::messages::GameSnapshot;
use crate::config::Config;
use crate::errors::{EngineError, ResponseCode};
use crate::player::PlayerFactory;
use crate::registrar::{RequestRegistrar, RequestTicket};
use crate::response::{CommentView, Response, ResponseBody, StoryView, TitleView};
use crate::stats::{standard_metrics, GameStats, MetricsFactory};
use crate::storage::{CommentsRepo, StoryRepo, TitlesRepo};

/// Collaborators injected into the engine at construction.
pub struct EngineDeps {
    pub word_checker: Arc<dyn TextChecker>,
    pub display_name_checker: Arc<dyn TextChecker>,
    pub title_checker: Arc<dyn TextChecker>,
    pub comment_checker: Arc<dyn TextChecker>,
    pub metrics_factory: MetricsFactory,
}

impl EngineDeps {
    /// The standard checker and statistics wiring.
    #[must_use]
    pub fn standard(config: &Config) -> Self {
        Self {
            word_checker: Arc::new(BasicWordChecker),
            display_name_checker: Arc::new(BasicDisplayNameChecker::new(
                config.display_name_min_len,
            )),
            title_checker: Arc::new(BasicTitleChecker::default()),
            comment_checker: Arc::new(BasicCommentChecker::default()),
            metrics_factory: Arc::new(standard_metrics),
        }
    }
}

/// The engine's public service facade.
///
/// Cheap to clone; all state lives behind the actors, the registrar, and
/// the repositories.
#[derive(Clone)]
pub struct GameService {
    lobby: LobbyActorHandle,
    registrar: Arc<RequestRegistrar>,
    stories: Arc<StoryRepo>,
    titles: Arc<TitlesRepo>,
    comments: Arc<CommentsRepo>,
    player_factory: PlayerFactory,
    title_checker: Arc<dyn TextChecker>,
    comment_checker: Arc<dyn TextChecker>,
    guest_name_checker: Arc<dyn TextChecker>,
}

impl GameService {
    /// Construct the engine: repositories, registrar, and the lobby actor.
    #[must_use]
    pub fn new(config: Config, deps: EngineDeps) -> Self {
        let registrar = Arc::new(RequestRegistrar::new());
        let stories = Arc::new(StoryRepo::new());
        let titles = Arc::new(TitlesRepo::new());
        let comments = Arc::new(CommentsRepo::new());

        let lobby = LobbyActorHandle::new(
            config,
            LobbyDeps {
                word_checker: Arc::clone(&deps.word_checker),
                metrics_factory: Arc::clone(&deps.metrics_factory),
                stories: Arc::clone(&stories),
                registrar: Arc::clone(&registrar),
            },
        );

        Self {
            lobby,
            registrar,
            stories,
            titles,
            comments,
            player_factory: PlayerFactory::new(Arc::clone(&deps.display_name_checker)),
            title_checker: deps.title_checker,
            comment_checker: deps.comment_checker,
            guest_name_checker: deps.display_name_checker,
        }
    }

    /// Queue a player into the matchmaking pool. Resolves when the player
    /// is promoted into a game, cancels, or the engine shuts down.
    pub async fn join_pool(
        &self,
        request_id: RequestId,
        player_id: PlayerId,
        display_name: &str,
    ) -> Response {
        let ticket = match self.register(&request_id) {
            Ok(ticket) => ticket,
            Err(response) => return response,
        };

        let player = match self.player_factory.create(player_id, display_name) {
            Ok(player) => player,
            Err(e) => return self.finish(&request_id, ticket, Response::from_error(&e)).await,
        };

        if let Err(e) = self.lobby.join_pool(player, request_id.clone()).await {
            if e.is_contract_violation() {
                warn!(
                    target: "sl.service",
                    request_id = %request_id,
                    error = %e,
                    "Join rejected"
                );
            }
            return self.finish(&request_id, ticket, Response::from_error(&e)).await;
        }

        // Resolution arrives from the lobby: promotion, cancellation, or
        // shutdown.
        ticket.wait().await
    }

    /// Disconnect a player from wherever they are. Idempotent.
    pub async fn disconnect(&self, request_id: RequestId, player_id: PlayerId) -> Response {
        let ticket = match self.register(&request_id) {
            Ok(ticket) => ticket,
            Err(response) => return response,
        };

        let response = match self.lobby.disconnect(player_id).await {
            Ok(()) => Response::ok(),
            Err(e) => Response::from_error(&e),
        };
        self.finish(&request_id, ticket, response).await
    }

    /// Submit a word to the active game on behalf of a player.
    pub async fn submit_word(
        &self,
        request_id: RequestId,
        player_id: PlayerId,
        word: &str,
    ) -> Response {
        let ticket = match self.register(&request_id) {
            Ok(ticket) => ticket,
            Err(response) => return response,
        };

        let response = match self.lobby.active_game().await {
            Err(e) => Response::from_error(&e),
            Ok(None) => Response::code_only(ResponseCode::NoActiveGame),
            Ok(Some(game)) => {
                // Submissions go to the game directly; its mailbox is the
                // per-game exclusion domain.
                match game.handle.submit_word(player_id, word.to_string()).await {
                    Ok(snapshot) => Response::ok_with(ResponseBody::Turn(snapshot)),
                    Err(e) => Response::from_error(&e),
                }
            }
        };
        self.finish(&request_id, ticket, response).await
    }

    /// Suggest a title for a published story.
    pub async fn suggest_title(
        &self,
        request_id: RequestId,
        story_id: StoryId,
        title: &str,
    ) -> Response {
        let ticket = match self.register(&request_id) {
            Ok(ticket) => ticket,
            Err(response) => return response,
        };

        let response = if !self.stories.exists(story_id) {
            Response::from_error(&EngineError::StoryNotFound(story_id))
        } else if !self.title_checker.is_valid(title) {
            Response::from_error(&EngineError::InvalidInput("suggested title"))
        } else {
            self.titles.suggest(story_id, title.trim());
            Response::ok()
        };
        self.finish(&request_id, ticket, response).await
    }

    /// Upvote an existing suggested title.
    pub async fn upvote_title(
        &self,
        request_id: RequestId,
        story_id: StoryId,
        title: &str,
    ) -> Response {
        let ticket = match self.register(&request_id) {
            Ok(ticket) => ticket,
            Err(response) => return response,
        };

        let response = if self.stories.exists(story_id) {
            match self.titles.upvote(story_id, title) {
                Ok(_) => Response::ok(),
                Err(e) => Response::from_error(&e),
            }
        } else {
            Response::from_error(&EngineError::StoryNotFound(story_id))
        };
        self.finish(&request_id, ticket, response).await
    }

    /// Like a published story.
    pub async fn like_story(&self, request_id: RequestId, story_id: StoryId) -> Response {
        let ticket = match self.register(&request_id) {
            Ok(ticket) => ticket,
            Err(response) => return response,
        };

        let response = match self.stories.like(story_id) {
            Ok(_) => Response::ok(),
            Err(e) => Response::from_error(&e),
        };
        self.finish(&request_id, ticket, response).await
    }

    /// Comment on a published story as a guest.
    pub async fn comment_as_guest(
        &self,
        request_id: RequestId,
        story_id: StoryId,
        guest_name: &str,
        text: &str,
    ) -> Response {
        let ticket = match self.register(&request_id) {
            Ok(ticket) => ticket,
            Err(response) => return response,
        };

        let response = if !self.stories.exists(story_id) {
            Response::from_error(&EngineError::StoryNotFound(story_id))
        } else if !self.guest_name_checker.is_valid(guest_name) {
            Response::from_error(&EngineError::InvalidInput("guest name"))
        } else if !self.comment_checker.is_valid(text) {
            Response::from_error(&EngineError::InvalidInput("comment"))
        } else {
            self.comments.add(story_id, guest_name, text);
            Response::ok()
        };
        self.finish(&request_id, ticket, response).await
    }

    /// The most recently published stories, newest first.
    pub async fn latest_stories(&self, request_id: RequestId, count: usize) -> Response {
        let ticket = match self.register(&request_id) {
            Ok(ticket) => ticket,
            Err(response) => return response,
        };

        let stories = self.stories.latest(count);
        let response = Response::ok_with(ResponseBody::Stories(Self::story_views(stories)));
        self.finish(&request_id, ticket, response).await
    }

    /// The most liked stories, most likes first.
    pub async fn most_liked_stories(&self, request_id: RequestId, count: usize) -> Response {
        let ticket = match self.register(&request_id) {
            Ok(ticket) => ticket,
            Err(response) => return response,
        };

        let stories = self.stories.most_liked(count);
        let response = Response::ok_with(ResponseBody::Stories(Self::story_views(stories)));
        self.finish(&request_id, ticket, response).await
    }

    /// All guest comments for a story, oldest first.
    pub async fn story_comments(&self, request_id: RequestId, story_id: StoryId) -> Response {
        let ticket = match self.register(&request_id) {
            Ok(ticket) => ticket,
            Err(response) => return response,
        };

        let response = if self.stories.exists(story_id) {
            let comments = self
                .comments
                .for_story(story_id)
                .into_iter()
                .map(|c| CommentView {
                    id: c.id,
                    guest_name: c.guest_name,
                    text: c.text,
                    posted_at: c.posted_at,
                })
                .collect();
            Response::ok_with(ResponseBody::Comments(comments))
        } else {
            Response::from_error(&EngineError::StoryNotFound(story_id))
        };
        self.finish(&request_id, ticket, response).await
    }

    /// All suggested titles for a story.
    pub async fn all_titles(&self, request_id: RequestId, story_id: StoryId) -> Response {
        let ticket = match self.register(&request_id) {
            Ok(ticket) => ticket,
            Err(response) => return response,
        };

        let response = if self.stories.exists(story_id) {
            let titles = self
                .titles
                .all(story_id)
                .into_iter()
                .map(|t| TitleView {
                    text: t.text,
                    upvotes: t.upvotes,
                })
                .collect();
            Response::ok_with(ResponseBody::Titles(titles))
        } else {
            Response::from_error(&EngineError::StoryNotFound(story_id))
        };
        self.finish(&request_id, ticket, response).await
    }

    /// Cooperative shutdown: the requesting caller gets `OK`; every other
    /// pending request resolves with `SHUTTING_DOWN`, and all future
    /// operations are rejected with the same signal.
    pub async fn shutdown(&self, request_id: RequestId) -> Response {
        let ticket = match self.register(&request_id) {
            Ok(ticket) => ticket,
            Err(response) => return response,
        };

        info!(target: "sl.service", request_id = %request_id, "Shutdown requested");

        self.registrar.resolve(&request_id, Response::ok());
        let _ = self.lobby.shutdown().await;
        self.registrar.shutdown();

        ticket.wait().await
    }

    /// Latest snapshot of the active game, if one exists.
    pub async fn game_snapshot(&self) -> Option<GameSnapshot> {
        match self.lobby.active_game().await {
            Ok(Some(game)) => Some(game.snapshots.borrow().clone()),
            _ => None,
        }
    }

    /// Per-player statistics of the active game, if one exists.
    pub async fn game_stats(&self) -> Option<GameStats> {
        match self.lobby.active_game().await {
            Ok(Some(game)) => game.handle.stats().await.ok(),
            _ => None,
        }
    }

    /// The published-story repository (for the presentation layer).
    #[must_use]
    pub fn stories(&self) -> &Arc<StoryRepo> {
        &self.stories
    }

    /// The suggested-title repository (for the presentation layer).
    #[must_use]
    pub fn titles(&self) -> &Arc<TitlesRepo> {
        &self.titles
    }

    fn story_views(records: Vec<crate::storage::StoryRecord>) -> Vec<StoryView> {
        records
            .into_iter()
            .map(|s| StoryView {
                id: s.id,
                text: s.text,
                published_at: s.published_at,
                likes: s.likes,
            })
            .collect()
    }

    /// Register a request id, turning registrar failures into an immediate
    /// response for the caller.
    fn register(&self, request_id: &RequestId) -> Result<RequestTicket, Response> {
        self.registrar.register(request_id).map_err(|e| {
            if e.is_contract_violation() {
                warn!(
                    target: "sl.service",
                    request_id = %request_id,
                    error = %e,
                    "Request rejected by registrar"
                );
            }
            Response::from_error(&e)
        })
    }

    /// Resolve a synchronous operation's own slot and await the ticket, so
    /// a shutdown that raced the operation wins consistently.
    async fn finish(
        &self,
        request_id: &RequestId,
        ticket: RequestTicket,
        response: Response,
    ) -> Response {
        self.registrar.resolve(request_id, response);
        ticket.wait().await
    }
}
