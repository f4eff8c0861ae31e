//! Story Controller Service Library
//!
//! This library provides the core functionality for the Storyloom Story
//! Controller - the server-side engine for a real-time, turn-based
//! collaborative word game:
//!
//! - Matchmaking pool with atomic promotion into game instances
//! - Per-game turn state machine with timer- and submission-driven switches
//! - Request registrar bridging synchronous callers to asynchronous,
//!   timer- and event-driven results
//! - Incremental per-player statistics, consistent under player departure
//! - In-memory repositories for stories, suggested titles, and comments
//!
//! # Architecture
//!
//! The engine uses an actor model hierarchy:
//!
//! ```text
//! LobbyActor (singleton per engine)
//! ├── owns the matchmaking pool (FIFO, promotion at match size)
//! ├── owns the active-game slot
//! └── supervises the active GameActor
//!     └── GameActor (one per running game)
//!         ├── owns roster, turn pointer, countdown, story, statistics
//!         └── runs the turn scheduler inside its own message loop
//! ```
//!
//! # Key Design Decisions
//!
//! - **One exclusion domain per entity**: each actor's mailbox serializes
//!   everything that touches its state; the turn scheduler ticks inside the
//!   game's own loop, so timeouts can never race submissions
//! - **One-shot notification**: pool join requests resolve exactly once
//!   through the registrar - on promotion, cancellation, or shutdown
//! - **Cooperative shutdown**: new work is rejected with `SHUTTING_DOWN`
//!   while pending waits are drained with the same signal
//!
//! # Modules
//!
//! - [`actors`] - Actor model implementation (lobby + game)
//! - [`config`] - Service configuration from environment
//! - [`errors`] - Error types with response-code mapping
//! - [`registrar`] - Request id to single-resolution slot mapping
//! - [`response`] - Outbound response DTOs
//! - [`service`] - The inbound operation surface
//! - [`stats`] - Pluggable per-player turn statistics
//! - [`storage`] - In-memory story/title/comment repositories

pub mod actors;
pub mod config;
pub mod errors;
pub mod player;
pub mod registrar;
pub mod response;
pub mod service;
pub mod stats;
pub mod storage;
pub mod story;
