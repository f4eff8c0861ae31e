//! # SC Test Utilities
//!
//! Shared test fixtures for the Story Controller service: checkers with
//! fixed behavior and canned player identities, so tests exercise the
//! engine without re-declaring the same closures everywhere.
//!
//! ## Usage
//!
//! ```rust
//! use sc_test_utils::{AcceptAll, RejectAll, player_ids};
//! use common::validity::TextChecker;
//!
//! assert!(AcceptAll.is_valid("anything at all"));
//! assert!(!RejectAll.is_valid("anything at all"));
//!
//! let [alice, bob] = player_ids(["1", "2"]);
//! assert_ne!(alice, bob);
//! ```

#![warn(clippy::pedantic)]

pub mod fixtures;

pub use fixtures::{player_ids, AcceptAll, RejectAll, RejectWord};
