//! Common types and contracts shared across Storyloom components.

#![warn(clippy::pedantic)]

/// Module for shared identifier types
pub mod types;

/// Module for injected validity checkers
pub mod validity;
