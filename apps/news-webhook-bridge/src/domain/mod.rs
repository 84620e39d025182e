//! Domain Layer - Core bridge types and business logic.
//!
//! This layer contains the core domain types for news normalization
//! with no external dependencies. All types here are pure Rust with
//! serialization support.

/// Canonical news event types and normalization.
pub mod event;

/// Topic subscription tracking.
pub mod registry;
