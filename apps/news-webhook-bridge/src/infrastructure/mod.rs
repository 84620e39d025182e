//! Infrastructure Layer
//!
//! External-facing concerns: the upstream feed connection, the
//! downstream webhook sink, the operational HTTP API, configuration,
//! metrics, telemetry, and runtime statistics.

pub mod api;
pub mod config;
pub mod feed;
pub mod metrics;
pub mod sink;
pub mod stats;
pub mod telemetry;
