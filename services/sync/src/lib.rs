//! services/sync/src/lib.rs
//!
//! The sync service: entity channels mirroring the remote collections, the
//! pending-write tracker, the composition root binding everything to the
//! authenticated session, and the assistant conversation controller, plus
//! the concrete adapters for each port.

pub mod adapters;
pub mod config;
pub mod error;
pub mod runtime;

pub use config::Config;
pub use error::SyncError;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initializes the global tracing subscriber from the configured level.
/// Call once at startup, before any channel is opened.
pub fn init_tracing(level: tracing::Level) {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
}
