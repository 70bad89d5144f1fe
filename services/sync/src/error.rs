//! services/sync/src/error.rs
//!
//! Defines the primary error type for the entire sync service.

use crate::config::ConfigError;
use madrasa_console_core::ports::{AuthError, PrefsError, StoreError, ValidationError};

/// The primary error type for the `sync` service.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A channel could not establish its subscription, or a write was
    /// rejected by the remote store.
    #[error("Remote store error: {0}")]
    Store(#[from] StoreError),

    /// Surfaced directly to the login flow; the session remains signed out.
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    /// A submission was rejected before any remote call.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The local preference store failed.
    #[error("Preference store error: {0}")]
    Prefs(#[from] PrefsError),

    /// An operation that needs an authenticated session was called without one.
    #[error("No authenticated session")]
    NoSession,

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}
