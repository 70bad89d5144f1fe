//! crates/madrasa_console_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the specific cloud backend, auth provider, and
//! text-generation vendor behind it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::Stream;
use std::pin::Pin;

use crate::domain::{Collection, EntityRecord, OrderSpec, Session};

//=========================================================================================
// Port Error Types
//=========================================================================================

/// A submission rejected before any remote call, listing the empty mandatory
/// fields. Caller-correctable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("missing required fields: {missing:?}")]
pub struct ValidationError {
    pub missing: Vec<&'static str>,
}

/// Failures reported by the remote document store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Configuration-time setup error: the requested order names a field the
    /// store cannot sort this collection by.
    #[error("collection '{collection}' has no sortable field '{field}'")]
    InvalidOrder {
        collection: &'static str,
        field: String,
    },
    /// A write was rejected (network or permission problem). Reported once
    /// per attempt; never silently retried.
    #[error("write rejected: {0}")]
    Write(String),
    /// The store could not be reached at all.
    #[error("remote store unreachable: {0}")]
    Unavailable(String),
}

/// Failures surfaced directly to the login flow; the session stays `None`.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("auth provider unreachable: {0}")]
    Network(String),
}

/// A remote text-generation call was rejected or unreachable (quota,
/// network, auth).
#[derive(Debug, thiserror::Error)]
#[error("text generation failed: {0}")]
pub struct ServiceError(pub String);

/// The local preference store could not be read or written.
#[derive(Debug, thiserror::Error)]
#[error("preference store unavailable: {0}")]
pub struct PrefsError(pub String);

//=========================================================================================
// Remote Store
//=========================================================================================

/// A full, ordered listing of a collection's records as of one subscription
/// notification. Always a wholesale replacement, never a delta.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub records: Vec<EntityRecord>,
}

/// The store's acknowledgement of an append.
#[derive(Debug, Clone, PartialEq)]
pub struct AppendAck {
    pub id: String,
    pub server_timestamp: DateTime<Utc>,
}

pub type SnapshotStream = Pin<Box<dyn Stream<Item = Snapshot> + Send>>;

/// The external document-database/real-time-subscription service.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Establishes a subscription delivering full snapshots of one
    /// collection. Order validation happens here, not per record.
    async fn subscribe(
        &self,
        collection: Collection,
        order: Option<OrderSpec>,
    ) -> Result<SnapshotStream, StoreError>;

    /// Appends one record; the store assigns the id and server timestamp.
    async fn append(
        &self,
        collection: Collection,
        record: EntityRecord,
    ) -> Result<AppendAck, StoreError>;
}

//=========================================================================================
// Auth Provider
//=========================================================================================

pub type SessionStream = Pin<Box<dyn Stream<Item = Option<Session>> + Send>>;

/// The hosted authentication service.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<Session, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Fires with `Some(session)`/`None` on every auth-state change,
    /// starting with the current (possibly rehydrated) state.
    fn sessions(&self) -> SessionStream;
}

//=========================================================================================
// Text Generation
//=========================================================================================

/// One stateful remote conversation. Implementations carry the dialogue
/// history so each `send` sees the prior turns.
#[async_trait]
pub trait Conversation: Send + Sync {
    async fn send(&mut self, text: &str) -> Result<String, ServiceError>;
}

/// The remote generative-language service.
#[async_trait]
pub trait AssistantService: Send + Sync {
    async fn start_conversation(
        &self,
        system_prompt: &str,
    ) -> Result<Box<dyn Conversation>, ServiceError>;

    /// One-shot generation for document drafting, outside any conversation.
    async fn generate(&self, prompt: &str) -> Result<String, ServiceError>;
}

//=========================================================================================
// Preference Store
//=========================================================================================

/// Simple string-keyed persisted configuration (branding and other
/// non-entity settings); not part of the sync core.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, PrefsError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), PrefsError>;
}
