//! services/sync/src/runtime/root.rs
//!
//! This module contains the composition root: the owner of every
//! lifecycle-scoped handle in the sync layer. Screens receive read-only
//! references to channels from here; nothing is reached through ambient
//! globals, and no channel outlives the session that opened it.

use futures::StreamExt;
use madrasa_console_core::domain::{ChatMessage, Collection, EntityRecord, Session};
use madrasa_console_core::ports::{AssistantService, AuthProvider, RemoteStore};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{MappedMutexGuard, Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::error::SyncError;
use crate::runtime::assistant::AssistantController;
use crate::runtime::channel::EntityChannel;
use crate::runtime::pending::{PendingWriteHandle, PendingWriteTracker};

struct RootState {
    session: Option<Session>,
    channels: HashMap<Collection, Arc<EntityChannel>>,
}

//=========================================================================================
// CompositionRoot
//=========================================================================================

/// Binds entity-channel lifecycles to authentication state.
pub struct CompositionRoot {
    store: Arc<dyn RemoteStore>,
    auth: Arc<dyn AuthProvider>,
    assistant_service: Arc<dyn AssistantService>,
    tracker: Arc<PendingWriteTracker>,
    state: Mutex<RootState>,
    // Separate lock so screens can talk to the assistant without contending
    // with channel bookkeeping. Lock order is always state, then assistant.
    assistant: Mutex<Option<AssistantController>>,
}

impl CompositionRoot {
    pub fn new(
        store: Arc<dyn RemoteStore>,
        auth: Arc<dyn AuthProvider>,
        assistant_service: Arc<dyn AssistantService>,
    ) -> Self {
        let tracker = Arc::new(PendingWriteTracker::new(Arc::clone(&store)));
        Self {
            store,
            auth,
            assistant_service,
            tracker,
            state: Mutex::new(RootState {
                session: None,
                channels: HashMap::new(),
            }),
            assistant: Mutex::new(None),
        }
    }

    //=====================================================================================
    // Authentication Flow
    //=====================================================================================

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, SyncError> {
        let session = self.auth.sign_in(email, password).await?;
        self.handle_session_change(Some(session.clone())).await?;
        Ok(session)
    }

    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<Session, SyncError> {
        let session = self.auth.sign_up(email, password, display_name).await?;
        self.handle_session_change(Some(session.clone())).await?;
        Ok(session)
    }

    /// Signs out and tears every channel down before returning, so no remote
    /// notification can reach UI state after the logout is acknowledged.
    pub async fn sign_out(&self) -> Result<(), SyncError> {
        self.auth.sign_out().await?;
        self.handle_session_change(None).await
    }

    /// Applies one auth-state transition. Signing in opens one channel per
    /// live collection (a subscribe failure aborts the whole bring-up);
    /// signing out tears everything down. A repeated event for the subject
    /// already bound is a no-op, so driving this both from the sign-in call
    /// and from the provider's session stream is safe.
    pub async fn handle_session_change(&self, next: Option<Session>) -> Result<(), SyncError> {
        let mut state = self.state.lock().await;
        match next {
            Some(session) => {
                if state.session.as_ref().map(|s| s.subject_id) == Some(session.subject_id) {
                    return Ok(());
                }
                if state.session.is_some() {
                    // Subject switch without an explicit logout still means a
                    // fresh set of channels.
                    self.teardown_locked(&mut state).await;
                }

                let mut channels = HashMap::new();
                for collection in Collection::LIVE {
                    match EntityChannel::open(
                        self.store.as_ref(),
                        collection,
                        collection.default_order(),
                    )
                    .await
                    {
                        Ok(channel) => {
                            let channel = Arc::new(channel);
                            let tracker = Arc::clone(&self.tracker);
                            channel.observe(move |_records| tracker.snapshot_received(collection));
                            channels.insert(collection, channel);
                        }
                        Err(e) => {
                            error!(
                                collection = collection.name(),
                                error = %e,
                                "Subscription failed; session is unusable."
                            );
                            for channel in channels.values() {
                                channel.close();
                            }
                            return Err(e.into());
                        }
                    }
                }

                info!(subject = %session.subject_id, "Opened channels for session.");
                state.channels = channels;
                state.session = Some(session);
                Ok(())
            }
            None => {
                self.teardown_locked(&mut state).await;
                Ok(())
            }
        }
    }

    /// Drives session transitions from the auth provider's stream, covering
    /// rehydrated logins and out-of-band signouts. Bring-up errors are
    /// logged; the session simply stays unbound.
    pub fn run(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut sessions = self.auth.sessions();
            while let Some(next) = sessions.next().await {
                if let Err(e) = self.handle_session_change(next).await {
                    error!(error = %e, "Session transition failed.");
                }
            }
        })
    }

    async fn teardown_locked(&self, state: &mut RootState) {
        for channel in state.channels.values() {
            channel.close();
        }
        state.channels.clear();
        state.session = None;
        self.tracker.clear();
        *self.assistant.lock().await = None;
    }

    //=====================================================================================
    // Screen-facing Accessors
    //=====================================================================================

    pub async fn session(&self) -> Option<Session> {
        self.state.lock().await.session.clone()
    }

    pub async fn channel(&self, collection: Collection) -> Option<Arc<EntityChannel>> {
        self.state.lock().await.channels.get(&collection).cloned()
    }

    pub fn tracker(&self) -> &Arc<PendingWriteTracker> {
        &self.tracker
    }

    /// What the screen renders: the channel's last confirmed snapshot
    /// concatenated with still-in-flight pending writes.
    pub async fn visible_list(&self, collection: Collection) -> Result<Vec<EntityRecord>, SyncError> {
        let channel = self
            .channel(collection)
            .await
            .ok_or(SyncError::NoSession)?;
        Ok(self.tracker.overlay(collection, &channel.snapshot()))
    }

    /// Submits a new record through the pending-write tracker.
    pub async fn submit(
        &self,
        collection: Collection,
        payload: EntityRecord,
    ) -> Result<PendingWriteHandle, SyncError> {
        if self.state.lock().await.session.is_none() {
            return Err(SyncError::NoSession);
        }
        Ok(self.tracker.submit(collection, payload)?)
    }

    /// Sends a chat-room message as the signed-in user. The send time is
    /// server-assigned on confirmation.
    pub async fn send_chat_message(&self, text: &str) -> Result<PendingWriteHandle, SyncError> {
        let session = self
            .state
            .lock()
            .await
            .session
            .clone()
            .ok_or(SyncError::NoSession)?;
        let message = EntityRecord::Message(ChatMessage {
            id: None,
            sender_id: Some(session.subject_id),
            sender_name: session.display_name,
            text: text.to_string(),
            timestamp: None,
        });
        Ok(self.tracker.submit(Collection::Messages, message)?)
    }

    /// The assistant panel's controller, created lazily on first use and
    /// discarded on logout.
    pub async fn assistant(
        &self,
    ) -> Result<MappedMutexGuard<'_, AssistantController>, SyncError> {
        if self.state.lock().await.session.is_none() {
            return Err(SyncError::NoSession);
        }
        let mut guard = self.assistant.lock().await;
        if guard.is_none() {
            *guard = Some(AssistantController::new(Arc::clone(
                &self.assistant_service,
            )));
        }
        Ok(MutexGuard::map(guard, |controller| {
            controller.as_mut().expect("controller just initialized")
        }))
    }
}
