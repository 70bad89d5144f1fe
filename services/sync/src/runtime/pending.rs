//! services/sync/src/runtime/pending.rs
//!
//! This module contains the pending-write tracker. It lets the UI show a
//! just-submitted record before the backend confirms it, without corrupting
//! the authoritative list once the entity channel's next snapshot supersedes
//! the overlay.

use madrasa_console_core::domain::{Collection, EntityRecord, WriteStatus};
use madrasa_console_core::ports::{RemoteStore, ValidationError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::{debug, warn};

//=========================================================================================
// Handle & Entry Types
//=========================================================================================

/// The caller's view of one submitted write. Status starts `InFlight` and
/// settles exactly once, to `Failed` or `Confirmed`.
#[derive(Debug)]
pub struct PendingWriteHandle {
    ticket: u64,
    collection: Collection,
    status_rx: watch::Receiver<WriteStatus>,
}

impl PendingWriteHandle {
    pub fn ticket(&self) -> u64 {
        self.ticket
    }

    pub fn collection(&self) -> Collection {
        self.collection
    }

    pub fn status(&self) -> WriteStatus {
        *self.status_rx.borrow()
    }

    /// Waits for the terminal status. The contract is purely asynchronous:
    /// the submitting interaction never blocks on this.
    pub async fn settled(&mut self) -> WriteStatus {
        loop {
            let status = *self.status_rx.borrow_and_update();
            if status != WriteStatus::InFlight {
                return status;
            }
            if self.status_rx.changed().await.is_err() {
                return *self.status_rx.borrow();
            }
        }
    }
}

struct PendingEntry {
    ticket: u64,
    collection: Collection,
    payload: EntityRecord,
    status_tx: watch::Sender<WriteStatus>,
}

impl PendingEntry {
    /// Moves the entry out of `InFlight`. A status never changes twice.
    fn settle(&self, status: WriteStatus) {
        self.status_tx.send_if_modified(|current| {
            if *current == WriteStatus::InFlight {
                *current = status;
                true
            } else {
                false
            }
        });
    }
}

type EntryList = Arc<Mutex<Vec<PendingEntry>>>;

fn fail_entry(entries: &Mutex<Vec<PendingEntry>>, ticket: u64) {
    let mut entries = entries.lock().expect("tracker lock poisoned");
    if let Some(index) = entries.iter().position(|e| e.ticket == ticket) {
        let entry = entries.remove(index);
        entry.settle(WriteStatus::Failed);
    }
}

//=========================================================================================
// PendingWriteTracker
//=========================================================================================

/// Tracks locally submitted records until a snapshot supersedes them or the
/// remote store rejects them.
pub struct PendingWriteTracker {
    store: Arc<dyn RemoteStore>,
    entries: EntryList,
    next_ticket: AtomicU64,
}

impl PendingWriteTracker {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self {
            store,
            entries: Arc::new(Mutex::new(Vec::new())),
            next_ticket: AtomicU64::new(0),
        }
    }

    /// Validates the payload against the collection's mandatory fields, then
    /// fires the append without waiting for it. On validation failure the
    /// remote store sees no call at all.
    pub fn submit(
        &self,
        collection: Collection,
        payload: EntityRecord,
    ) -> Result<PendingWriteHandle, ValidationError> {
        let missing = payload.missing_required_for(collection);
        if !missing.is_empty() {
            return Err(ValidationError { missing });
        }

        let ticket = self.next_ticket.fetch_add(1, Ordering::SeqCst);
        let (status_tx, status_rx) = watch::channel(WriteStatus::InFlight);
        {
            let mut entries = self.entries.lock().expect("tracker lock poisoned");
            entries.push(PendingEntry {
                ticket,
                collection,
                payload: payload.clone(),
                status_tx,
            });
        }

        let store = Arc::clone(&self.store);
        let entries = Arc::clone(&self.entries);
        tokio::spawn(async move {
            match store.append(collection, payload).await {
                Ok(ack) => {
                    // Confirmation comes from the snapshot that includes the
                    // record, not from the append acknowledgement.
                    debug!(
                        collection = collection.name(),
                        id = %ack.id,
                        "Append acknowledged by remote store."
                    );
                }
                Err(e) => {
                    warn!(collection = collection.name(), error = %e, "Append rejected.");
                    fail_entry(&entries, ticket);
                }
            }
        });

        Ok(PendingWriteHandle {
            ticket,
            collection,
            status_rx,
        })
    }

    /// The caller-visible list: the channel's last snapshot concatenated with
    /// still-in-flight writes in submission order, never the reverse.
    pub fn overlay(&self, collection: Collection, snapshot: &[EntityRecord]) -> Vec<EntityRecord> {
        let mut visible = snapshot.to_vec();
        let entries = self.entries.lock().expect("tracker lock poisoned");
        visible.extend(
            entries
                .iter()
                .filter(|e| e.collection == collection)
                .map(|e| e.payload.clone()),
        );
        visible
    }

    /// Called when the entity channel applies a snapshot for `collection`.
    /// Every write submitted strictly before this receipt is retired from
    /// the overlay, whether or not it is visibly present in the snapshot:
    /// the snapshot is authoritative.
    pub fn snapshot_received(&self, collection: Collection) {
        let mut entries = self.entries.lock().expect("tracker lock poisoned");
        entries.retain(|entry| {
            if entry.collection != collection {
                return true;
            }
            entry.settle(WriteStatus::Confirmed);
            false
        });
    }

    /// Number of writes still overlaid for one collection.
    pub fn in_flight(&self, collection: Collection) -> usize {
        self.entries
            .lock()
            .expect("tracker lock poisoned")
            .iter()
            .filter(|e| e.collection == collection)
            .count()
    }

    /// Drops every tracked write. Used on logout; nothing crosses sessions.
    pub fn clear(&self) {
        self.entries
            .lock()
            .expect("tracker lock poisoned")
            .clear();
    }
}
