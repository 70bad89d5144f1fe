//! services/sync/src/runtime/channel.rs
//!
//! This module contains the entity channel, the local mirror of one remote
//! collection. A channel owns the subscription to its collection and replaces
//! its in-memory list wholesale on every incoming snapshot; it never patches
//! records field by field.

use futures::StreamExt;
use madrasa_console_core::domain::{Collection, EntityRecord, OrderSpec};
use madrasa_console_core::ports::{RemoteStore, Snapshot, StoreError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::debug;

type Observer = Box<dyn Fn(&[EntityRecord]) + Send + Sync>;

//=========================================================================================
// Shared Channel State
//=========================================================================================

struct ChannelShared {
    records: RwLock<Vec<EntityRecord>>,
    observers: RwLock<Vec<Observer>>,
    watch_tx: watch::Sender<Vec<EntityRecord>>,
    revision: AtomicU64,
}

impl ChannelShared {
    /// Applies one snapshot: wholesale replacement, then synchronous observer
    /// notification. Snapshots for a subscription that was closed before they
    /// arrived are discarded without notifying anyone.
    fn apply(&self, cancel: &CancellationToken, collection: Collection, snapshot: Snapshot) {
        if cancel.is_cancelled() {
            debug!(collection = collection.name(), "Discarding late snapshot after close.");
            return;
        }

        {
            let mut records = self.records.write().expect("channel lock poisoned");
            *records = snapshot.records.clone();
        }
        self.revision.fetch_add(1, Ordering::Relaxed);
        self.watch_tx.send_replace(snapshot.records.clone());

        let observers = self.observers.read().expect("channel lock poisoned");
        for observer in observers.iter() {
            observer(&snapshot.records);
        }
    }
}

//=========================================================================================
// EntityChannel
//=========================================================================================

/// The authoritative local view of one remote collection.
pub struct EntityChannel {
    collection: Collection,
    shared: Arc<ChannelShared>,
    cancel: CancellationToken,
}

impl EntityChannel {
    /// Establishes the subscription and spawns the task that consumes its
    /// snapshot stream. Order validation happens inside `subscribe`, so an
    /// unsortable field fails here, before any task exists.
    pub async fn open(
        store: &dyn RemoteStore,
        collection: Collection,
        order: Option<OrderSpec>,
    ) -> Result<Self, StoreError> {
        let mut stream = store.subscribe(collection, order).await?;

        let (watch_tx, _) = watch::channel(Vec::new());
        let shared = Arc::new(ChannelShared {
            records: RwLock::new(Vec::new()),
            observers: RwLock::new(Vec::new()),
            watch_tx,
            revision: AtomicU64::new(0),
        });
        let cancel = CancellationToken::new();

        let task_shared = Arc::clone(&shared);
        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = task_cancel.cancelled() => break,
                    next = stream.next() => match next {
                        Some(snapshot) => task_shared.apply(&task_cancel, collection, snapshot),
                        // The store ended the subscription; the channel keeps
                        // its last confirmed list.
                        None => break,
                    },
                }
            }
            debug!(collection = collection.name(), "Entity channel task finished.");
        });

        Ok(Self {
            collection,
            shared,
            cancel,
        })
    }

    pub fn collection(&self) -> Collection {
        self.collection
    }

    /// The last confirmed snapshot's records.
    pub fn snapshot(&self) -> Vec<EntityRecord> {
        self.shared
            .records
            .read()
            .expect("channel lock poisoned")
            .clone()
    }

    /// How many snapshots this channel has applied.
    pub fn revision(&self) -> u64 {
        self.shared.revision.load(Ordering::Relaxed)
    }

    /// Registers an observer invoked synchronously on every applied snapshot.
    pub fn observe(&self, observer: impl Fn(&[EntityRecord]) + Send + Sync + 'static) {
        self.shared
            .observers
            .write()
            .expect("channel lock poisoned")
            .push(Box::new(observer));
    }

    /// A pull-style view of the current list for consumers that would rather
    /// await changes than register a callback.
    pub fn watch(&self) -> watch::Receiver<Vec<EntityRecord>> {
        self.shared.watch_tx.subscribe()
    }

    /// Releases the subscription. Idempotent: closing an already-closed
    /// channel is a no-op. No observer fires after this returns; snapshots
    /// already in flight are silently discarded.
    pub fn close(&self) {
        self.cancel.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Drop for EntityChannel {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
