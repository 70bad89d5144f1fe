//! services/sync/src/adapters/memory_store.rs
//!
//! This module contains the in-process document store, the concrete
//! implementation of the `RemoteStore` port from the `core` crate. It assigns
//! server ids and timestamps on append and fans out full snapshots to every
//! subscriber of the touched collection. This is the no-remote variant of the
//! console; it also backs the integration tests.

use async_trait::async_trait;
use chrono::Utc;
use madrasa_console_core::domain::{Collection, Direction, EntityRecord, OrderSpec};
use madrasa_console_core::ports::{AppendAck, RemoteStore, Snapshot, SnapshotStream, StoreError};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::mpsc;
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A process-local store that implements the `RemoteStore` port.
#[derive(Default)]
pub struct InMemoryStore {
    inner: Mutex<StoreState>,
}

#[derive(Default)]
struct StoreState {
    records: HashMap<Collection, Vec<EntityRecord>>,
    subscribers: Vec<Subscriber>,
}

struct Subscriber {
    collection: Collection,
    order: Option<OrderSpec>,
    tx: mpsc::UnboundedSender<Snapshot>,
}

impl InMemoryStore {
    /// Creates a new, empty `InMemoryStore`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes one record by id and notifies the collection's subscribers.
    /// Returns whether a record was actually removed.
    pub fn delete(&self, collection: Collection, id: &str) -> bool {
        let mut state = self.inner.lock().expect("store lock poisoned");
        let records = state.records.entry(collection).or_default();
        let before = records.len();
        records.retain(|r| r.id() != Some(id));
        let removed = records.len() != before;
        if removed {
            broadcast(&mut state, collection);
        }
        removed
    }
}

/// Orders a snapshot the way the subscription asked for. Records with the
/// sort field unset sort after keyed records.
fn apply_order(mut records: Vec<EntityRecord>, order: Option<&OrderSpec>) -> Vec<EntityRecord> {
    if let Some(spec) = order {
        records.sort_by(|a, b| {
            let cmp = match (a.sort_value(&spec.field), b.sort_value(&spec.field)) {
                (Some(ka), Some(kb)) => ka.cmp(&kb),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            };
            match spec.direction {
                Direction::Ascending => cmp,
                Direction::Descending => cmp.reverse(),
            }
        });
    }
    records
}

/// Sends the current full snapshot to every live subscriber of `collection`,
/// dropping subscribers whose stream has been released.
fn broadcast(state: &mut StoreState, collection: Collection) {
    let records = state.records.get(&collection).cloned().unwrap_or_default();
    state.subscribers.retain(|sub| {
        if sub.collection != collection {
            return true;
        }
        let snapshot = Snapshot {
            records: apply_order(records.clone(), sub.order.as_ref()),
        };
        sub.tx.send(snapshot).is_ok()
    });
}

//=========================================================================================
// `RemoteStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl RemoteStore for InMemoryStore {
    async fn subscribe(
        &self,
        collection: Collection,
        order: Option<OrderSpec>,
    ) -> Result<SnapshotStream, StoreError> {
        if let Some(spec) = &order {
            if !collection.sortable_fields().contains(&spec.field.as_str()) {
                return Err(StoreError::InvalidOrder {
                    collection: collection.name(),
                    field: spec.field.clone(),
                });
            }
        }

        let (tx, mut rx) = mpsc::unbounded_channel();
        {
            let mut state = self.inner.lock().expect("store lock poisoned");
            let records = state.records.get(&collection).cloned().unwrap_or_default();
            let initial = Snapshot {
                records: apply_order(records, order.as_ref()),
            };
            // The receiver is still in scope, so this send cannot fail.
            let _ = tx.send(initial);
            state.subscribers.push(Subscriber {
                collection,
                order,
                tx,
            });
        }

        let stream = async_stream::stream! {
            while let Some(snapshot) = rx.recv().await {
                yield snapshot;
            }
        };
        Ok(Box::pin(stream))
    }

    async fn append(
        &self,
        collection: Collection,
        mut record: EntityRecord,
    ) -> Result<AppendAck, StoreError> {
        let id = Uuid::new_v4().to_string();
        let server_timestamp = Utc::now();
        record.assign_server_fields(&id, server_timestamp);

        let mut state = self.inner.lock().expect("store lock poisoned");
        state.records.entry(collection).or_default().push(record);
        broadcast(&mut state, collection);

        Ok(AppendAck {
            id,
            server_timestamp,
        })
    }
}

//=========================================================================================
// Tests
//=========================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use futures::StreamExt;
    use madrasa_console_core::domain::{Notice, NoticeAudience};

    fn notice(title: &str, date: &str) -> EntityRecord {
        EntityRecord::Notice(Notice {
            id: None,
            title: title.to_string(),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").ok(),
            content: "<div>body</div>".to_string(),
            audience: NoticeAudience::All,
        })
    }

    #[tokio::test]
    async fn subscribe_rejects_unknown_sort_field() {
        let store = InMemoryStore::new();
        let result = store
            .subscribe(Collection::Notices, Some(OrderSpec::descending("title")))
            .await;
        assert!(matches!(
            result,
            Err(StoreError::InvalidOrder { collection: "notices", .. })
        ));
    }

    #[tokio::test]
    async fn snapshots_follow_requested_descending_order() {
        let store = InMemoryStore::new();
        store
            .append(Collection::Notices, notice("Old", "2024-01-10"))
            .await
            .unwrap();
        store
            .append(Collection::Notices, notice("New", "2024-04-01"))
            .await
            .unwrap();

        let mut stream = store
            .subscribe(Collection::Notices, Some(OrderSpec::descending("date")))
            .await
            .unwrap();
        let snapshot = stream.next().await.unwrap();
        let titles: Vec<_> = snapshot
            .records
            .iter()
            .map(|r| match r {
                EntityRecord::Notice(n) => n.title.clone(),
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(titles, vec!["New", "Old"]);
    }

    #[tokio::test]
    async fn append_assigns_id_and_delete_notifies_subscribers() {
        let store = InMemoryStore::new();
        let mut stream = store
            .subscribe(Collection::Notices, None)
            .await
            .unwrap();
        assert!(stream.next().await.unwrap().records.is_empty());

        let ack = store
            .append(Collection::Notices, notice("Eid Holiday", "2024-04-01"))
            .await
            .unwrap();
        let after_append = stream.next().await.unwrap();
        assert_eq!(after_append.records[0].id(), Some(ack.id.as_str()));

        assert!(store.delete(Collection::Notices, &ack.id));
        let after_delete = stream.next().await.unwrap();
        assert!(after_delete.records.is_empty());
    }
}
