//! Shared test doubles for the sync integration tests: a scriptable remote
//! store whose snapshot delivery the test controls, and a scriptable
//! assistant service.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use madrasa_console_core::domain::{
    ChatMessage, Collection, EntityRecord, Notice, NoticeAudience, OrderSpec, Student,
};
use madrasa_console_core::ports::{
    AppendAck, AssistantService, Conversation, RemoteStore, ServiceError, Snapshot,
    SnapshotStream, StoreError,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

//=========================================================================================
// Record Builders
//=========================================================================================

pub fn student(name: &str, reg_no: &str) -> EntityRecord {
    EntityRecord::Student(Student {
        id: None,
        reg_no: reg_no.to_string(),
        name: name.to_string(),
        father_name: String::new(),
        class_name: "Hifz".to_string(),
        roll: String::new(),
        phone: String::new(),
        address: String::new(),
        admission_date: None,
    })
}

pub fn notice(title: &str, date: &str) -> EntityRecord {
    EntityRecord::Notice(Notice {
        id: Some(format!("notice-{title}")),
        title: title.to_string(),
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").ok(),
        content: "<div>body</div>".to_string(),
        audience: NoticeAudience::All,
    })
}

pub fn chat_message(sender_name: &str, text: &str) -> EntityRecord {
    EntityRecord::Message(ChatMessage {
        id: None,
        sender_id: None,
        sender_name: sender_name.to_string(),
        text: text.to_string(),
        timestamp: None,
    })
}

/// Lets spawned tasks and channel loops drain before asserting.
pub async fn settle() {
    tokio::time::sleep(std::time::Duration::from_millis(25)).await;
}

//=========================================================================================
// ScriptedStore
//=========================================================================================

/// A `RemoteStore` double: the test decides when snapshots arrive and
/// whether appends or subscriptions succeed.
#[derive(Clone, Default)]
pub struct ScriptedStore {
    inner: Arc<ScriptedStoreInner>,
}

#[derive(Default)]
struct ScriptedStoreInner {
    subscribers: Mutex<Vec<(Collection, mpsc::UnboundedSender<Snapshot>)>>,
    appends: Mutex<Vec<(Collection, EntityRecord)>>,
    reject_appends: AtomicBool,
    reject_subscribe: Mutex<Option<Collection>>,
}

impl ScriptedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers a full snapshot to every subscriber of `collection`.
    pub fn push_snapshot(&self, collection: Collection, records: Vec<EntityRecord>) {
        let mut subscribers = self.inner.subscribers.lock().unwrap();
        subscribers.retain(|(c, tx)| {
            if *c != collection {
                return true;
            }
            tx.send(Snapshot {
                records: records.clone(),
            })
            .is_ok()
        });
    }

    pub fn appends(&self) -> Vec<(Collection, EntityRecord)> {
        self.inner.appends.lock().unwrap().clone()
    }

    pub fn append_count(&self) -> usize {
        self.inner.appends.lock().unwrap().len()
    }

    pub fn set_reject_appends(&self, reject: bool) {
        self.inner.reject_appends.store(reject, Ordering::SeqCst);
    }

    pub fn reject_subscribe_for(&self, collection: Collection) {
        *self.inner.reject_subscribe.lock().unwrap() = Some(collection);
    }
}

#[async_trait]
impl RemoteStore for ScriptedStore {
    async fn subscribe(
        &self,
        collection: Collection,
        order: Option<OrderSpec>,
    ) -> Result<SnapshotStream, StoreError> {
        if *self.inner.reject_subscribe.lock().unwrap() == Some(collection) {
            return Err(StoreError::Unavailable("scripted outage".to_string()));
        }
        if let Some(spec) = &order {
            if !collection.sortable_fields().contains(&spec.field.as_str()) {
                return Err(StoreError::InvalidOrder {
                    collection: collection.name(),
                    field: spec.field.clone(),
                });
            }
        }

        let (tx, mut rx) = mpsc::unbounded_channel();
        self.inner
            .subscribers
            .lock()
            .unwrap()
            .push((collection, tx));

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
        record: EntityRecord,
    ) -> Result<AppendAck, StoreError> {
        if self.inner.reject_appends.load(Ordering::SeqCst) {
            return Err(StoreError::Write("scripted rejection".to_string()));
        }
        self.inner
            .appends
            .lock()
            .unwrap()
            .push((collection, record));
        Ok(AppendAck {
            id: format!("scripted-{}", self.append_count()),
            server_timestamp: chrono::Utc::now(),
        })
    }
}

//=========================================================================================
// ScriptedAssistant
//=========================================================================================

/// An `AssistantService` double with a queue of scripted outcomes shared by
/// conversation sends and one-shot generation. An empty queue echoes the
/// prompt back.
#[derive(Clone, Default)]
pub struct ScriptedAssistant {
    inner: Arc<ScriptedAssistantInner>,
}

#[derive(Default)]
struct ScriptedAssistantInner {
    replies: Mutex<VecDeque<Result<String, String>>>,
    fail_start: AtomicBool,
    start_calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedAssistant {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_reply(&self, text: &str) {
        self.inner
            .replies
            .lock()
            .unwrap()
            .push_back(Ok(text.to_string()));
    }

    pub fn queue_failure(&self, message: &str) {
        self.inner
            .replies
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
    }

    pub fn set_fail_start(&self, fail: bool) {
        self.inner.fail_start.store(fail, Ordering::SeqCst);
    }

    pub fn start_calls(&self) -> usize {
        self.inner.start_calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.inner.prompts.lock().unwrap().clone()
    }

    fn answer(&self, prompt: &str) -> Result<String, ServiceError> {
        self.inner.prompts.lock().unwrap().push(prompt.to_string());
        match self.inner.replies.lock().unwrap().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(ServiceError(message)),
            None => Ok(format!("echo: {prompt}")),
        }
    }
}

struct ScriptedConversation {
    service: ScriptedAssistant,
}

#[async_trait]
impl Conversation for ScriptedConversation {
    async fn send(&mut self, text: &str) -> Result<String, ServiceError> {
        self.service.answer(text)
    }
}

#[async_trait]
impl AssistantService for ScriptedAssistant {
    async fn start_conversation(
        &self,
        _system_prompt: &str,
    ) -> Result<Box<dyn Conversation>, ServiceError> {
        self.inner.start_calls.fetch_add(1, Ordering::SeqCst);
        if self.inner.fail_start.load(Ordering::SeqCst) {
            return Err(ServiceError("scripted start failure".to_string()));
        }
        Ok(Box::new(ScriptedConversation {
            service: self.clone(),
        }))
    }

    async fn generate(&self, prompt: &str) -> Result<String, ServiceError> {
        self.answer(prompt)
    }
}
