//! crates/madrasa_console_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These types are independent of any remote backend; serde derives exist
//! because the remote store is a schema-light document service.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

//=========================================================================================
// Session & Assistant Types
//=========================================================================================

/// The authenticated context binding a subject to a set of open channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub subject_id: Uuid,
    pub display_name: String,
    pub email: String,
}

/// Who produced a turn in the assistant conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnRole {
    User,
    Assistant,
}

/// One message in the AI conversation, held only in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantTurn {
    pub role: TurnRole,
    pub text: String,
    pub sequence: u64,
}

/// Output language for AI-drafted documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    English,
    Bengali,
}

impl Language {
    pub fn label(self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Bengali => "Bengali",
        }
    }
}

//=========================================================================================
// Collections
//=========================================================================================

/// The remote-backed collections the console keeps live mirrors of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Students,
    Fees,
    Incomes,
    Expenses,
    Notices,
    Messages,
    Visitors,
    Staff,
}

impl Collection {
    /// Every collection the composition root must open a channel for.
    pub const LIVE: [Collection; 8] = [
        Collection::Students,
        Collection::Fees,
        Collection::Incomes,
        Collection::Expenses,
        Collection::Notices,
        Collection::Messages,
        Collection::Visitors,
        Collection::Staff,
    ];

    /// The collection's name in the remote store.
    pub fn name(self) -> &'static str {
        match self {
            Collection::Students => "students",
            Collection::Fees => "fees",
            Collection::Incomes => "incomes",
            Collection::Expenses => "expenses",
            Collection::Notices => "notices",
            Collection::Messages => "messages",
            Collection::Visitors => "visitors",
            Collection::Staff => "staff",
        }
    }

    /// Fields a submission screen marks mandatory for this collection.
    pub fn required_fields(self) -> &'static [&'static str] {
        match self {
            Collection::Students => &["name", "regNo"],
            Collection::Fees => &["regNo", "amount"],
            Collection::Incomes | Collection::Expenses => &["title", "amount"],
            Collection::Notices => &["title", "content"],
            Collection::Messages => &["text"],
            Collection::Visitors => &["name", "purpose"],
            Collection::Staff => &["name", "designation"],
        }
    }

    /// Fields the remote store can order this collection by.
    pub fn sortable_fields(self) -> &'static [&'static str] {
        match self {
            Collection::Students => &["name", "regNo", "admissionDate"],
            Collection::Fees => &["date", "invoiceNo"],
            Collection::Incomes | Collection::Expenses => &["date"],
            Collection::Notices => &["date"],
            Collection::Messages => &["timestamp"],
            Collection::Visitors => &["date"],
            Collection::Staff => &["name", "joiningDate"],
        }
    }

    /// The ordering each screen subscribes with: chat ascending by send time,
    /// financial and notice feeds newest-first, reference lists unordered.
    pub fn default_order(self) -> Option<OrderSpec> {
        match self {
            Collection::Messages => Some(OrderSpec::ascending("timestamp")),
            Collection::Incomes | Collection::Expenses | Collection::Notices => {
                Some(OrderSpec::descending("date"))
            }
            _ => None,
        }
    }
}

/// Sort direction for a subscription's ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Names a sortable field and a direction for one subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSpec {
    pub field: String,
    pub direction: Direction,
}

impl OrderSpec {
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Ascending,
        }
    }

    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Descending,
        }
    }
}

/// A comparable key extracted from a record for one sortable field.
/// Within one collection a field always yields the same variant.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortValue {
    Day(NaiveDate),
    Stamp(DateTime<Utc>),
    Text(String),
}

//=========================================================================================
// Entity Records
//=========================================================================================

/// Status of a fee payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeeStatus {
    Paid,
    Due,
}

/// Whether a ledger transaction is money in or money out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionKind {
    Income,
    Expense,
}

/// Who a notice is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoticeAudience {
    All,
    Student,
    Staff,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: Option<String>,
    pub reg_no: String,
    pub name: String,
    pub father_name: String,
    #[serde(rename = "class")]
    pub class_name: String,
    pub roll: String,
    pub phone: String,
    pub address: String,
    pub admission_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeRecord {
    pub id: Option<String>,
    pub student_name: String,
    pub reg_no: String,
    pub amount: f64,
    #[serde(rename = "type")]
    pub fee_type: String,
    pub status: FeeStatus,
    pub date: Option<NaiveDate>,
    pub invoice_no: String,
    pub payment_method: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: Option<String>,
    pub date: Option<NaiveDate>,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub category: String,
    pub amount: f64,
    pub description: String,
    pub payment_method: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    pub id: Option<String>,
    pub title: String,
    pub date: Option<NaiveDate>,
    /// Notice body; AI-drafted notices carry an opaque HTML blob here.
    pub content: String,
    pub audience: NoticeAudience,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: Option<String>,
    pub sender_id: Option<Uuid>,
    pub sender_name: String,
    pub text: String,
    /// Server send time; `None` until the store acknowledges the message.
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Visitor {
    pub id: Option<String>,
    pub name: String,
    pub phone: String,
    pub purpose: String,
    pub in_time: String,
    pub out_time: String,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffMember {
    pub id: Option<String>,
    pub name: String,
    pub designation: String,
    pub phone: String,
    pub email: String,
    pub joining_date: Option<NaiveDate>,
    pub salary: f64,
}

/// One record in a live collection, tagged by entity kind.
///
/// A record whose `id` is `None` has never been acknowledged by the remote
/// store; it exists only as a pending write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum EntityRecord {
    Student(Student),
    Fee(FeeRecord),
    Transaction(Transaction),
    Notice(Notice),
    Message(ChatMessage),
    Visitor(Visitor),
    Staff(StaffMember),
}

impl EntityRecord {
    /// The server-assigned id, if this record has been acknowledged.
    pub fn id(&self) -> Option<&str> {
        match self {
            EntityRecord::Student(r) => r.id.as_deref(),
            EntityRecord::Fee(r) => r.id.as_deref(),
            EntityRecord::Transaction(r) => r.id.as_deref(),
            EntityRecord::Notice(r) => r.id.as_deref(),
            EntityRecord::Message(r) => r.id.as_deref(),
            EntityRecord::Visitor(r) => r.id.as_deref(),
            EntityRecord::Staff(r) => r.id.as_deref(),
        }
    }

    /// Stamps the server-assigned fields onto the record: the id always, and
    /// the send time for chat messages that were submitted without one.
    pub fn assign_server_fields(&mut self, id: &str, server_timestamp: DateTime<Utc>) {
        match self {
            EntityRecord::Student(r) => r.id = Some(id.to_string()),
            EntityRecord::Fee(r) => r.id = Some(id.to_string()),
            EntityRecord::Transaction(r) => r.id = Some(id.to_string()),
            EntityRecord::Notice(r) => r.id = Some(id.to_string()),
            EntityRecord::Message(r) => {
                r.id = Some(id.to_string());
                if r.timestamp.is_none() {
                    r.timestamp = Some(server_timestamp);
                }
            }
            EntityRecord::Visitor(r) => r.id = Some(id.to_string()),
            EntityRecord::Staff(r) => r.id = Some(id.to_string()),
        }
    }

    /// Extracts the sort key for one of the collection's sortable fields.
    /// Returns `None` for unknown fields and for records with the field unset.
    pub fn sort_value(&self, field: &str) -> Option<SortValue> {
        match (self, field) {
            (EntityRecord::Student(r), "name") => Some(SortValue::Text(r.name.clone())),
            (EntityRecord::Student(r), "regNo") => Some(SortValue::Text(r.reg_no.clone())),
            (EntityRecord::Student(r), "admissionDate") => r.admission_date.map(SortValue::Day),
            (EntityRecord::Fee(r), "date") => r.date.map(SortValue::Day),
            (EntityRecord::Fee(r), "invoiceNo") => Some(SortValue::Text(r.invoice_no.clone())),
            (EntityRecord::Transaction(r), "date") => r.date.map(SortValue::Day),
            (EntityRecord::Notice(r), "date") => r.date.map(SortValue::Day),
            (EntityRecord::Message(r), "timestamp") => r.timestamp.map(SortValue::Stamp),
            (EntityRecord::Visitor(r), "date") => r.date.map(SortValue::Day),
            (EntityRecord::Staff(r), "name") => Some(SortValue::Text(r.name.clone())),
            (EntityRecord::Staff(r), "joiningDate") => r.joining_date.map(SortValue::Day),
            _ => None,
        }
    }

    /// Returns the mandatory fields this payload leaves empty for the given
    /// collection. A payload of the wrong entity kind reports every required
    /// field as missing.
    pub fn missing_required_for(&self, collection: Collection) -> Vec<&'static str> {
        let mut missing = Vec::new();
        match (collection, self) {
            (Collection::Students, EntityRecord::Student(r)) => {
                if r.name.trim().is_empty() {
                    missing.push("name");
                }
                if r.reg_no.trim().is_empty() {
                    missing.push("regNo");
                }
            }
            (Collection::Fees, EntityRecord::Fee(r)) => {
                if r.reg_no.trim().is_empty() {
                    missing.push("regNo");
                }
                if r.amount <= 0.0 {
                    missing.push("amount");
                }
            }
            (Collection::Incomes, EntityRecord::Transaction(r))
            | (Collection::Expenses, EntityRecord::Transaction(r)) => {
                if r.title.trim().is_empty() {
                    missing.push("title");
                }
                if r.amount <= 0.0 {
                    missing.push("amount");
                }
            }
            (Collection::Notices, EntityRecord::Notice(r)) => {
                if r.title.trim().is_empty() {
                    missing.push("title");
                }
                if r.content.trim().is_empty() {
                    missing.push("content");
                }
            }
            (Collection::Messages, EntityRecord::Message(r)) => {
                if r.text.trim().is_empty() {
                    missing.push("text");
                }
            }
            (Collection::Visitors, EntityRecord::Visitor(r)) => {
                if r.name.trim().is_empty() {
                    missing.push("name");
                }
                if r.purpose.trim().is_empty() {
                    missing.push("purpose");
                }
            }
            (Collection::Staff, EntityRecord::Staff(r)) => {
                if r.name.trim().is_empty() {
                    missing.push("name");
                }
                if r.designation.trim().is_empty() {
                    missing.push("designation");
                }
            }
            (collection, _) => missing.extend_from_slice(collection.required_fields()),
        }
        missing
    }
}

//=========================================================================================
// Pending Writes & Preferences
//=========================================================================================

/// Lifecycle of a locally submitted record not yet confirmed by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStatus {
    InFlight,
    Failed,
    Confirmed,
}

/// Organization branding kept in the local preference store, outside the
/// sync core's collections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgProfile {
    pub name: String,
    pub address: String,
    pub logo: String,
    pub banner: String,
    pub established: String,
}

impl Default for OrgProfile {
    fn default() -> Self {
        Self {
            name: "Tahjibul Ummah Madrasa".to_string(),
            address: "Ishwarganj, Bangladesh".to_string(),
            logo: "https://cdn-icons-png.flaticon.com/512/3354/3354366.png".to_string(),
            banner: "https://images.unsplash.com/photo-1564121211835-e88c852648ab?q=80&w=2070"
                .to_string(),
            established: "2015".to_string(),
        }
    }
}

//=========================================================================================
// Tests
//=========================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn student(name: &str, reg_no: &str) -> EntityRecord {
        EntityRecord::Student(Student {
            id: None,
            reg_no: reg_no.to_string(),
            name: name.to_string(),
            father_name: String::new(),
            class_name: String::new(),
            roll: String::new(),
            phone: String::new(),
            address: String::new(),
            admission_date: None,
        })
    }

    #[test]
    fn complete_student_has_no_missing_fields() {
        let record = student("Ayesha", "R1");
        assert!(record.missing_required_for(Collection::Students).is_empty());
    }

    #[test]
    fn student_without_reg_no_reports_it() {
        let record = student("Ayesha", "");
        assert_eq!(record.missing_required_for(Collection::Students), vec!["regNo"]);
    }

    #[test]
    fn wrong_entity_kind_reports_all_required_fields() {
        let record = student("Ayesha", "R1");
        assert_eq!(
            record.missing_required_for(Collection::Notices),
            Collection::Notices.required_fields().to_vec()
        );
    }

    #[test]
    fn every_live_collection_has_required_and_sortable_fields() {
        for collection in Collection::LIVE {
            assert!(!collection.required_fields().is_empty());
            assert!(!collection.sortable_fields().is_empty());
        }
    }

    #[test]
    fn default_orders_match_screen_contracts() {
        assert_eq!(
            Collection::Messages.default_order(),
            Some(OrderSpec::ascending("timestamp"))
        );
        assert_eq!(
            Collection::Notices.default_order(),
            Some(OrderSpec::descending("date"))
        );
        assert_eq!(Collection::Students.default_order(), None);
    }

    #[test]
    fn message_sort_value_is_unset_until_acknowledged() {
        let record = EntityRecord::Message(ChatMessage {
            id: None,
            sender_id: None,
            sender_name: "Admin".to_string(),
            text: "Assalamu alaikum".to_string(),
            timestamp: None,
        });
        assert_eq!(record.sort_value("timestamp"), None);
    }
}
