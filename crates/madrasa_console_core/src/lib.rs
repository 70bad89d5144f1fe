pub mod domain;
pub mod ports;

pub use domain::{
    AssistantTurn, ChatMessage, Collection, Direction, EntityRecord, FeeRecord, FeeStatus,
    Language, Notice, NoticeAudience, OrderSpec, OrgProfile, Session, SortValue, StaffMember,
    Student, Transaction, TransactionKind, TurnRole, Visitor, WriteStatus,
};
pub use ports::{
    AppendAck, AssistantService, AuthError, AuthProvider, Conversation, PrefsError,
    PreferenceStore, RemoteStore, ServiceError, Snapshot, SnapshotStream, SessionStream,
    StoreError, ValidationError,
};
