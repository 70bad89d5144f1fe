pub mod assistant;
pub mod channel;
pub mod pending;
pub mod root;

pub use assistant::{AssistantController, ASSISTANT_FALLBACK_REPLY, ASSISTANT_SYSTEM_PROMPT};
pub use channel::EntityChannel;
pub use pending::{PendingWriteHandle, PendingWriteTracker};
pub use root::CompositionRoot;
