//! Application layer for the EmpaMind client.
//!
//! Hosts the conversation store, which coordinates the transport and auth
//! collaborators from `empamind-core` into the client-side conversation
//! state machine.

pub mod conversation_store;
pub mod store_event;
pub mod streaming_reveal;

pub use conversation_store::{ConversationStore, SendOutcome, StoreOptions};
pub use store_event::{EventBus, StoreEvent};
pub use streaming_reveal::{RevealHandle, StreamingReveal};
