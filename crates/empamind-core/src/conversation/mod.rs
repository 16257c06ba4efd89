//! Conversation domain module.
//!
//! # Module Structure
//!
//! - `message`: chat messages (`Message`, `Sender`, `Sentiment`, `ResponseFormat`)
//! - `audio`: opaque audio attachments (`AudioClip`, `AudioFormat`)
//! - `model`: the active conversation (`Conversation`)
//! - `chat_summary`: sidebar entries (`ChatSummary`)

mod audio;
mod chat_summary;
mod message;
mod model;

pub use audio::{AudioClip, AudioFormat};
pub use chat_summary::ChatSummary;
pub use message::{
    Message, ResponseFormat, Sender, Sentiment, VOICE_PLACEHOLDER_TEXT,
    deserialize_lenient_sentiment,
};
pub use model::{Conversation, RejectReason};
