//! Chat transport trait.
//!
//! Defines the interface the conversation store uses to reach the chat
//! backend, decoupling it from HTTP, authentication and the offline demo.

use crate::conversation::{AudioClip, AudioFormat, ChatSummary, Message, ResponseFormat, Sentiment};
use crate::error::Result;
use async_trait::async_trait;

/// Which strategy a transport implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    /// Talks to a configured backend endpoint.
    Remote,
    /// No endpoint configured; canned data and simulated latency.
    Demo,
}

impl TransportMode {
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote)
    }
}

/// Reply to a text send.
#[derive(Debug, Clone, PartialEq)]
pub struct TextReply {
    pub chat_id: String,
    pub message: String,
    pub sentiment: Option<Sentiment>,
}

/// Reply to a voice send.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceReply {
    pub chat_id: String,
    /// What the backend heard.
    pub transcript: String,
    /// Assistant reply text; also the fallback when audio is missing.
    pub response: String,
    pub sentiment: Option<Sentiment>,
    /// Synthesized speech, present only for voice replies that decoded cleanly.
    pub audio: Option<AudioClip>,
}

/// A voice send request.
#[derive(Debug, Clone)]
pub struct VoiceRequest<'a> {
    pub audio: &'a AudioClip,
    pub audio_format: AudioFormat,
    pub response_format: ResponseFormat,
    pub chat_id: Option<&'a str>,
    pub title: Option<&'a str>,
}

/// An abstract client for the chat backend.
///
/// Every failure surfaces as an [`crate::EmpaMindError`]; the conversation
/// store converts it into the conversation's error string.
///
/// # Implementation Notes
///
/// Implementations should:
/// - attach the bearer credential when one is available
/// - keep working without a credential or endpoint (demo mode)
/// - decode voice replies, omitting (not failing on) undecodable audio
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Which strategy this transport implements.
    fn mode(&self) -> TransportMode;

    /// Sends a text message.
    ///
    /// # Arguments
    ///
    /// * `message` - Trimmed, non-empty user text
    /// * `chat_id` - Existing conversation, or `None` to start one
    /// * `title` - Optional title for a new conversation
    async fn send_text(
        &self,
        message: &str,
        chat_id: Option<&str>,
        title: Option<&str>,
    ) -> Result<TextReply>;

    /// Sends a recorded voice message.
    async fn send_voice(&self, request: VoiceRequest<'_>) -> Result<VoiceReply>;

    /// Loads the full message history of a conversation.
    async fn get_history(&self, chat_id: &str) -> Result<Vec<Message>>;

    /// Lists the user's conversations.
    async fn list_chats(&self) -> Result<Vec<ChatSummary>>;

    /// Renames a conversation. Fails with a validation error on an empty title.
    async fn rename_chat(&self, chat_id: &str, title: &str) -> Result<()>;

    /// Deletes a conversation.
    async fn delete_chat(&self, chat_id: &str) -> Result<()>;
}
