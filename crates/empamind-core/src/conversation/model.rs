//! Active conversation model.
//!
//! [`Conversation`] is the plain state owned by the conversation store. Its
//! methods are the primitive transitions the store composes; none of them
//! perform I/O.

use super::message::Message;
use serde::Serialize;

/// Why a send was refused before touching any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RejectReason {
    /// Text trimmed to empty, or the audio clip had no bytes.
    EmptyInput,
    /// Another send is still in flight.
    Busy,
}

/// The active chat: its id, message list and loading/error flags.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    /// Absent until the first server round-trip assigns one.
    pub chat_id: Option<String>,
    /// Display order is insertion order.
    pub messages: Vec<Message>,
    pub loading: bool,
    pub error: Option<String>,
    /// Bumped every time the conversation is replaced wholesale.
    #[serde(skip)]
    epoch: u64,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identifies the current incarnation of the conversation.
    ///
    /// Work started under one epoch must not write into another.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Starts a fresh, empty conversation ("new chat").
    ///
    /// `loading` is left alone: it belongs to whichever operation set it and
    /// is released by that operation.
    pub fn reset(&mut self) {
        self.chat_id = None;
        self.messages.clear();
        self.error = None;
        self.epoch += 1;
    }

    /// Switches to `chat_id` with no messages yet.
    pub fn switch_to(&mut self, chat_id: impl Into<String>) {
        self.reset();
        self.chat_id = Some(chat_id.into());
    }

    /// Replaces the message list wholesale; never merges.
    pub fn replace_messages(&mut self, messages: Vec<Message>) {
        self.messages = messages;
        for message in &mut self.messages {
            message.is_streaming = false;
        }
    }

    /// Clears messages and error but keeps the chat id.
    pub fn clear_messages(&mut self) {
        self.messages.clear();
        self.error = None;
        self.epoch += 1;
    }

    /// Applies the optimistic half of a send.
    ///
    /// Appends `message`, raises `loading` and clears the previous error.
    /// Returns the epoch the send belongs to.
    pub fn begin_send(&mut self, message: Message) -> Result<u64, RejectReason> {
        if self.loading {
            return Err(RejectReason::Busy);
        }
        self.messages.push(message);
        self.loading = true;
        self.error = None;
        Ok(self.epoch)
    }

    /// Adopts a server-issued chat id if none is set yet.
    ///
    /// Returns `true` when the id was adopted.
    pub fn adopt_chat_id(&mut self, chat_id: &str) -> bool {
        if self.chat_id.is_some() || chat_id.trim().is_empty() {
            return false;
        }
        self.chat_id = Some(chat_id.to_string());
        true
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn find_mut(&mut self, message_id: &str) -> Option<&mut Message> {
        self.messages.iter_mut().find(|m| m.id == message_id)
    }

    pub fn remove(&mut self, message_id: &str) -> Option<Message> {
        let index = self.messages.iter().position(|m| m.id == message_id)?;
        Some(self.messages.remove(index))
    }

    /// Releases `loading` after a successful operation.
    pub fn finish(&mut self) {
        self.loading = false;
    }

    /// Releases `loading` and records a user-facing error.
    pub fn fail(&mut self, error: impl Into<String>) {
        self.loading = false;
        self.error = Some(error.into());
    }

    /// True while any assistant message is still being revealed.
    pub fn is_streaming(&self) -> bool {
        self.messages.iter().any(|m| m.is_streaming)
    }
}
