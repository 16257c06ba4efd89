//! Conversation store.
//!
//! `ConversationStore` is the single authority for the active chat: its
//! message list, chat id, loading and error flags, plus the chat-summary list.
//! Presentation reads snapshots and subscribes to [`StoreEvent`]s; every
//! mutation goes through one of the operations below.
//!
//! # Concurrency
//!
//! All conversation mutation happens under one `RwLock`. The `loading`
//! check-and-set of a send happens within a single write acquisition, so a
//! second send issued before the first resolves is rejected. Work that
//! outlives the lock (a transport call, a streaming reveal) records the
//! conversation epoch it started under and writes nothing once that epoch
//! is gone.

use crate::store_event::{EventBus, StoreEvent};
use crate::streaming_reveal::{RevealHandle, RevealStep, RevealTarget, StreamingReveal};
use async_trait::async_trait;
use empamind_core::EmpaMindError;
use empamind_core::auth::AuthSession;
use empamind_core::config::ClientConfig;
use empamind_core::conversation::{
    AudioClip, ChatSummary, Conversation, Message, RejectReason, ResponseFormat, Sentiment,
};
use empamind_core::transport::{ChatTransport, TransportMode, VoiceRequest};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::sync::mpsc::UnboundedReceiver;

const DEFAULT_REVEAL_INTERVAL: Duration = Duration::from_millis(20);

/// Tunables for a [`ConversationStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    /// Delay between two steps of a streaming reveal.
    pub reveal_interval: Duration,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            reveal_interval: DEFAULT_REVEAL_INTERVAL,
        }
    }
}

impl StoreOptions {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            reveal_interval: config.reveal_interval(),
        }
    }
}

/// Result of a text or voice send.
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// The reply was applied to the conversation.
    Delivered,
    /// Refused before any state changed.
    Rejected(RejectReason),
    /// The transport failed; the user-facing message is in `error`.
    Failed(EmpaMindError),
    /// The conversation was replaced before the reply arrived.
    Discarded,
}

impl SendOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, SendOutcome::Delivered)
    }
}

/// State shared with reveal tasks.
struct StoreState {
    conversation: RwLock<Conversation>,
    events: EventBus,
}

impl StoreState {
    fn publish(&self, event: StoreEvent) {
        self.events.publish(event);
    }
}

#[async_trait]
impl RevealTarget for StoreState {
    async fn apply_step(&self, step: RevealStep<'_>) -> bool {
        let mut conversation = self.conversation.write().await;
        if step.token.is_cancelled() || conversation.epoch() != step.epoch {
            return false;
        }
        let Some(message) = conversation.find_mut(step.message_id) else {
            return false;
        };

        message.text = step.text.to_string();
        message.is_streaming = !step.done;
        self.publish(StoreEvent::MessageUpdated {
            message_id: step.message_id.to_string(),
            text: message.text.clone(),
            is_streaming: message.is_streaming,
        });
        true
    }
}

/// Owner of the active conversation and the chat-summary list.
pub struct ConversationStore {
    transport: Arc<dyn ChatTransport>,
    auth: Arc<dyn AuthSession>,
    state: Arc<StoreState>,
    chat_list: RwLock<Vec<ChatSummary>>,
    reveal: StreamingReveal,
    /// At most one reveal store-wide.
    active_reveal: Mutex<Option<RevealHandle>>,
}

impl ConversationStore {
    pub fn new(transport: Arc<dyn ChatTransport>, auth: Arc<dyn AuthSession>) -> Self {
        Self::with_options(transport, auth, StoreOptions::default())
    }

    pub fn with_options(
        transport: Arc<dyn ChatTransport>,
        auth: Arc<dyn AuthSession>,
        options: StoreOptions,
    ) -> Self {
        tracing::debug!(
            "[ConversationStore] Created ({:?} transport, reveal every {:?})",
            transport.mode(),
            options.reveal_interval
        );
        Self {
            transport,
            auth,
            state: Arc::new(StoreState {
                conversation: RwLock::new(Conversation::new()),
                events: EventBus::new(),
            }),
            chat_list: RwLock::new(Vec::new()),
            reveal: StreamingReveal::new(options.reveal_interval),
            active_reveal: Mutex::new(None),
        }
    }

    pub fn mode(&self) -> TransportMode {
        self.transport.mode()
    }

    // ---- sends ----

    /// Sends a text message in the active conversation.
    pub async fn send_text(&self, text: &str) -> SendOutcome {
        self.send_text_with_title(text, None).await
    }

    /// Sends a text message, suggesting `title` if the server creates a chat.
    pub async fn send_text_with_title(&self, text: &str, title: Option<&str>) -> SendOutcome {
        let text = text.trim();
        if text.is_empty() {
            tracing::debug!("[ConversationStore] Ignoring empty message");
            return SendOutcome::Rejected(RejectReason::EmptyInput);
        }

        let (epoch, chat_id) = match self.begin_send(Message::user_text(text)).await {
            Ok(started) => started,
            Err(reason) => return SendOutcome::Rejected(reason),
        };

        let result = self
            .transport
            .send_text(text, chat_id.as_deref(), title)
            .await;

        let mut conversation = self.state.conversation.write().await;
        if conversation.epoch() != epoch {
            self.release_loading(&mut conversation);
            drop(conversation);
            return self.discard_reply(result.map(|r| r.chat_id), chat_id.is_none()).await;
        }

        match result {
            Ok(reply) => {
                let adopted = self.adopt_chat_id(&mut conversation, &reply.chat_id);
                self.append_streamed_reply(&mut conversation, epoch, reply.message, reply.sentiment);
                self.release_loading(&mut conversation);
                drop(conversation);

                if adopted {
                    self.load_chat_list().await;
                }
                SendOutcome::Delivered
            }
            Err(err) => {
                tracing::warn!("[ConversationStore] Failed to send message: {}", err);
                self.fail_send(&mut conversation, &err);
                SendOutcome::Failed(err)
            }
        }
    }

    /// Sends a recorded voice clip. The reply comes back as audio plus text
    /// when `response_format` is voice, or is revealed like a text reply.
    pub async fn send_voice(&self, audio: AudioClip, response_format: ResponseFormat) -> SendOutcome {
        if audio.is_empty() {
            tracing::debug!("[ConversationStore] Ignoring empty voice recording");
            return SendOutcome::Rejected(RejectReason::EmptyInput);
        }

        let user_message = Message::user_voice(audio.clone(), response_format);
        let message_id = user_message.id.clone();
        let (epoch, chat_id) = match self.begin_send(user_message).await {
            Ok(started) => started,
            Err(reason) => return SendOutcome::Rejected(reason),
        };

        tracing::info!(
            "[ConversationStore] Sending {} bytes of {} audio, {} reply requested",
            audio.len(),
            audio.format(),
            response_format.as_str()
        );
        let result = self
            .transport
            .send_voice(VoiceRequest {
                audio: &audio,
                audio_format: audio.format(),
                response_format,
                chat_id: chat_id.as_deref(),
                title: None,
            })
            .await;

        let mut conversation = self.state.conversation.write().await;
        if conversation.epoch() != epoch {
            self.release_loading(&mut conversation);
            drop(conversation);
            return self.discard_reply(result.map(|r| r.chat_id), chat_id.is_none()).await;
        }

        match result {
            Ok(reply) => {
                if let Some(message) = conversation.find_mut(&message_id) {
                    if !reply.transcript.trim().is_empty() {
                        message.text = reply.transcript.clone();
                        self.state.publish(StoreEvent::MessageUpdated {
                            message_id: message_id.clone(),
                            text: message.text.clone(),
                            is_streaming: false,
                        });
                    }
                }

                let adopted = self.adopt_chat_id(&mut conversation, &reply.chat_id);
                match response_format {
                    ResponseFormat::Voice => {
                        if reply.audio.is_none() {
                            tracing::debug!("[ConversationStore] Voice reply without audio, showing text only");
                        }
                        let message =
                            Message::assistant_voice(reply.response, reply.sentiment, reply.audio);
                        conversation.push(message.clone());
                        self.state.publish(StoreEvent::MessageAppended(message));
                    }
                    ResponseFormat::Text => {
                        self.append_streamed_reply(&mut conversation, epoch, reply.response, reply.sentiment);
                    }
                }
                self.release_loading(&mut conversation);
                drop(conversation);

                if adopted {
                    self.load_chat_list().await;
                }
                SendOutcome::Delivered
            }
            Err(err) => {
                tracing::warn!("[ConversationStore] Failed to send voice message: {}", err);
                if conversation.remove(&message_id).is_some() {
                    self.state.publish(StoreEvent::MessageRemoved { message_id });
                }
                self.fail_send(&mut conversation, &err);
                SendOutcome::Failed(err)
            }
        }
    }

    // ---- conversation switching ----

    /// Starts an empty conversation with no chat id.
    pub async fn start_new_chat(&self) {
        let mut conversation = self.state.conversation.write().await;
        self.cancel_reveal();
        conversation.reset();
        self.state
            .publish(StoreEvent::ConversationReset { chat_id: None });
        tracing::info!("[ConversationStore] Started new chat");
    }

    /// Switches to `chat_id` and loads its history.
    pub async fn select_chat(&self, chat_id: &str) {
        let chat_id = chat_id.trim();
        if chat_id.is_empty() {
            return;
        }

        {
            let mut conversation = self.state.conversation.write().await;
            self.cancel_reveal();
            conversation.switch_to(chat_id);
            self.state.publish(StoreEvent::ConversationReset {
                chat_id: Some(chat_id.to_string()),
            });
        }
        tracing::info!("[ConversationStore] Selected chat {}", chat_id);

        self.load_chat_history(chat_id).await;
    }

    /// Fetches the history of `chat_id` and makes it the active conversation.
    ///
    /// Messages sent while the fetch is in flight stay after the loaded
    /// history. Failures are logged; the conversation is left as it was.
    pub async fn load_chat_history(&self, chat_id: &str) {
        let chat_id = chat_id.trim();
        if chat_id.is_empty() {
            return;
        }
        if !self.may_reach_backend().await {
            tracing::debug!("[ConversationStore] Not signed in, skipping history load");
            return;
        }

        let (epoch, known_ids) = {
            let conversation = self.state.conversation.read().await;
            let known_ids: HashSet<String> =
                conversation.messages.iter().map(|m| m.id.clone()).collect();
            (conversation.epoch(), known_ids)
        };
        let messages = match self.transport.get_history(chat_id).await {
            Ok(messages) => messages,
            Err(err) => {
                tracing::warn!("[ConversationStore] Failed to load chat history for {}: {}", chat_id, err);
                return;
            }
        };

        let mut conversation = self.state.conversation.write().await;
        if conversation.epoch() != epoch {
            tracing::debug!("[ConversationStore] Conversation changed during history load for {}, ignoring", chat_id);
            return;
        }

        // Messages sent to this chat while the fetch was in flight survive the load
        let same_chat = conversation.chat_id.as_deref() == Some(chat_id);
        let pending: Vec<Message> = conversation
            .messages
            .iter()
            .filter(|m| same_chat && !known_ids.contains(&m.id))
            .cloned()
            .collect();
        let reveal_is_pending = self
            .active_reveal_message_id()
            .is_some_and(|id| pending.iter().any(|m| m.id == id));
        if !reveal_is_pending {
            self.cancel_reveal();
        }

        if !same_chat {
            conversation.switch_to(chat_id);
            self.state.publish(StoreEvent::ConversationReset {
                chat_id: Some(chat_id.to_string()),
            });
        }
        let message_count = messages.len();
        conversation.replace_messages(messages);
        if !pending.is_empty() {
            tracing::debug!(
                "[ConversationStore] Keeping {} messages sent during history load for {}",
                pending.len(),
                chat_id
            );
            for message in pending {
                conversation.push(message);
            }
        }
        self.state.publish(StoreEvent::HistoryLoaded {
            chat_id: chat_id.to_string(),
            message_count,
        });
        tracing::debug!("[ConversationStore] Loaded {} messages for {}", message_count, chat_id);
    }

    /// Clears the messages of the active conversation but keeps its chat id.
    pub async fn clear_chat(&self) {
        let mut conversation = self.state.conversation.write().await;
        self.cancel_reveal();
        conversation.clear_messages();
        self.state.publish(StoreEvent::ConversationReset {
            chat_id: conversation.chat_id.clone(),
        });
    }

    // ---- chat list ----

    /// Refreshes the chat-summary list. Failures are logged only.
    pub async fn load_chat_list(&self) {
        if !self.may_reach_backend().await {
            tracing::debug!("[ConversationStore] Not signed in, skipping chat list load");
            return;
        }

        match self.transport.list_chats().await {
            Ok(chats) => {
                tracing::debug!("[ConversationStore] Loaded {} chats", chats.len());
                *self.chat_list.write().await = chats.clone();
                self.state.publish(StoreEvent::ChatListRefreshed(chats));
            }
            Err(err) => {
                tracing::warn!("[ConversationStore] Failed to load chat list: {}", err);
            }
        }
    }

    /// Renames a chat. Returns `false` on invalid input or failure.
    pub async fn rename_chat(&self, chat_id: &str, new_title: &str) -> bool {
        let new_title = new_title.trim();
        if chat_id.trim().is_empty() || new_title.is_empty() {
            tracing::debug!("[ConversationStore] Rename needs a chat id and a title");
            return false;
        }

        match self.transport.rename_chat(chat_id, new_title).await {
            Ok(()) => {
                tracing::info!("[ConversationStore] Renamed chat {}", chat_id);
                self.load_chat_list().await;
                true
            }
            Err(err) => {
                tracing::warn!("[ConversationStore] Failed to rename chat {}: {}", chat_id, err);
                self.record_error(err.user_message()).await;
                false
            }
        }
    }

    /// Deletes a chat, resetting the active conversation if it was selected.
    pub async fn delete_chat(&self, chat_id: &str) -> bool {
        let chat_id = chat_id.trim();
        if chat_id.is_empty() {
            return false;
        }

        match self.transport.delete_chat(chat_id).await {
            Ok(()) => {
                tracing::info!("[ConversationStore] Deleted chat {}", chat_id);
                {
                    let mut conversation = self.state.conversation.write().await;
                    if conversation.chat_id.as_deref() == Some(chat_id) {
                        self.cancel_reveal();
                        conversation.reset();
                        self.state
                            .publish(StoreEvent::ConversationReset { chat_id: None });
                    }
                }
                self.load_chat_list().await;
                true
            }
            Err(err) => {
                tracing::warn!("[ConversationStore] Failed to delete chat {}: {}", chat_id, err);
                self.record_error(err.user_message()).await;
                false
            }
        }
    }

    // ---- read access ----

    pub async fn snapshot(&self) -> Conversation {
        self.state.conversation.read().await.clone()
    }

    pub async fn chat_list(&self) -> Vec<ChatSummary> {
        self.chat_list.read().await.clone()
    }

    pub fn subscribe(&self) -> UnboundedReceiver<StoreEvent> {
        self.state.events.subscribe()
    }

    /// Waits until the current reveal, if any, has stopped.
    pub async fn wait_for_reveal(&self) {
        let finished = self
            .active_reveal
            .lock()
            .ok()
            .and_then(|slot| slot.as_ref().map(RevealHandle::finished_signal));
        if let Some(finished) = finished {
            finished.cancelled().await;
        }
    }

    /// Cancels any pending reveal. Call when the presentation goes away.
    pub async fn shutdown(&self) {
        let _conversation = self.state.conversation.write().await;
        self.cancel_reveal();
        tracing::debug!("[ConversationStore] Shut down");
    }

    // ---- internals ----

    /// Applies the optimistic half of a send under the lock.
    ///
    /// Returns the epoch and the chat id the request should carry.
    async fn begin_send(&self, message: Message) -> Result<(u64, Option<String>), RejectReason> {
        let mut conversation = self.state.conversation.write().await;
        if conversation.loading {
            tracing::debug!("[ConversationStore] Send ignored, another send is in flight");
            return Err(RejectReason::Busy);
        }

        self.flush_superseded_reveal(&mut conversation);
        let had_error = conversation.error.is_some();
        let epoch = conversation.begin_send(message.clone())?;

        self.state.publish(StoreEvent::MessageAppended(message));
        self.state.publish(StoreEvent::LoadingChanged(true));
        if had_error {
            self.state.publish(StoreEvent::ErrorChanged(None));
        }
        Ok((epoch, conversation.chat_id.clone()))
    }

    fn adopt_chat_id(&self, conversation: &mut Conversation, chat_id: &str) -> bool {
        if !conversation.adopt_chat_id(chat_id) {
            return false;
        }
        tracing::info!("[ConversationStore] Conversation assigned chat id {}", chat_id);
        self.state.publish(StoreEvent::ChatIdAssigned {
            chat_id: chat_id.to_string(),
        });
        true
    }

    /// Appends the assistant reply and starts revealing it.
    fn append_streamed_reply(
        &self,
        conversation: &mut Conversation,
        epoch: u64,
        text: String,
        sentiment: Option<Sentiment>,
    ) {
        if text.is_empty() {
            let message = Message::assistant(text, sentiment);
            conversation.push(message.clone());
            self.state.publish(StoreEvent::MessageAppended(message));
            return;
        }

        let message = Message::assistant_streaming(sentiment);
        let message_id = message.id.clone();
        conversation.push(message.clone());
        self.state.publish(StoreEvent::MessageAppended(message));

        let target: Arc<dyn RevealTarget> = self.state.clone();
        let handle = self.reveal.start(target, epoch, message_id, text);
        if let Ok(mut slot) = self.active_reveal.lock() {
            if let Some(previous) = slot.replace(handle) {
                previous.cancel();
            }
        }
    }

    fn release_loading(&self, conversation: &mut Conversation) {
        conversation.finish();
        self.state.publish(StoreEvent::LoadingChanged(false));
    }

    fn fail_send(&self, conversation: &mut Conversation, err: &EmpaMindError) {
        let message = err.user_message();
        conversation.fail(message.clone());
        self.state.publish(StoreEvent::ErrorChanged(Some(message)));
        self.state.publish(StoreEvent::LoadingChanged(false));
    }

    /// Handles a reply for a conversation that has since been replaced.
    async fn discard_reply(
        &self,
        result: empamind_core::Result<String>,
        created_chat: bool,
    ) -> SendOutcome {
        match result {
            Ok(chat_id) => {
                tracing::info!("[ConversationStore] Conversation changed during send, discarding reply for {}", chat_id);
                if created_chat {
                    self.load_chat_list().await;
                }
                SendOutcome::Discarded
            }
            Err(err) => {
                tracing::warn!("[ConversationStore] Send failed after conversation changed: {}", err);
                SendOutcome::Failed(err)
            }
        }
    }

    async fn record_error(&self, message: String) {
        let mut conversation = self.state.conversation.write().await;
        conversation.error = Some(message.clone());
        self.state.publish(StoreEvent::ErrorChanged(Some(message)));
    }

    /// Demo transports are always reachable; remote ones need a signed-in user.
    async fn may_reach_backend(&self) -> bool {
        !self.transport.mode().is_remote() || self.auth.is_authenticated().await
    }

    fn take_reveal(&self) -> Option<RevealHandle> {
        self.active_reveal.lock().ok().and_then(|mut slot| slot.take())
    }

    fn active_reveal_message_id(&self) -> Option<String> {
        self.active_reveal
            .lock()
            .ok()
            .and_then(|slot| slot.as_ref().map(|handle| handle.message_id().to_string()))
    }

    /// Cancels the running reveal without touching its message.
    ///
    /// Callers hold the conversation write lock, except on drop when the
    /// lock may be contended.
    fn cancel_reveal(&self) {
        if let Some(handle) = self.take_reveal() {
            if !handle.is_finished() {
                tracing::debug!(
                    "[ConversationStore] {}",
                    EmpaMindError::streaming_interrupted(handle.message_id())
                );
            }
            handle.cancel();
        }
    }

    /// Cancels the running reveal and writes its full text into the message.
    fn flush_superseded_reveal(&self, conversation: &mut Conversation) {
        let Some(handle) = self.take_reveal() else {
            return;
        };
        handle.cancel();

        if let Some(message) = conversation.find_mut(handle.message_id()) {
            if message.is_streaming {
                message.text = handle.full_text().to_string();
                message.is_streaming = false;
                self.state.publish(StoreEvent::MessageUpdated {
                    message_id: message.id.clone(),
                    text: message.text.clone(),
                    is_streaming: false,
                });
                tracing::debug!("[ConversationStore] Flushed superseded reveal of {}", message.id);
            }
        }
    }
}

impl Drop for ConversationStore {
    fn drop(&mut self) {
        let _conversation = self.state.conversation.try_write();
        self.cancel_reveal();
    }
}
