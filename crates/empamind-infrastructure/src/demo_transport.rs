//! DemoTransport - offline stand-in used when no API endpoint is configured.
//!
//! Replies are canned and delayed to mimic network latency. The chat list is
//! kept in memory so renames, deletions and new chats show up on the next
//! `list_chats`.

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use empamind_core::conversation::{ChatSummary, Message, Sender, Sentiment};
use empamind_core::transport::{ChatTransport, TextReply, TransportMode, VoiceReply, VoiceRequest};
use empamind_core::{EmpaMindError, Result};
use std::time::Duration;
use tokio::sync::Mutex;

pub const DEMO_REPLY: &str = "I understand how you're feeling. This is a demo response since the backend is not configured. When you deploy the backend, you'll get real AI-powered empathetic responses.";
pub const DEMO_VOICE_TRANSCRIPT: &str = "This is a demo transcript of your voice message.";
pub const DEMO_VOICE_REPLY: &str = "Thank you for sharing that with me. This is a demo voice response since the backend is not configured.";

const TITLE_MAX_CHARS: usize = 50;

/// Transport implementation backed by canned data.
pub struct DemoTransport {
    delay: Duration,
    chats: Mutex<Vec<ChatSummary>>,
}

impl DemoTransport {
    /// Creates a demo transport seeded with two sample chats.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            chats: Mutex::new(seed_chats()),
        }
    }

    async fn simulate_latency(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }

    /// Returns the chat id to answer with, registering a new chat if needed.
    async fn touch_chat(&self, chat_id: Option<&str>, title: Option<&str>, first_message: &str) -> String {
        let now = Utc::now().to_rfc3339();
        let mut chats = self.chats.lock().await;

        if let Some(id) = chat_id.filter(|id| !id.trim().is_empty()) {
            if let Some(chat) = chats.iter_mut().find(|c| c.chat_id == id) {
                chat.last_message_time = now;
            }
            return id.to_string();
        }

        let mut chat_id = format!("demo-{}", Utc::now().timestamp_millis());
        while chats.iter().any(|c| c.chat_id == chat_id) {
            chat_id.push('x');
        }

        let title = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| derive_title(first_message));

        tracing::debug!("[DemoTransport] Created demo chat {}", chat_id);
        chats.push(ChatSummary {
            chat_id: chat_id.clone(),
            title: Some(title),
            last_message_time: now.clone(),
            created_at: now,
        });
        chat_id
    }
}

#[async_trait]
impl ChatTransport for DemoTransport {
    fn mode(&self) -> TransportMode {
        TransportMode::Demo
    }

    async fn send_text(
        &self,
        message: &str,
        chat_id: Option<&str>,
        title: Option<&str>,
    ) -> Result<TextReply> {
        self.simulate_latency().await;
        let chat_id = self.touch_chat(chat_id, title, message).await;

        Ok(TextReply {
            chat_id,
            message: DEMO_REPLY.to_string(),
            sentiment: Some(Sentiment::Neutral),
        })
    }

    async fn send_voice(&self, request: VoiceRequest<'_>) -> Result<VoiceReply> {
        if request.audio.is_empty() {
            return Err(EmpaMindError::validation("Audio is required"));
        }
        self.simulate_latency().await;
        let chat_id = self
            .touch_chat(request.chat_id, request.title, DEMO_VOICE_TRANSCRIPT)
            .await;

        // No speech synthesis offline; voice replies fall back to their text
        Ok(VoiceReply {
            chat_id,
            transcript: DEMO_VOICE_TRANSCRIPT.to_string(),
            response: DEMO_VOICE_REPLY.to_string(),
            sentiment: Some(Sentiment::Neutral),
            audio: None,
        })
    }

    async fn get_history(&self, chat_id: &str) -> Result<Vec<Message>> {
        if chat_id.trim().is_empty() {
            return Err(EmpaMindError::validation("chatId is required"));
        }
        Ok(demo_history())
    }

    async fn list_chats(&self) -> Result<Vec<ChatSummary>> {
        let mut chats = self.chats.lock().await.clone();
        chats.sort_by(|a, b| b.last_message_time.cmp(&a.last_message_time));
        Ok(chats)
    }

    async fn rename_chat(&self, chat_id: &str, title: &str) -> Result<()> {
        let title = title.trim();
        if chat_id.trim().is_empty() || title.is_empty() {
            return Err(EmpaMindError::validation("chatId and title are required"));
        }

        let mut chats = self.chats.lock().await;
        if let Some(chat) = chats.iter_mut().find(|c| c.chat_id == chat_id) {
            chat.title = Some(title.to_string());
        }
        Ok(())
    }

    async fn delete_chat(&self, chat_id: &str) -> Result<()> {
        if chat_id.trim().is_empty() {
            return Err(EmpaMindError::validation("chatId is required"));
        }
        self.chats.lock().await.retain(|c| c.chat_id != chat_id);
        Ok(())
    }
}

/// First 50 characters of the opening message, with `...` when truncated.
fn derive_title(message: &str) -> String {
    let message = message.trim();
    if message.chars().count() > TITLE_MAX_CHARS {
        let head: String = message.chars().take(TITLE_MAX_CHARS).collect();
        format!("{head}...")
    } else {
        message.to_string()
    }
}

fn ago(duration: ChronoDuration) -> String {
    (Utc::now() - duration).to_rfc3339()
}

fn seed_chats() -> Vec<ChatSummary> {
    vec![
        ChatSummary {
            chat_id: "demo-1".to_string(),
            title: Some("Feeling anxious today...".to_string()),
            last_message_time: Utc::now().to_rfc3339(),
            created_at: ago(ChronoDuration::days(1)),
        },
        ChatSummary {
            chat_id: "demo-2".to_string(),
            title: Some("Need support".to_string()),
            last_message_time: ago(ChronoDuration::hours(1)),
            created_at: ago(ChronoDuration::days(2)),
        },
    ]
}

fn history_message(id: &str, text: &str, sender: Sender, minutes_ago: i64, sentiment: Option<Sentiment>) -> Message {
    let mut message = match sender {
        Sender::User => Message::user_text(text),
        Sender::Assistant => Message::assistant(text, sentiment),
    };
    message.id = id.to_string();
    message.timestamp = ago(ChronoDuration::minutes(minutes_ago));
    message
}

fn demo_history() -> Vec<Message> {
    vec![
        history_message(
            "1",
            "Hello, I'm feeling a bit anxious today.",
            Sender::User,
            60,
            None,
        ),
        history_message(
            "2",
            "I understand that anxiety can be really challenging. Take a deep breath with me. What's been on your mind today?",
            Sender::Assistant,
            58,
            Some(Sentiment::Neutral),
        ),
        history_message(
            "3",
            "Work has been really stressful lately.",
            Sender::User,
            56,
            None,
        ),
        history_message(
            "4",
            "Work stress can feel overwhelming. Remember, it's okay to take breaks and prioritize your wellbeing. What specific aspects of work are causing you the most stress?",
            Sender::Assistant,
            55,
            Some(Sentiment::Negative),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use empamind_core::conversation::{AudioClip, AudioFormat, ResponseFormat};

    #[tokio::test(start_paused = true)]
    async fn test_send_text_synthesizes_chat_id_and_lists_it() {
        let transport = DemoTransport::new(Duration::from_secs(1));

        let reply = transport.send_text("I feel anxious", None, None).await.unwrap();

        assert!(reply.chat_id.starts_with("demo-"));
        assert_eq!(reply.message, DEMO_REPLY);
        assert_eq!(reply.sentiment, Some(Sentiment::Neutral));

        let chats = transport.list_chats().await.unwrap();
        let created = chats.iter().find(|c| c.chat_id == reply.chat_id).unwrap();
        assert_eq!(created.title.as_deref(), Some("I feel anxious"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_text_keeps_existing_chat_id() {
        let transport = DemoTransport::new(Duration::from_millis(10));
        let reply = transport.send_text("again", Some("demo-2"), None).await.unwrap();

        assert_eq!(reply.chat_id, "demo-2");
        assert_eq!(transport.list_chats().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_rename_and_delete_are_reflected_in_list() {
        let transport = DemoTransport::new(Duration::ZERO);

        transport.rename_chat("demo-1", "  Calmer now ").await.unwrap();
        transport.delete_chat("demo-2").await.unwrap();

        let chats = transport.list_chats().await.unwrap();
        assert_eq!(chats.len(), 1);
        assert_eq!(chats[0].title.as_deref(), Some("Calmer now"));
    }

    #[tokio::test]
    async fn test_rename_rejects_empty_title() {
        let transport = DemoTransport::new(Duration::ZERO);
        let err = transport.rename_chat("demo-1", "   ").await.unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_voice_reply_has_no_audio() {
        let transport = DemoTransport::new(Duration::ZERO);
        let clip = AudioClip::new(vec![1, 2, 3], AudioFormat::Webm);

        let reply = transport
            .send_voice(VoiceRequest {
                audio: &clip,
                audio_format: AudioFormat::Webm,
                response_format: ResponseFormat::Voice,
                chat_id: None,
                title: None,
            })
            .await
            .unwrap();

        assert_eq!(reply.transcript, DEMO_VOICE_TRANSCRIPT);
        assert!(reply.audio.is_none());
    }

    #[test]
    fn test_derive_title_truncates_long_messages() {
        let long = "a".repeat(60);
        let title = derive_title(&long);
        assert_eq!(title.chars().count(), 53);
        assert!(title.ends_with("..."));
        assert_eq!(derive_title(" short "), "short");
    }

    #[tokio::test]
    async fn test_history_is_canned() {
        let transport = DemoTransport::new(Duration::ZERO);
        let history = transport.get_history("demo-1").await.unwrap();
        assert_eq!(history.len(), 4);
        assert_eq!(history[1].sentiment, Some(Sentiment::Neutral));
        assert_eq!(history[3].sentiment, Some(Sentiment::Negative));
    }
}
