//! Conversation message types.
//!
//! A [`Message`] is one bubble in the active chat. User messages are created
//! locally (optimistically) by the conversation store; assistant messages are
//! created from transport replies or loaded from history.

use super::audio::AudioClip;
use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Placeholder shown on a voice message until the server transcript arrives.
pub const VOICE_PLACEHOLDER_TEXT: &str = "🎤 Voice message";

/// Who wrote a message.
///
/// The backend calls the assistant `"ai"`; `"assistant"` is accepted as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sender {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "ai", alias = "assistant")]
    Assistant,
}

/// Sentiment detected by the backend for a user utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
    Mixed,
}

impl Sentiment {
    /// Parses a backend sentiment label, case-insensitively.
    ///
    /// Unknown labels yield `None` so that an unexpected value never fails a
    /// whole response.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_uppercase().as_str() {
            "POSITIVE" => Some(Self::Positive),
            "NEGATIVE" => Some(Self::Negative),
            "NEUTRAL" => Some(Self::Neutral),
            "MIXED" => Some(Self::Mixed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "POSITIVE",
            Self::Negative => "NEGATIVE",
            Self::Neutral => "NEUTRAL",
            Self::Mixed => "MIXED",
        }
    }
}

/// Deserializes an optional sentiment, treating unknown labels as absent.
pub fn deserialize_lenient_sentiment<'de, D>(deserializer: D) -> Result<Option<Sentiment>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(Sentiment::parse))
}

/// How the assistant should answer a voice message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    #[default]
    Text,
    Voice,
}

impl ResponseFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Voice => "voice",
        }
    }
}

impl std::str::FromStr for ResponseFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "voice" => Ok(Self::Voice),
            other => Err(format!("unknown response format '{other}'")),
        }
    }
}

/// A single message in the active conversation.
///
/// The wire shape follows the backend history endpoint
/// (`id`, `text`, `sender`, `timestamp`, `sentiment`); the remaining fields
/// are client-side state and default when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Unique within a session.
    pub id: String,
    pub text: String,
    pub sender: Sender,
    /// Creation time (ISO 8601 format).
    pub timestamp: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_lenient_sentiment"
    )]
    pub sentiment: Option<Sentiment>,
    /// True only on an assistant message whose reveal is still running.
    #[serde(default)]
    pub is_streaming: bool,
    #[serde(default)]
    pub is_voice: bool,
    #[serde(default)]
    pub response_format: ResponseFormat,
    /// Recorded or synthesized audio. Never part of the wire format.
    #[serde(skip)]
    pub audio: Option<AudioClip>,
}

impl Message {
    fn new(text: impl Into<String>, sender: Sender) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: text.into(),
            sender,
            timestamp: Utc::now().to_rfc3339(),
            sentiment: None,
            is_streaming: false,
            is_voice: false,
            response_format: ResponseFormat::Text,
            audio: None,
        }
    }

    /// Creates a user text message with a fresh id and the current timestamp.
    pub fn user_text(text: impl Into<String>) -> Self {
        Self::new(text, Sender::User)
    }

    /// Creates the optimistic user voice message carrying the recorded clip.
    pub fn user_voice(audio: AudioClip, response_format: ResponseFormat) -> Self {
        Self {
            is_voice: true,
            response_format,
            audio: Some(audio),
            ..Self::new(VOICE_PLACEHOLDER_TEXT, Sender::User)
        }
    }

    /// Creates an empty assistant message in streaming state.
    pub fn assistant_streaming(sentiment: Option<Sentiment>) -> Self {
        Self {
            sentiment,
            is_streaming: true,
            ..Self::new(String::new(), Sender::Assistant)
        }
    }

    /// Creates a fully revealed assistant message.
    pub fn assistant(text: impl Into<String>, sentiment: Option<Sentiment>) -> Self {
        Self {
            sentiment,
            ..Self::new(text, Sender::Assistant)
        }
    }

    /// Creates an assistant voice reply: audio attachment plus fallback text.
    pub fn assistant_voice(
        text: impl Into<String>,
        sentiment: Option<Sentiment>,
        audio: Option<AudioClip>,
    ) -> Self {
        Self {
            sentiment,
            response_format: ResponseFormat::Voice,
            audio,
            ..Self::new(text, Sender::Assistant)
        }
    }

    pub fn is_user(&self) -> bool {
        self.sender == Sender::User
    }

    pub fn is_assistant(&self) -> bool {
        self.sender == Sender::Assistant
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::audio::AudioFormat;

    #[test]
    fn test_history_message_deserializes_backend_shape() {
        let json = r#"{
            "id": "2024-01-01T00:00:00Z-ai",
            "text": "Take a deep breath.",
            "sender": "ai",
            "timestamp": "2024-01-01T00:00:00Z",
            "sentiment": null
        }"#;

        let message: Message = serde_json::from_str(json).unwrap();
        assert_eq!(message.sender, Sender::Assistant);
        assert_eq!(message.sentiment, None);
        assert!(!message.is_streaming);
        assert_eq!(message.response_format, ResponseFormat::Text);
    }

    #[test]
    fn test_unknown_sentiment_is_dropped() {
        let json = r#"{"id":"1","text":"hi","sender":"user","timestamp":"t","sentiment":"ELATED"}"#;
        let message: Message = serde_json::from_str(json).unwrap();
        assert_eq!(message.sentiment, None);

        let json = r#"{"id":"1","text":"hi","sender":"assistant","timestamp":"t","sentiment":"negative"}"#;
        let message: Message = serde_json::from_str(json).unwrap();
        assert_eq!(message.sender, Sender::Assistant);
        assert_eq!(message.sentiment, Some(Sentiment::Negative));
    }

    #[test]
    fn test_constructors_assign_unique_ids() {
        let first = Message::user_text("one");
        let second = Message::user_text("two");
        assert_ne!(first.id, second.id);
        assert!(first.is_user());
    }

    #[test]
    fn test_user_voice_message_carries_clip() {
        let clip = AudioClip::new(vec![1, 2, 3], AudioFormat::Webm);
        let message = Message::user_voice(clip.clone(), ResponseFormat::Voice);

        assert!(message.is_voice);
        assert_eq!(message.text, VOICE_PLACEHOLDER_TEXT);
        assert_eq!(message.audio, Some(clip));
        assert_eq!(message.response_format, ResponseFormat::Voice);
    }

    #[test]
    fn test_audio_is_not_serialized() {
        let clip = AudioClip::new(vec![9; 16], AudioFormat::Mp3);
        let message = Message::assistant_voice("hello", Some(Sentiment::Neutral), Some(clip));
        let value = serde_json::to_value(&message).unwrap();

        assert!(value.get("audio").is_none());
        assert_eq!(value["sender"], "ai");
        assert_eq!(value["responseFormat"], "voice");
        assert_eq!(value["sentiment"], "NEUTRAL");
    }
}
