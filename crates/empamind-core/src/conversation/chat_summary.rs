//! Sidebar entries for stored conversations.

use serde::{Deserialize, Serialize};

/// Lightweight metadata for one conversation, as listed by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSummary {
    pub chat_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Time of the latest message (ISO 8601 format).
    #[serde(default)]
    pub last_message_time: String,
    /// Time the conversation was created (ISO 8601 format).
    #[serde(default)]
    pub created_at: String,
}

impl ChatSummary {
    /// The label to show in a list; falls back to the chat id.
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .map(str::trim)
            .filter(|title| !title.is_empty())
            .unwrap_or(&self.chat_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserializes_list_chats_entry() {
        let json = r#"{
            "chatId": "a1b2",
            "title": "Need support",
            "lastMessageTime": "2024-05-02T10:00:00Z",
            "createdAt": "2024-05-01T09:00:00Z"
        }"#;
        let summary: ChatSummary = serde_json::from_str(json).unwrap();
        assert_eq!(summary.chat_id, "a1b2");
        assert_eq!(summary.display_title(), "Need support");
    }

    #[test]
    fn test_display_title_falls_back_to_id() {
        let summary = ChatSummary {
            chat_id: "a1b2".to_string(),
            title: Some("  ".to_string()),
            last_message_time: String::new(),
            created_at: String::new(),
        };
        assert_eq!(summary.display_title(), "a1b2");
    }
}
