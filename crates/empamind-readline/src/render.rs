//! Terminal rendering of store state.

use colored::Colorize;
use empamind_application::StoreEvent;
use empamind_core::conversation::{ChatSummary, Conversation, Message, Sentiment};
use std::collections::{HashMap, HashSet};
use std::io::Write;
use tokio::sync::mpsc::UnboundedReceiver;

fn sentiment_badge(sentiment: Option<Sentiment>) -> String {
    match sentiment {
        Some(Sentiment::Positive) => " (positive)".green().to_string(),
        Some(Sentiment::Negative) => " (negative)".red().to_string(),
        Some(Sentiment::Mixed) => " (mixed)".yellow().to_string(),
        Some(Sentiment::Neutral) | None => String::new(),
    }
}

fn attachment_note(message: &Message) -> Option<String> {
    message.audio.as_ref().filter(|_| message.is_assistant()).map(|audio| {
        format!("[voice reply: {} bytes, {}]", audio.len(), audio.format().mime_type())
    })
}

/// Prints one complete message.
pub fn print_message(message: &Message) {
    if message.is_user() {
        println!("{}", format!("> {}", message.text).green());
        return;
    }
    println!(
        "{}{}{}",
        "EmpaMind: ".bright_magenta(),
        message.text.bright_blue(),
        sentiment_badge(message.sentiment)
    );
    if let Some(note) = attachment_note(message) {
        println!("  {}", note.bright_black());
    }
}

pub fn print_conversation(conversation: &Conversation) {
    for message in &conversation.messages {
        print_message(message);
    }
    if let Some(error) = &conversation.error {
        println!("{}", error.red());
    }
}

pub fn print_chat_list(chats: &[ChatSummary], current: Option<&str>) {
    if chats.is_empty() {
        println!("{}", "No chats yet.".bright_black());
        return;
    }
    for chat in chats {
        let marker = if Some(chat.chat_id.as_str()) == current { "*" } else { " " };
        println!(
            "{} {}  {}",
            marker,
            chat.chat_id.bright_black(),
            chat.display_title()
        );
    }
}

/// What to print for one `MessageUpdated` event.
#[derive(Debug, PartialEq)]
enum UpdateOutput {
    /// New characters of a streaming reply; `finished` ends the line.
    Delta { text: String, finished: bool },
    /// Transcript that replaced a voice placeholder.
    Transcript(String),
    Ignored,
}

/// Tracks replies being printed and voice messages awaiting a transcript.
///
/// Entries are dropped as soon as their message stops changing.
#[derive(Debug, Default)]
struct ReplyTracker {
    /// Characters printed so far, per streaming reply.
    printed: HashMap<String, usize>,
    awaiting_transcript: HashSet<String>,
}

impl ReplyTracker {
    fn start_reply(&mut self, message_id: &str) {
        self.printed.insert(message_id.to_string(), 0);
    }

    fn expect_transcript(&mut self, message_id: &str) {
        self.awaiting_transcript.insert(message_id.to_string());
    }

    fn update(&mut self, message_id: &str, text: &str, is_streaming: bool) -> UpdateOutput {
        if self.awaiting_transcript.remove(message_id) {
            return UpdateOutput::Transcript(text.to_string());
        }
        let Some(printed) = self.printed.get_mut(message_id) else {
            return UpdateOutput::Ignored;
        };
        let delta: String = text.chars().skip(*printed).collect();
        *printed += delta.chars().count();
        if !is_streaming {
            self.printed.remove(message_id);
        }
        UpdateOutput::Delta {
            text: delta,
            finished: !is_streaming,
        }
    }

    fn forget(&mut self, message_id: &str) {
        self.printed.remove(message_id);
        self.awaiting_transcript.remove(message_id);
    }

    /// Drops everything. Returns how many replies were cut off mid-line.
    fn reset(&mut self) -> usize {
        let unfinished = self.printed.len();
        self.printed.clear();
        self.awaiting_transcript.clear();
        unfinished
    }
}

/// Consumes store events and prints streaming replies as they grow.
pub async fn run(mut events: UnboundedReceiver<StoreEvent>) {
    let mut tracker = ReplyTracker::default();

    while let Some(event) = events.recv().await {
        match event {
            StoreEvent::MessageAppended(message) if message.is_assistant() => {
                if message.is_streaming {
                    print!("{}", "EmpaMind: ".bright_magenta());
                    flush();
                    tracker.start_reply(&message.id);
                } else {
                    print_message(&message);
                }
            }
            StoreEvent::MessageAppended(message) if message.is_voice => {
                tracker.expect_transcript(&message.id);
            }
            StoreEvent::MessageUpdated {
                message_id,
                text,
                is_streaming,
            } => match tracker.update(&message_id, &text, is_streaming) {
                UpdateOutput::Delta { text, finished } => {
                    print!("{}", text.bright_blue());
                    if finished {
                        println!();
                    }
                    flush();
                }
                UpdateOutput::Transcript(text) => {
                    println!("{}", format!("  heard: \"{text}\"").bright_black());
                }
                UpdateOutput::Ignored => {}
            },
            StoreEvent::MessageRemoved { message_id } => tracker.forget(&message_id),
            StoreEvent::ErrorChanged(Some(error)) => {
                println!("{}", error.red());
            }
            StoreEvent::LoadingChanged(true) => {
                println!("{}", "EmpaMind is typing...".bright_black());
            }
            StoreEvent::ChatIdAssigned { chat_id } => {
                tracing::debug!("[Render] Chat id {}", chat_id);
            }
            StoreEvent::ConversationReset { .. } => {
                for _ in 0..tracker.reset() {
                    println!();
                }
            }
            _ => {}
        }
    }
}

fn flush() {
    let _ = std::io::stdout().flush();
}
