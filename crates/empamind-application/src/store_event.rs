//! Change notifications published by the conversation store.

use empamind_core::conversation::{ChatSummary, Message};
use std::sync::Mutex;
use tokio::sync::mpsc;

/// One observable change to store state.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    MessageAppended(Message),
    /// Text or streaming flag of an existing message changed.
    MessageUpdated {
        message_id: String,
        text: String,
        is_streaming: bool,
    },
    MessageRemoved {
        message_id: String,
    },
    ChatIdAssigned {
        chat_id: String,
    },
    LoadingChanged(bool),
    ErrorChanged(Option<String>),
    /// The active conversation was replaced (new chat, select, delete, clear).
    ConversationReset {
        chat_id: Option<String>,
    },
    /// Fetched history replaced the message list.
    HistoryLoaded {
        chat_id: String,
        message_count: usize,
    },
    ChatListRefreshed(Vec<ChatSummary>),
}

/// Fan-out of [`StoreEvent`]s to any number of subscribers.
///
/// Subscribers whose receiver was dropped are pruned on the next publish.
#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Mutex<Vec<mpsc::UnboundedSender<StoreEvent>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<StoreEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.push(tx);
        }
        rx
    }

    pub fn publish(&self, event: StoreEvent) {
        let Ok(mut subscribers) = self.subscribers.lock() else {
            return;
        };
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().map(|s| s.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_reaches_every_subscriber() {
        let bus = EventBus::new();
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();

        bus.publish(StoreEvent::LoadingChanged(true));

        assert_eq!(a.try_recv().unwrap(), StoreEvent::LoadingChanged(true));
        assert_eq!(b.try_recv().unwrap(), StoreEvent::LoadingChanged(true));
    }

    #[test]
    fn test_dropped_subscribers_are_pruned() {
        let bus = EventBus::new();
        let kept = bus.subscribe();
        drop(bus.subscribe());

        bus.publish(StoreEvent::ErrorChanged(None));

        assert_eq!(bus.subscriber_count(), 1);
        drop(kept);
    }
}
