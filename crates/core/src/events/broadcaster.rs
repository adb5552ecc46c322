//! Bounded broadcast channel for crawl events.

use tokio::sync::broadcast;

use super::CrawlEvent;
use crate::constants::PROGRESS_CHANNEL_CAPACITY;

/// Fan-out sender for [`CrawlEvent`]s.
///
/// Wraps a bounded `tokio::sync::broadcast` channel. Publishing is fire and
/// forget: with no subscribers the event is dropped, and a subscriber that
/// falls more than the channel capacity behind observes
/// `RecvError::Lagged(n)` on its next receive, then continues from the
/// oldest retained event. The producer never waits either way.
#[derive(Clone)]
pub struct EventBroadcaster {
    sender: broadcast::Sender<CrawlEvent>,
}

impl EventBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// New receiver starting at the current stream position.
    pub fn subscribe(&self) -> broadcast::Receiver<CrawlEvent> {
        self.sender.subscribe()
    }

    /// Publishes an event to all current subscribers.
    pub fn publish(&self, event: CrawlEvent) {
        // Err here only means nobody is listening right now.
        let _ = self.sender.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new(PROGRESS_CHANNEL_CAPACITY)
    }
}
