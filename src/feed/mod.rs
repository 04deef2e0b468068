//! The single broadcast room every live viewer belongs to.
//!
//! Delivery is fire-and-forget: a subscriber that lags past the channel
//! capacity or disconnects mid-publish just misses events and converges
//! on its next full fetch. Events from one mutation reach all
//! subscribers in publish order.

mod events;
pub mod ws;

pub use events::{FeedEvent, ImpressionDelta, VoteDelta};

use tokio::sync::broadcast;

#[derive(Clone)]
pub struct Feed {
    tx: broadcast::Sender<FeedEvent>,
}

impl Feed {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Feed { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FeedEvent> {
        self.tx.subscribe()
    }

    /// Best-effort publish; an empty room is not an error.
    pub fn publish(&self, event: FeedEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
