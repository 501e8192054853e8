//! Change feed core
//!
//! A broadcast channel carrying row-mutation events from the storage layer
//! to any number of subscribers. Publishing never blocks and never fails:
//! with no subscribers the event is simply dropped.

use shared::sync::ChangeEvent;
use tokio::sync::broadcast;

/// Default capacity of the change broadcast channel
const DEFAULT_CAPACITY: usize = 1024;

/// Broadcast feed of order-data mutations
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish a mutation event to all current subscribers
    pub fn publish(&self, event: ChangeEvent) {
        let _ = self.tx.send(event);
    }

    /// Subscribe to raw change events
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }

    /// Number of live subscribers (used by tests and diagnostics)
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
