//! Realtime bridge
//!
//! Turns the raw change feed into per-consumer refresh subscriptions. Each
//! subscription runs a forwarding task that filters events by scope and
//! delivers [`Signal`] cues through a small bounded channel; a full buffer
//! already carries a pending cue, so nothing is lost by dropping the extra
//! send. Consumers treat every cue purely as "re-fetch your collection":
//! delivery is at-least-once and unordered across distinct mutations.

use shared::sync::{ChangeEvent, Collection, Signal};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::feed::ChangeFeed;

/// Cues buffered per subscriber before coalescing kicks in
const SIGNAL_BUFFER: usize = 8;

/// What a subscriber is allowed to observe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Operator view: every order
    All,
    /// Customer view: only orders owned by this identity
    Identity(String),
}

impl Scope {
    fn matches(&self, event: &ChangeEvent) -> bool {
        match self {
            Scope::All => true,
            Scope::Identity(id) => event.owner.as_deref() == Some(id.as_str()),
        }
    }
}

/// Scoped refresh subscriptions over a [`ChangeFeed`]
#[derive(Debug, Clone)]
pub struct RealtimeBridge {
    feed: ChangeFeed,
}

impl RealtimeBridge {
    pub fn new(feed: ChangeFeed) -> Self {
        Self { feed }
    }

    /// Subscribe with a scope; the subscription tears its channel down when
    /// closed or dropped.
    pub fn subscribe(&self, scope: Scope) -> Subscription {
        let mut rx = self.feed.subscribe();
        let (tx, out_rx) = mpsc::channel(SIGNAL_BUFFER);
        let token = CancellationToken::new();
        let task_token = token.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = task_token.cancelled() => break,
                    event = rx.recv() => match event {
                        Ok(event) => {
                            if scope.matches(&event) {
                                let _ = tx.try_send(Signal {
                                    collection: event.collection,
                                });
                            }
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            // Missed events still mean "something changed"
                            tracing::debug!(skipped, "Change feed lagged, cueing refresh");
                            let _ = tx.try_send(Signal {
                                collection: Collection::Orders,
                            });
                        }
                        Err(RecvError::Closed) => break,
                    },
                }
            }
        });

        Subscription { rx: out_rx, token }
    }
}

/// One consumer's refresh channel
///
/// Dropping the subscription cancels its forwarding task and releases the
/// underlying broadcast receiver.
#[derive(Debug)]
pub struct Subscription {
    rx: mpsc::Receiver<Signal>,
    token: CancellationToken,
}

impl Subscription {
    /// Wait for the next refresh cue; None once the subscription is closed
    pub async fn recv(&mut self) -> Option<Signal> {
        self.rx.recv().await
    }

    /// Non-blocking poll, for tests and draining
    pub fn try_recv(&mut self) -> Option<Signal> {
        self.rx.try_recv().ok()
    }

    /// Explicit teardown
    pub fn close(&self) {
        self.token.cancel();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::sync::ChangeAction;
    use std::time::Duration;
    use tokio::time::timeout;

    fn order_event(id: &str, owner: Option<&str>) -> ChangeEvent {
        ChangeEvent {
            collection: Collection::Orders,
            action: ChangeAction::Update,
            id: id.to_string(),
            owner: owner.map(|o| o.to_string()),
        }
    }

    async fn recv_soon(sub: &mut Subscription) -> Option<Signal> {
        timeout(Duration::from_millis(200), sub.recv())
            .await
            .ok()
            .flatten()
    }

    #[tokio::test]
    async fn unscoped_subscriber_sees_every_mutation() {
        let feed = ChangeFeed::default();
        let bridge = RealtimeBridge::new(feed.clone());
        let mut sub = bridge.subscribe(Scope::All);

        feed.publish(order_event("o1", Some("x")));
        feed.publish(order_event("o2", None));

        assert!(recv_soon(&mut sub).await.is_some());
        assert!(recv_soon(&mut sub).await.is_some());
    }

    #[tokio::test]
    async fn identity_scope_never_signals_for_foreign_orders() {
        let feed = ChangeFeed::default();
        let bridge = RealtimeBridge::new(feed.clone());
        let mut sub = bridge.subscribe(Scope::Identity("x".to_string()));

        // Mutations owned by another identity, and a guest order
        feed.publish(order_event("o1", Some("y")));
        feed.publish(order_event("o2", None));
        // Then one the subscriber owns
        feed.publish(order_event("o3", Some("x")));

        // Exactly one cue arrives, for the owned mutation
        assert!(recv_soon(&mut sub).await.is_some());
        assert!(recv_soon(&mut sub).await.is_none());
    }

    #[tokio::test]
    async fn full_buffer_coalesces_instead_of_blocking() {
        let feed = ChangeFeed::default();
        let bridge = RealtimeBridge::new(feed.clone());
        let mut sub = bridge.subscribe(Scope::All);

        for i in 0..100 {
            feed.publish(order_event(&format!("o{i}"), Some("x")));
        }

        // The subscriber gets at least one cue; the burst coalesced
        assert!(recv_soon(&mut sub).await.is_some());
        let mut drained = 1;
        while recv_soon(&mut sub).await.is_some() {
            drained += 1;
        }
        assert!(drained <= 100);
    }

    #[tokio::test]
    async fn closed_subscription_releases_its_channel() {
        let feed = ChangeFeed::default();
        let bridge = RealtimeBridge::new(feed.clone());
        let sub = bridge.subscribe(Scope::All);
        assert_eq!(feed.subscriber_count(), 1);

        sub.close();
        drop(sub);
        // Give the forwarding task a beat to observe cancellation
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(feed.subscriber_count(), 0);
    }
}
