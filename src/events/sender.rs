//! # Outbound fan-out sender.
//!
//! [`Sender`] is a thin wrapper around [`tokio::sync::broadcast`] that
//! broadcasts every published [`NormalizedEvent`] to all currently-subscribed
//! clients, fire-and-forget, with no per-client acknowledgment. It is the
//! boundary to the transport layer: the transport subscribes here and writes
//! the events to its sockets.
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never blocks or suspends.
//! - **Bounded capacity**: a single ring buffer stores recent events for all
//!   receivers.
//! - **Slow-subscriber policy**: receivers that lag behind more than the
//!   channel capacity observe `RecvError::Lagged(n)` and skip the `n` oldest
//!   items; the publisher is never starved by a slow subscriber.
//! - **No persistence**: events are lost if there are no active subscribers
//!   at send time.

use tokio::sync::broadcast;

use super::normalized::NormalizedEvent;

/// Broadcast channel for normalized events.
///
/// Cheap to clone (internally holds an `Arc`-backed sender); clones publish
/// into the same channel.
#[derive(Clone, Debug)]
pub struct Sender {
    tx: broadcast::Sender<NormalizedEvent>,
}

impl Sender {
    /// Creates a new sender with the given channel capacity.
    ///
    /// Capacity is shared across all receivers and clamped to a minimum of 1.
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to all active subscribers.
    ///
    /// If there are no receivers the event is dropped; this function still
    /// returns immediately.
    pub fn publish(&self, event: NormalizedEvent) {
        let _ = self.tx.send(event);
    }

    /// Publishes a borrowed event by cloning it.
    pub fn publish_ref(&self, event: &NormalizedEvent) {
        let _ = self.tx.send(event.clone());
    }

    /// Creates a new receiver observing subsequent events.
    ///
    /// Each call creates an independent receiver that only sees events sent
    /// after it subscribed.
    pub fn subscribe(&self) -> broadcast::Receiver<NormalizedEvent> {
        self.tx.subscribe()
    }

    /// Number of currently attached receivers.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
