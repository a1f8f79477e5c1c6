//! # Broker connection boundary.
//!
//! The pipeline talks to the event bus client through two traits:
//!
//! - [`Broker`]: a connection factory (`connect`).
//! - [`Connection`]: an established subscription that drains the broker
//!   stream into registered [`Handlers`] until it ends or fails.
//!
//! The pump registers a single wildcard (`"*"`) handler; pattern matching
//! exists so a connection implementation can route typed streams without
//! re-parsing, but the pipeline itself never relies on anything finer.
//!
//! ## Contract
//! - `connect()` fails with [`BrokerError::Connect`].
//! - `receive()` blocks (cooperatively) until the stream ends cleanly
//!   (`Ok(())`) or fails with [`BrokerError::Stream`].
//! - Retrying is **not** the connection's job; the pump owns the bounded
//!   retry budget.

use async_trait::async_trait;

use crate::error::BrokerError;
use crate::events::RawEvent;

/// Callback invoked for each event matching a handler pattern.
pub type EventHandler<'h> = Box<dyn FnMut(RawEvent) + Send + 'h>;

/// Ordered set of `(pattern, callback)` registrations.
///
/// Patterns are matched against the raw `type` field, first match wins:
/// - `"*"` matches every event (including those without a `type`)
/// - a trailing `*` matches by prefix (`"task-*"`)
/// - anything else matches exactly
pub struct Handlers<'h> {
    entries: Vec<(String, EventHandler<'h>)>,
}

impl<'h> Handlers<'h> {
    /// Creates an empty handler set.
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Registers a callback for a pattern (builder style).
    pub fn on(mut self, pattern: impl Into<String>, handler: impl FnMut(RawEvent) + Send + 'h) -> Self {
        self.entries.push((pattern.into(), Box::new(handler)));
        self
    }

    /// Routes one event to the first matching handler.
    ///
    /// Events matching no pattern are dropped; with the pump's single `"*"`
    /// registration that never happens.
    pub fn dispatch(&mut self, event: RawEvent) {
        let ty = event.get_str("type").unwrap_or_default().to_string();
        for (pattern, handler) in &mut self.entries {
            if pattern_matches(pattern, &ty) {
                handler(event);
                return;
            }
        }
    }

    /// True if no handlers are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Handlers<'_> {
    fn default() -> Self {
        Self::new()
    }
}

fn pattern_matches(pattern: &str, event_type: &str) -> bool {
    if pattern == "*" {
        return true;
    }
    match pattern.strip_suffix('*') {
        Some(prefix) => event_type.starts_with(prefix),
        None => pattern == event_type,
    }
}

/// An established broker subscription.
#[async_trait]
pub trait Connection: Send {
    /// Drains the raw event stream, invoking handlers per event.
    ///
    /// Returns `Ok(())` when the stream ends cleanly; the caller decides
    /// whether to resubscribe.
    ///
    /// ### Errors
    /// [`BrokerError::Stream`] when the stream fails mid-flight.
    async fn receive(&mut self, handlers: &mut Handlers<'_>) -> Result<(), BrokerError>;
}

/// Factory for broker connections.
///
/// Implementations wrap a concrete broker client (AMQP, Redis, an in-memory
/// script in tests) and are owned by the pump for the process lifetime.
#[async_trait]
pub trait Broker: Send + Sync + 'static {
    /// The connection type this broker produces.
    type Conn: Connection + 'static;

    /// Establishes a connection to the event bus.
    ///
    /// ### Errors
    /// [`BrokerError::Connect`] when the broker is unreachable.
    async fn connect(&self) -> Result<Self::Conn, BrokerError>;
}
