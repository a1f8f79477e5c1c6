//! # EventPump: broker-draining producer.
//!
//! [`EventPump`] owns one broker subscription for the lifetime of the process.
//! Its producer task registers a single wildcard handler that, for every raw
//! event received, (1) folds the event into [`PumpState`] and (2) pushes the
//! event onto the internal buffer. Producer and consumer are decoupled by the
//! buffer; no other shared mutable state crosses the boundary.
//!
//! ## Architecture
//! ```text
//! Broker ──► Connection::receive(handlers{"*"})
//!                       │ per event
//!                       ├─► PumpState::apply()        (producer-side only)
//!                       └─► buffer push               (never fails)
//!                                │
//!                                ▼
//!                    EventPump::next_event()          (consumer side)
//! ```
//!
//! ## Retry policy
//! A fixed-attempt breaker, intentionally not exponential backoff: any
//! connect/receive failure counts against a consecutive-failure budget
//! ([`Config::max_retries`], default 3) and the pump relies on the broker
//! client's own reconnect pacing between attempts. Exceeding the budget
//! escalates as [`RelayError::TooManyRetries`], which terminates the producer.
//! The counter resets to zero after any successful receive cycle; a clean
//! stream end simply resubscribes.
//!
//! ## Cancellation
//! The reference design's "is_pumping" flag is a [`CancellationToken`] checked
//! at each loop iteration and at every suspension point. Cancelling it is the
//! only way to stop the logically infinite event sequence.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::broker::{Broker, Connection, Handlers};
use crate::config::Config;
use crate::error::RelayError;
use crate::events::RawEvent;

use super::state::PumpState;

/// Producer side of the pipeline: drains the broker stream into a buffer.
///
/// The producer runs as an independent tokio task spawned by
/// [`EventPump::spawn`]; this handle is the consumer side. Single-producer /
/// single-consumer is the supported topology.
pub struct EventPump {
    state: Arc<PumpState>,
    buffer: mpsc::UnboundedReceiver<RawEvent>,
    token: CancellationToken,
    producer: JoinHandle<Result<(), RelayError>>,
}

impl EventPump {
    /// Spawns the producer task and returns the consumer handle.
    pub fn spawn<B: Broker>(broker: B, cfg: &Config) -> Self {
        let state = Arc::new(PumpState::new());
        let (tx, buffer) = mpsc::unbounded_channel();
        let token = CancellationToken::new();

        let producer = tokio::spawn(produce(
            broker,
            tx,
            Arc::clone(&state),
            token.clone(),
            cfg.max_retries,
        ));

        Self {
            state,
            buffer,
            token,
            producer,
        }
    }

    /// Pops the next raw event off the buffer, in broker emission order.
    ///
    /// Suspends (cooperatively, no busy-wait) while the buffer is empty.
    /// Returns `None` once the pump is marked inactive or the producer has
    /// exited; use [`EventPump::join`] afterwards to learn why.
    pub async fn next_event(&mut self) -> Option<RawEvent> {
        tokio::select! {
            ev = self.buffer.recv() => ev,
            _ = self.token.cancelled() => None,
        }
    }

    /// Read-only handle to the aggregate broker-state cache.
    pub fn state(&self) -> Arc<PumpState> {
        Arc::clone(&self.state)
    }

    /// True while the producer is alive and not cancelled.
    pub fn is_pumping(&self) -> bool {
        !self.token.is_cancelled() && !self.producer.is_finished()
    }

    /// Clone of the pump's cancellation token.
    pub fn cancellation(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Marks the pump inactive.
    ///
    /// The producer exits at its next suspension point; an in-flight broker
    /// operation is abandoned, not forcibly interrupted.
    pub fn stop(&self) {
        self.token.cancel();
    }

    /// Waits for the producer to exit and surfaces its fatal error, if any.
    pub async fn join(self) -> Result<(), RelayError> {
        match self.producer.await {
            Ok(res) => res,
            Err(e) if e.is_cancelled() => Ok(()),
            Err(e) => std::panic::resume_unwind(e.into_panic()),
        }
    }
}

/// Producer loop: connect, receive, count consecutive failures.
async fn produce<B: Broker>(
    broker: B,
    tx: mpsc::UnboundedSender<RawEvent>,
    state: Arc<PumpState>,
    token: CancellationToken,
    max_retries: u32,
) -> Result<(), RelayError> {
    let mut handlers = Handlers::new().on("*", move |event: RawEvent| {
        debug!(event_type = event.get_str("type").unwrap_or("<none>"), "pushing event");
        state.apply(&event);
        // Unbounded channel: the push itself never fails. A send error only
        // means the consumer handle was dropped, in which case the event has
        // nowhere to go anyway.
        let _ = tx.send(event);
    });

    let mut failures: u32 = 0;
    loop {
        if token.is_cancelled() {
            return Ok(());
        }

        let mut conn = tokio::select! {
            res = broker.connect() => match res {
                Ok(conn) => {
                    info!("broker connection obtained");
                    conn
                }
                Err(e) => {
                    failures += 1;
                    if failures > max_retries {
                        return Err(RelayError::TooManyRetries {
                            attempts: failures,
                            last: e.to_string(),
                        });
                    }
                    warn!(
                        error = %e,
                        label = e.as_label(),
                        remaining = max_retries - failures,
                        "broker connect failed, retrying"
                    );
                    continue;
                }
            },
            _ = token.cancelled() => return Ok(()),
        };

        tokio::select! {
            res = conn.receive(&mut handlers) => match res {
                Ok(()) => {
                    // Clean stream end: reset the budget and resubscribe.
                    failures = 0;
                }
                Err(e) => {
                    failures += 1;
                    if failures > max_retries {
                        return Err(RelayError::TooManyRetries {
                            attempts: failures,
                            last: e.to_string(),
                        });
                    }
                    warn!(
                        error = %e,
                        label = e.as_label(),
                        remaining = max_retries - failures,
                        "receive cycle failed, retrying"
                    );
                }
            },
            _ = token.cancelled() => return Ok(()),
        }
    }
}
