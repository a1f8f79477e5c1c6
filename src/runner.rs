//! # Runner: the cooperative consumer loop.
//!
//! The [`Runner`] drives the pipeline's consumer side: it pulls raw events
//! from the [`EventPump`], applies the [`EventFilter`] chain, translates
//! survivors via [`translate`], and publishes the result to the [`Sender`]
//! synchronously before resuming the read loop.
//!
//! ## State machine
//! ```text
//! IDLE ──► PUMPING ──► FILTERING ──► TRANSLATING ──► PUBLISHING ─┐
//!             ▲            │               │                     │
//!             │         rejected        skippable            throttle
//!             │            ▼               ▼                     │
//!             └───────── THROTTLE ◄────────┴─────────────────────┘
//! ```
//!
//! ## Rules
//! - **Ordering**: events reach the sender in exact broker emission order;
//!   filtering drops events but never reorders survivors.
//! - **Throttle**: one fixed cooperative delay ([`Config::throttle`]) is slept
//!   after a publish **and** after a rejection. The publish-side delay is the
//!   primary throttle against overwhelming subscribers; the rejection-side
//!   delay paces the drop path identically.
//! - **Fatality**: `TooManyRetries` from the pump and protocol errors from the
//!   translator surface to the caller; the runner stops publishing once
//!   fatally down so subscribers never see a partial stream. The single
//!   skippable case is an unmatched worker sub-type, which is logged and
//!   dropped.
//! - **Single instance**: the runner never runs concurrently with itself; it
//!   is the only consumer of its pump.

use std::time::Duration;

use tokio::time;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::RelayError;
use crate::events::Sender;
use crate::filter::EventFilter;
use crate::pump::EventPump;
use crate::translate::translate;

/// Pulls from the pump, filters, translates, and publishes.
pub struct Runner {
    filter: EventFilter,
    sender: Sender,
    throttle: Duration,
}

impl Runner {
    /// Creates a runner publishing to `sender` through `filter`.
    pub fn new(sender: Sender, filter: EventFilter, cfg: &Config) -> Self {
        Self {
            filter,
            sender,
            throttle: cfg.throttle,
        }
    }

    /// Consumes the pump until shutdown or a fatal error.
    ///
    /// Returns `Ok(())` when the pump was stopped via its cancellation token.
    ///
    /// ### Errors
    /// - [`RelayError::TooManyRetries`] when the producer exhausted its broker
    ///   retry budget.
    /// - [`RelayError::UnrecognizedEvent`] / [`RelayError::MalformedEvent`]
    ///   when the translator detected a protocol break.
    pub async fn run(&self, mut pump: EventPump) -> Result<(), RelayError> {
        loop {
            let Some(raw) = pump.next_event().await else {
                // Buffer closed: the producer exited. Surface its verdict.
                return pump.join().await;
            };

            match self.filter.decide(&raw) {
                Some(event) => match translate(event) {
                    Ok(normalized) => {
                        debug!(
                            action = ?normalized.action,
                            event_type = %normalized.event_type,
                            "publishing event"
                        );
                        self.sender.publish(normalized);
                    }
                    Err(e) if e.is_skippable() => {
                        warn!(error = %e, label = e.as_label(), "skipping event");
                    }
                    Err(e) => {
                        pump.stop();
                        let _ = pump.join().await;
                        return Err(e);
                    }
                },
                None => {
                    debug!(
                        event_type = raw.get_str("type").unwrap_or("<none>"),
                        "event rejected by filter"
                    );
                }
            }

            time::sleep(self.throttle).await;
        }
    }
}
