//! Error types used by the taskwire pipeline.
//!
//! This module defines two main error enums:
//!
//! - [`BrokerError`]: transient failures on the broker boundary (connect/stream).
//! - [`RelayError`]: errors raised by the pipeline itself (retry budget
//!   exhausted, protocol breaks detected by the translator).
//!
//! Both types provide `as_label` helpers for logging/metrics. The split matters
//! for retry semantics: every [`BrokerError`] is retryable against the pump's
//! fixed attempt budget, while a [`RelayError`] is terminal for the pipeline
//! (with the single documented exception of [`RelayError::UnknownWorkerKind`],
//! which the runner logs and skips).

use thiserror::Error;

/// # Errors produced at the broker boundary.
///
/// These are connectivity errors: transient by definition, retried by the
/// pump up to its fixed attempt budget, then escalated as
/// [`RelayError::TooManyRetries`].
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum BrokerError {
    /// Establishing a connection to the broker failed.
    #[error("broker connect failed: {message}")]
    Connect {
        /// The underlying error message from the broker client.
        message: String,
    },

    /// An established event stream ended with an error.
    #[error("event stream failed: {message}")]
    Stream {
        /// The underlying error message from the broker client.
        message: String,
    },
}

impl BrokerError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            BrokerError::Connect { .. } => "broker_connect",
            BrokerError::Stream { .. } => "broker_stream",
        }
    }

    /// Indicates whether the error is safe to retry.
    ///
    /// Connectivity errors are always retryable; the pump decides when the
    /// consecutive-failure budget is spent.
    pub fn is_retryable(&self) -> bool {
        true
    }
}

/// # Errors produced by the relay pipeline.
///
/// These represent either an exhausted broker retry budget or a protocol
/// break: an event whose `type` is malformed or that the translator does not
/// recognize. Protocol breaks are deliberately fatal (not silently dropped)
/// because they signal a broker contract change the pipeline does not
/// understand.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RelayError {
    /// The pump saw too many consecutive broker failures and gave up.
    #[error("too many broker attempts ({attempts} consecutive failures): {last}")]
    TooManyRetries {
        /// Number of consecutive failures observed when escalating.
        attempts: u32,
        /// Message of the last broker error.
        last: String,
    },

    /// Event type belongs to no known `(domain, action)` pair.
    #[error("unrecognized event type `{event_type}`")]
    UnrecognizedEvent {
        /// The offending raw `type` value.
        event_type: String,
    },

    /// Worker event with an unmatched sub-type (e.g. `worker-lost`).
    ///
    /// Unlike [`RelayError::UnrecognizedEvent`], this is skippable: the worker
    /// domain is known, only the sub-type is not, so the runner logs the event
    /// and moves on.
    #[error("unmatched worker event `{event_type}`")]
    UnknownWorkerKind {
        /// The offending raw `type` value.
        event_type: String,
    },

    /// Event violates a structural invariant (missing `type`, bad token
    /// count, missing identifying field).
    #[error("malformed event: {detail}")]
    MalformedEvent {
        /// Human-readable description of the violation.
        detail: String,
    },
}

impl RelayError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RelayError::TooManyRetries { .. } => "relay_too_many_retries",
            RelayError::UnrecognizedEvent { .. } => "relay_unrecognized_event",
            RelayError::UnknownWorkerKind { .. } => "relay_unknown_worker_kind",
            RelayError::MalformedEvent { .. } => "relay_malformed_event",
        }
    }

    /// True if the runner may log this error and continue with the next event.
    ///
    /// Only [`RelayError::UnknownWorkerKind`] qualifies; everything else stops
    /// the pipeline.
    pub fn is_skippable(&self) -> bool {
        matches!(self, RelayError::UnknownWorkerKind { .. })
    }
}
