//! Event data model and outbound fan-out.
//!
//! This module groups the two event representations crossing the pipeline and
//! the broadcast primitive feeding subscribers:
//!
//! - [`RawEvent`]: broker-native, loosely-typed record (open JSON mapping)
//! - [`NormalizedEvent`]: pipeline-native, stable-schema record, tagged by
//!   [`Action`] and carrying a typed payload
//! - [`Sender`]: thin wrapper over `tokio::sync::broadcast` that fans each
//!   normalized event out to all current subscribers
//!
//! The translator (see [`crate::translate`]) is the only place where a
//! `RawEvent` becomes a `NormalizedEvent`.

mod normalized;
mod raw;
mod sender;

pub use normalized::{
    make_worker_id, Action, NormalizedEvent, Payload, TaskPayload, TaskState, WorkerPayload,
    WorkerStatus, SCHEMA_VERSION,
};
pub use raw::{Domain, RawEvent};
pub use sender::Sender;
