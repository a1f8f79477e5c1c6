//! # Aggregate broker-state cache.
//!
//! [`PumpState`] is the process-local, last-known view of worker and task
//! status, updated as a side effect of event consumption. It exists for
//! liveness introspection; it is never emitted downstream.
//!
//! ## Rules
//! - Mutation happens **only** on the pump's producer side ([`PumpState::apply`]
//!   is `pub(crate)`); callers get read-only snapshots.
//! - Folding is last-writer-wins per entity key and idempotent.
//! - Folding is best-effort: a malformed event is ignored here, because
//!   failing the pump over state bookkeeping would lose events. Strict
//!   validation is the translator's job.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::events::{make_worker_id, RawEvent};

/// Last-known status of one worker.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerInfo {
    /// Broker-reported hostname.
    pub hostname: String,
    /// False once a `worker-offline` event was folded.
    pub online: bool,
    /// Timestamp of the newest folded event for this worker.
    pub last_seen: f64,
    /// Currently executing tasks, from the last heartbeat.
    pub active: Option<u64>,
    /// Tasks processed so far, from the last heartbeat.
    pub processed: Option<u64>,
}

/// Last-known status of one task.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskInfo {
    /// Raw type of the newest folded event for this task.
    pub last_type: String,
    /// Timestamp of the newest folded event for this task.
    pub last_seen: f64,
    /// Derived worker identity, when the event carried hostname and pid.
    pub worker: Option<String>,
}

#[derive(Default)]
struct Inner {
    workers: HashMap<String, WorkerInfo>,
    tasks: HashMap<String, TaskInfo>,
}

/// Thread-safe aggregate of last-known worker/task status.
///
/// Exclusively mutated by the pump's producer task; exposed to callers as
/// cloned snapshots so reads never observe a partially-applied update.
pub struct PumpState {
    inner: RwLock<Inner>,
}

impl PumpState {
    /// Creates an empty state cache.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Folds one raw event into the cache (last-writer-wins).
    pub(crate) fn apply(&self, event: &RawEvent) {
        let Some(ty) = event.get_str("type") else {
            return;
        };
        let timestamp = event.get_f64("timestamp").unwrap_or(0.0);

        if ty.starts_with("worker-") {
            let Some(hostname) = event.get_str("hostname") else {
                return;
            };
            let key = match event.get_u64("pid") {
                Some(pid) => make_worker_id(hostname, pid),
                None => hostname.to_string(),
            };
            let mut inner = self.inner.write();
            let info = inner.workers.entry(key).or_insert_with(|| WorkerInfo {
                hostname: hostname.to_string(),
                online: false,
                last_seen: 0.0,
                active: None,
                processed: None,
            });
            info.online = ty != "worker-offline";
            info.last_seen = timestamp;
            if ty == "worker-heartbeat" {
                info.active = event.get_u64("active").or(info.active);
                info.processed = event.get_u64("processed").or(info.processed);
            }
        } else if ty.starts_with("task-") {
            let Some(uuid) = event.get_str("uuid") else {
                return;
            };
            let worker = match (event.get_str("hostname"), event.get_u64("pid")) {
                (Some(hostname), Some(pid)) => Some(make_worker_id(hostname, pid)),
                _ => None,
            };
            let mut inner = self.inner.write();
            inner.tasks.insert(
                uuid.to_string(),
                TaskInfo {
                    last_type: ty.to_string(),
                    last_seen: timestamp,
                    worker,
                },
            );
        }
    }

    /// Snapshot of all known workers, keyed by derived worker identity.
    pub fn workers(&self) -> HashMap<String, WorkerInfo> {
        self.inner.read().workers.clone()
    }

    /// Snapshot of all known tasks, keyed by uuid.
    pub fn tasks(&self) -> HashMap<String, TaskInfo> {
        self.inner.read().tasks.clone()
    }

    /// True if the worker's newest folded event was not `worker-offline`.
    pub fn is_worker_online(&self, id: &str) -> bool {
        self.inner
            .read()
            .workers
            .get(id)
            .map(|w| w.online)
            .unwrap_or(false)
    }
}

impl Default for PumpState {
    fn default() -> Self {
        Self::new()
    }
}
