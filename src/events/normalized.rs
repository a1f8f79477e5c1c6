//! # Normalized wire events.
//!
//! [`NormalizedEvent`] is the pipeline-native, stable-schema record sent
//! downstream to subscribers. It is tagged by [`Action`] and carries a payload
//! specific to the action, plus the broker timestamp and a schema version.
//!
//! ## Wire schema (JSON)
//! ```json
//! {
//!   "action": "BRING_WORKER_ONLINE",
//!   "type": "worker-online",
//!   "timestamp": 100.0,
//!   "version": 1,
//!   "payload": { "id": "h1.42", "hostname": "h1", "status": "ONLINE" }
//! }
//! ```
//!
//! ## Rules
//! - Every payload carries the minimal identifying key a consumer needs to
//!   upsert state: the task `uuid` or the worker `id`.
//! - `worker_id` is always derived as `hostname + "." + pid` (see
//!   [`make_worker_id`]), never trusted from an explicit broker field.
//! - Absent optional identifiers (`parent_id`, `root_id`, ...) stay absent on
//!   the wire; they are never coerced into sentinel zero-values.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Version of the wire schema, serialized into every event.
///
/// Bump on any change to the shape of [`NormalizedEvent`] or its payloads so
/// consumers can evolve safely.
pub const SCHEMA_VERSION: u32 = 1;

/// The normalized action a raw event translates into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    /// A task was received by a worker (`task-received`).
    LoadTask,
    /// A task changed state (`task-started`).
    UpdateTask,
    /// A task reached a terminal state (`task-succeeded` / `task-failed`).
    CompleteTask,
    /// A worker joined the cluster (`worker-online`).
    BringWorkerOnline,
    /// A worker reported a heartbeat (`worker-heartbeat`).
    UpdateWorker,
    /// A worker left the cluster (`worker-offline`).
    TakeWorkerOffline,
}

/// Task lifecycle state derived from the event's action token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    Received,
    Started,
    Success,
    Failure,
}

/// Worker liveness status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerStatus {
    Online,
    Offline,
}

/// Payload of a task action.
///
/// `uuid`, `state` and `worker_id` are always present; the remaining fields
/// are populated per action (e.g. `result`/`runtime` only on completion).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskPayload {
    /// Task identity (the upsert key for consumers).
    pub uuid: String,
    /// Derived state, see [`TaskState`].
    pub state: TaskState,
    /// Derived worker identity (`hostname.pid`).
    pub worker_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub args: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kwargs: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eta: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retries: Option<u64>,
    /// Opaque parent task identifier; absent when the task has no parent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// Opaque workflow root identifier; absent when the task is the root.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime: Option<f64>,
}

impl TaskPayload {
    /// Creates a payload with the always-present identifying fields set and
    /// everything else empty.
    pub fn new(uuid: impl Into<String>, state: TaskState, worker_id: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            state,
            worker_id: worker_id.into(),
            name: None,
            args: None,
            kwargs: None,
            eta: None,
            expires: None,
            retries: None,
            parent_id: None,
            root_id: None,
            result: None,
            runtime: None,
        }
    }
}

/// Payload of a worker action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerPayload {
    /// Derived worker identity (`hostname.pid`, the upsert key for consumers).
    pub id: String,
    /// Broker-reported hostname.
    pub hostname: String,
    /// Liveness status.
    pub status: WorkerStatus,
    /// Number of currently executing tasks (heartbeats only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<u64>,
    /// Number of tasks processed so far (heartbeats only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed: Option<u64>,
    /// Host load averages (heartbeats only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loadavg: Option<Vec<f64>>,
}

impl WorkerPayload {
    /// Creates a payload with identity and status set and gauges empty.
    pub fn new(id: impl Into<String>, hostname: impl Into<String>, status: WorkerStatus) -> Self {
        Self {
            id: id.into(),
            hostname: hostname.into(),
            status,
            active: None,
            processed: None,
            loadavg: None,
        }
    }
}

/// Action-specific payload of a [`NormalizedEvent`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    Task(TaskPayload),
    Worker(WorkerPayload),
}

/// Pipeline-native, stable-schema event record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedEvent {
    /// Normalized action tag.
    pub action: Action,
    /// The raw broker event type this record was translated from.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Broker-reported timestamp (epoch seconds).
    pub timestamp: f64,
    /// Wire schema version, see [`SCHEMA_VERSION`].
    pub version: u32,
    /// Action-specific payload.
    pub payload: Payload,
}

impl NormalizedEvent {
    /// Creates a new event at the current schema version.
    pub fn new(action: Action, event_type: impl Into<String>, timestamp: f64, payload: Payload) -> Self {
        Self {
            action,
            event_type: event_type.into(),
            timestamp,
            version: SCHEMA_VERSION,
            payload,
        }
    }
}

/// Derives the globally consistent worker identity as `hostname + "." + pid`.
///
/// Always derived, never read from an explicit broker field, so worker
/// identity stays stable even if the broker renames or reuses fields.
pub fn make_worker_id(hostname: &str, pid: u64) -> String {
    format!("{hostname}.{pid}")
}
