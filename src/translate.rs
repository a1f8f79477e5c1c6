//! # Raw-to-normalized event translation.
//!
//! [`translate`] maps a loosely-typed [`RawEvent`] into one of the small set
//! of normalized wire actions via an exhaustive match on the event's
//! `(domain, action-token)` pair:
//!
//! | raw type | action |
//! |---|---|
//! | `task-received` | `LOAD_TASK` |
//! | `task-started` | `UPDATE_TASK` |
//! | `task-succeeded`, `task-failed` | `COMPLETE_TASK` |
//! | `worker-online` | `BRING_WORKER_ONLINE` |
//! | `worker-heartbeat` | `UPDATE_WORKER` |
//! | `worker-offline` | `TAKE_WORKER_OFFLINE` |
//!
//! ## Rules
//! - Pure and total over the documented shapes; partial (errors) otherwise.
//!   There is no default fallthrough: an unmatched pair is a hard error,
//!   because it signals a broker protocol change the pipeline does not
//!   understand.
//! - One uniform skip policy: an unmatched **worker** sub-type yields
//!   [`RelayError::UnknownWorkerKind`] (the runner logs and skips it); an
//!   unmatched **task** sub-type or unknown domain is fatal
//!   [`RelayError::UnrecognizedEvent`].
//! - `worker_id` is always derived from `hostname` and `pid`, never read from
//!   an explicit field.

use crate::error::RelayError;
use crate::events::{
    make_worker_id, Action, Domain, NormalizedEvent, Payload, RawEvent, TaskPayload, TaskState,
    WorkerPayload, WorkerStatus,
};

/// Translates one raw event into its normalized form.
///
/// ### Errors
/// - [`RelayError::MalformedEvent`]: missing/malformed `type`, or a required
///   identifying field (`uuid`, `hostname`, `pid`, `timestamp`) is absent.
/// - [`RelayError::UnrecognizedEvent`]: unknown domain or unmatched task
///   sub-type (fatal to the pipeline).
/// - [`RelayError::UnknownWorkerKind`]: unmatched worker sub-type (skippable).
pub fn translate(event: &RawEvent) -> Result<NormalizedEvent, RelayError> {
    let (domain, token) = event.kind()?;
    let ty = event.event_type()?;

    match domain {
        Domain::Task => translate_task(event, ty, token),
        Domain::Worker => translate_worker(event, ty, token),
    }
}

fn translate_task(event: &RawEvent, ty: &str, token: &str) -> Result<NormalizedEvent, RelayError> {
    // Recognize the sub-type before validating fields, so an unknown pair is
    // reported as the protocol break it is, not as a missing field.
    let (action, state) = match token {
        "received" => (Action::LoadTask, TaskState::Received),
        "started" => (Action::UpdateTask, TaskState::Started),
        "succeeded" => (Action::CompleteTask, TaskState::Success),
        "failed" => (Action::CompleteTask, TaskState::Failure),
        _ => {
            return Err(RelayError::UnrecognizedEvent {
                event_type: ty.to_string(),
            })
        }
    };

    let timestamp = require_f64(event, "timestamp", ty)?;
    let worker_id = derive_worker_id(event, ty)?;
    let uuid = require_str(event, "uuid", ty)?;

    let mut payload = TaskPayload::new(uuid, state, worker_id);
    payload.retries = event.get_u64("retries");
    match action {
        Action::LoadTask => {
            payload.name = event.get_str("name").map(str::to_string);
            payload.args = event.get_str("args").map(str::to_string);
            payload.kwargs = event.get_str("kwargs").map(str::to_string);
            payload.eta = event.get_str("eta").map(str::to_string);
            payload.expires = event.get_str("expires").map(str::to_string);
            payload.parent_id = event.get_str("parent_id").map(str::to_string);
            payload.root_id = event.get_str("root_id").map(str::to_string);
        }
        Action::CompleteTask => {
            payload.result = event.get("result").cloned();
            payload.runtime = event.get_f64("runtime");
        }
        _ => {}
    }

    Ok(NormalizedEvent::new(action, ty, timestamp, Payload::Task(payload)))
}

fn translate_worker(event: &RawEvent, ty: &str, token: &str) -> Result<NormalizedEvent, RelayError> {
    // Unmatched worker sub-types are the one skippable case; report them
    // before field validation so sparse events stay skippable too.
    let (action, status) = match token {
        "online" => (Action::BringWorkerOnline, WorkerStatus::Online),
        "heartbeat" => (Action::UpdateWorker, WorkerStatus::Online),
        "offline" => (Action::TakeWorkerOffline, WorkerStatus::Offline),
        _ => {
            return Err(RelayError::UnknownWorkerKind {
                event_type: ty.to_string(),
            })
        }
    };

    let timestamp = require_f64(event, "timestamp", ty)?;
    let worker_id = derive_worker_id(event, ty)?;
    let hostname = require_str(event, "hostname", ty)?;

    let mut payload = WorkerPayload::new(worker_id, hostname, status);
    if action == Action::UpdateWorker {
        payload.active = event.get_u64("active");
        payload.processed = event.get_u64("processed");
        payload.loadavg = event.get("loadavg").and_then(|v| {
            v.as_array()
                .map(|xs| xs.iter().filter_map(serde_json::Value::as_f64).collect())
        });
    }

    Ok(NormalizedEvent::new(action, ty, timestamp, Payload::Worker(payload)))
}

fn derive_worker_id(event: &RawEvent, ty: &str) -> Result<String, RelayError> {
    let hostname = require_str(event, "hostname", ty)?;
    let pid = event.get_u64("pid").ok_or_else(|| RelayError::MalformedEvent {
        detail: format!("missing numeric `pid` on `{ty}` event"),
    })?;
    Ok(make_worker_id(hostname, pid))
}

fn require_str<'a>(event: &'a RawEvent, field: &str, ty: &str) -> Result<&'a str, RelayError> {
    event.get_str(field).ok_or_else(|| RelayError::MalformedEvent {
        detail: format!("missing string `{field}` on `{ty}` event"),
    })
}

fn require_f64(event: &RawEvent, field: &str, ty: &str) -> Result<f64, RelayError> {
    event.get_f64(field).ok_or_else(|| RelayError::MalformedEvent {
        detail: format!("missing numeric `{field}` on `{ty}` event"),
    })
}
