//! # Raw broker events.
//!
//! [`RawEvent`] is the broker-native, loosely-typed event record: an open
//! mapping from string keys to heterogeneous JSON values. The only structural
//! invariant enforced here is the `type` field: it must be present and split
//! into exactly two dash-delimited tokens (`"<domain>-<action>"`, domain one
//! of `task`/`worker`). Absence or a malformed `type` is an error condition,
//! never a silently-dropped event.
//!
//! ## Rules
//! - Accessors come in two flavors: infallible `get_*` (used by filters and
//!   best-effort state folding) and fallible `event_type`/`kind` (used by the
//!   translator, where a violation is a protocol break).
//! - The mapping is kept open: fields the pipeline does not know about are
//!   carried along untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::RelayError;

/// Event domain, the first token of the raw `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Domain {
    /// Task lifecycle events (`task-*`).
    Task,
    /// Worker lifecycle events (`worker-*`).
    Worker,
}

/// Broker-native event record: an open string-keyed mapping.
///
/// Wraps a [`serde_json::Map`] transparently, so any JSON object deserializes
/// into a `RawEvent` and serializes back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawEvent(Map<String, Value>);

impl RawEvent {
    /// Wraps an existing JSON object map.
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Raw field access.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// String field access (None if absent or not a string).
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Unsigned integer field access (None if absent or not representable).
    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.0.get(key).and_then(Value::as_u64)
    }

    /// Float field access; integers are widened (None if absent or non-numeric).
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.0.get(key).and_then(Value::as_f64)
    }

    /// Returns the raw `type` field.
    ///
    /// ### Errors
    /// [`RelayError::MalformedEvent`] if the field is absent or not a string.
    pub fn event_type(&self) -> Result<&str, RelayError> {
        self.get_str("type").ok_or_else(|| RelayError::MalformedEvent {
            detail: "missing or non-string `type` field".to_string(),
        })
    }

    /// Splits the `type` field into its `(domain, action-token)` pair.
    ///
    /// The type must consist of exactly two dash-delimited tokens; the domain
    /// must be `task` or `worker`.
    ///
    /// ### Errors
    /// - [`RelayError::MalformedEvent`] if `type` is absent, empty on either
    ///   side of the dash, or has more than two tokens.
    /// - [`RelayError::UnrecognizedEvent`] if the domain is neither `task`
    ///   nor `worker` (a broker protocol change, fatal by design).
    pub fn kind(&self) -> Result<(Domain, &str), RelayError> {
        let ty = self.event_type()?;
        let (domain, token) = ty.split_once('-').ok_or_else(|| RelayError::MalformedEvent {
            detail: format!("event type `{ty}` is not dash-delimited"),
        })?;
        if domain.is_empty() || token.is_empty() || token.contains('-') {
            return Err(RelayError::MalformedEvent {
                detail: format!("event type `{ty}` does not split into exactly two tokens"),
            });
        }
        match domain {
            "task" => Ok((Domain::Task, token)),
            "worker" => Ok((Domain::Worker, token)),
            _ => Err(RelayError::UnrecognizedEvent {
                event_type: ty.to_string(),
            }),
        }
    }
}

impl From<Map<String, Value>> for RawEvent {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}
