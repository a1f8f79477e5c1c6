//! # Composable event filters.
//!
//! [`EventFilter`] is a pure predicate over a single [`RawEvent`], represented
//! as a small tagged variant composed via a list rather than inheritance.
//! Filters decide inclusion/exclusion only; they never mutate or reorder
//! events, so a filtered sequence preserves the broker's FIFO order for
//! surviving events.
//!
//! ## Variants
//! - [`EventFilter::NoFilter`]: identity, always passes.
//! - [`EventFilter::NoHeartbeat`]: rejects `worker-heartbeat` events, passes
//!   everything else.
//! - [`EventFilter::Multi`]: passes only if **all** component filters pass
//!   (logical AND); an empty set passes everything.

use crate::events::RawEvent;

/// Pure, composable predicate over a single raw event.
#[derive(Debug, Clone, PartialEq)]
pub enum EventFilter {
    /// Identity filter; every event passes.
    NoFilter,
    /// Rejects events whose `type` is `worker-heartbeat`.
    NoHeartbeat,
    /// Logical AND over component filters; empty passes everything.
    Multi(Vec<EventFilter>),
}

impl EventFilter {
    /// Decides inclusion of one event.
    ///
    /// Returns the event back on pass, `None` on rejection. Events without a
    /// `type` field pass here; the translator is where their malformation
    /// becomes an error.
    pub fn decide<'a>(&self, event: &'a RawEvent) -> Option<&'a RawEvent> {
        match self {
            EventFilter::NoFilter => Some(event),
            EventFilter::NoHeartbeat => {
                if event.get_str("type") == Some("worker-heartbeat") {
                    None
                } else {
                    Some(event)
                }
            }
            EventFilter::Multi(filters) => filters
                .iter()
                .all(|f| f.decide(event).is_some())
                .then_some(event),
        }
    }
}

impl Default for EventFilter {
    fn default() -> Self {
        EventFilter::NoFilter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(v: serde_json::Value) -> RawEvent {
        serde_json::from_value(v).unwrap()
    }

    fn sequence() -> Vec<RawEvent> {
        vec![
            raw(json!({"type": "task-received", "uuid": "u1"})),
            raw(json!({"type": "worker-online", "hostname": "h1", "pid": 42})),
            raw(json!({"type": "task-succeeded", "uuid": "u1"})),
        ]
    }

    #[test]
    fn test_no_heartbeat_is_identity_on_heartbeat_free_sequences() {
        let events = sequence();
        let surviving: Vec<_> = events
            .iter()
            .filter_map(|e| EventFilter::NoHeartbeat.decide(e))
            .collect();
        assert_eq!(surviving.len(), events.len());
        for (kept, original) in surviving.iter().zip(events.iter()) {
            assert_eq!(*kept, original);
        }
    }

    #[test]
    fn test_no_heartbeat_rejects_heartbeats() {
        let hb = raw(json!({"type": "worker-heartbeat", "hostname": "h1", "pid": 42}));
        assert!(EventFilter::NoHeartbeat.decide(&hb).is_none());

        let online = raw(json!({"type": "worker-online", "hostname": "h1", "pid": 42}));
        assert!(EventFilter::NoHeartbeat.decide(&online).is_some());
    }

    #[test]
    fn test_multi_of_single_no_filter_equals_no_filter() {
        let multi = EventFilter::Multi(vec![EventFilter::NoFilter]);
        for ev in sequence() {
            assert_eq!(
                multi.decide(&ev).is_some(),
                EventFilter::NoFilter.decide(&ev).is_some()
            );
        }
        let hb = raw(json!({"type": "worker-heartbeat"}));
        assert_eq!(
            multi.decide(&hb).is_some(),
            EventFilter::NoFilter.decide(&hb).is_some()
        );
    }

    #[test]
    fn test_empty_multi_passes_everything() {
        let multi = EventFilter::Multi(vec![]);
        for ev in sequence() {
            assert!(multi.decide(&ev).is_some());
        }
    }

    #[test]
    fn test_multi_is_logical_and() {
        let multi = EventFilter::Multi(vec![EventFilter::NoFilter, EventFilter::NoHeartbeat]);
        let hb = raw(json!({"type": "worker-heartbeat"}));
        assert!(multi.decide(&hb).is_none());
        assert!(multi.decide(&sequence()[0]).is_some());
    }

    #[test]
    fn test_untyped_events_pass_the_heartbeat_filter() {
        let untyped = raw(json!({"uuid": "u1"}));
        assert!(EventFilter::NoHeartbeat.decide(&untyped).is_some());
    }
}
