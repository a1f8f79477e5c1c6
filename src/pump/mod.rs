//! Producer side of the pipeline: broker draining and state tracking.
//!
//! Internal modules:
//! - [`pump`]: the [`EventPump`] producer task and its bounded retry loop;
//! - [`state`]: the [`PumpState`] aggregate cache of worker/task liveness.

mod pump;
mod state;

pub use pump::EventPump;
pub use state::{PumpState, TaskInfo, WorkerInfo};
