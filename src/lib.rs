//! # taskwire
//!
//! **Taskwire** relays status events (task lifecycle and worker lifecycle
//! changes) produced by a distributed job-processing backend into a live,
//! structured event stream consumable by real-time subscribers such as
//! dashboards.
//!
//! The crate is the ingestion/filtering/translation/fan-out pipeline only:
//! the WebSocket transport that writes bytes to clients, the job backend
//! itself, and event-history persistence all live outside and meet taskwire
//! at trait or channel boundaries.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   ┌─────────────┐   connect()/receive("*")   ┌──────────────────────────┐
//!   │   Broker    │ ─────────────────────────► │  EventPump (producer)    │
//!   │ (trait impl)│   bounded retry, 3+1       │  - folds PumpState       │
//!   └─────────────┘                            │  - pushes RawEvent       │
//!                                              └───────────┬──────────────┘
//!                                                          │ SPSC buffer
//!                                                          ▼
//!                                              ┌──────────────────────────┐
//!                                              │  Runner (consumer)       │
//!                                              │  EventFilter ─► translate│
//!                                              └───────────┬──────────────┘
//!                                                          │ publish
//!                                                          ▼
//!                                              ┌──────────────────────────┐
//!                                              │  Sender (broadcast)      │
//!                                              └───┬─────────┬─────────┬──┘
//!                                                  ▼         ▼         ▼
//!                                               sub 1      sub 2     sub N
//! ```
//!
//! ### Lifecycle
//! ```text
//! EventPump::spawn(broker, &cfg)
//!   └─► producer task:
//!         loop {
//!           ├─► broker.connect()                 (failure counts vs budget)
//!           ├─► conn.receive({"*": ingest})      (failure counts vs budget)
//!           │      └─ per event: PumpState::apply + buffer push
//!           ├─► clean end   → reset budget, resubscribe
//!           └─► budget spent → TooManyRetries (fatal, surfaces via join)
//!         }
//!
//! Runner::run(pump)
//!   loop {
//!     ├─► pump.next_event()          (suspends while buffer empty)
//!     ├─► filter.decide()            (reject → throttle, next)
//!     ├─► translate()                (skippable → warn; else fatal)
//!     ├─► sender.publish()           (fire-and-forget fan-out)
//!     └─► sleep(cfg.throttle)
//!   }
//! ```
//!
//! ## Guarantees
//! - **Ordering**: surviving events reach subscribers in exact broker
//!   emission order (FIFO, no reordering).
//! - **Resilience**: transient broker failures are absorbed by a fixed
//!   attempt budget (3 consecutive retries, fatal on the 4th).
//! - **Hard protocol boundary**: unrecognized or malformed events stop the
//!   pipeline instead of silently corrupting the stream; the only skip case
//!   is an unmatched worker sub-type, which is logged.
//!
//! ## Example
//! ```rust,no_run
//! use async_trait::async_trait;
//! use taskwire::{
//!     Broker, BrokerError, Config, Connection, EventFilter, EventPump, Handlers, Runner, Sender,
//! };
//!
//! struct AmqpBroker; // wraps your broker client
//! struct AmqpConnection;
//!
//! #[async_trait]
//! impl Connection for AmqpConnection {
//!     async fn receive(&mut self, handlers: &mut Handlers<'_>) -> Result<(), BrokerError> {
//!         // drain the client's stream, calling handlers.dispatch(event)
//!         # let _ = handlers;
//!         Ok(())
//!     }
//! }
//!
//! #[async_trait]
//! impl Broker for AmqpBroker {
//!     type Conn = AmqpConnection;
//!     async fn connect(&self) -> Result<Self::Conn, BrokerError> {
//!         Ok(AmqpConnection)
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), taskwire::RelayError> {
//!     let cfg = Config::default();
//!     let sender = Sender::new(cfg.bus_capacity_clamped());
//!     // hand sender.subscribe() receivers to the transport layer here
//!
//!     let pump = EventPump::spawn(AmqpBroker, &cfg);
//!     let runner = Runner::new(sender, EventFilter::NoHeartbeat, &cfg);
//!     runner.run(pump).await
//! }
//! ```

mod broker;
mod config;
mod error;
mod events;
mod filter;
mod pump;
mod runner;
mod translate;

// ---- Public re-exports ----

pub use broker::{Broker, Connection, EventHandler, Handlers};
pub use config::Config;
pub use error::{BrokerError, RelayError};
pub use events::{
    make_worker_id, Action, Domain, NormalizedEvent, Payload, RawEvent, Sender, TaskPayload,
    TaskState, WorkerPayload, WorkerStatus, SCHEMA_VERSION,
};
pub use filter::EventFilter;
pub use pump::{EventPump, PumpState, TaskInfo, WorkerInfo};
pub use runner::Runner;
pub use translate::translate;
