//! Broker boundary: connection traits and handler routing.
//!
//! The only public API from this module is the trait pair [`Broker`] /
//! [`Connection`] plus the [`Handlers`] registration used by the pump to
//! install its wildcard ingestion callback.

mod connection;

pub use connection::{Broker, Connection, EventHandler, Handlers};
