//! # Global pipeline configuration.
//!
//! Provides [`Config`] centralized settings for the relay pipeline.
//!
//! Config is used in two places:
//! 1. **Pump creation**: `EventPump::spawn(broker, &config)`
//! 2. **Runner creation**: `Runner::new(sender, filter, &config)`
//!
//! ## Field semantics
//! - `max_retries`: consecutive broker failures tolerated before the pump
//!   escalates (`3` = fail hard on the 4th consecutive failure)
//! - `bus_capacity`: ring buffer size of the outbound broadcast channel
//!   (min 1; clamped by [`Sender`](crate::Sender))
//! - `throttle`: fixed cooperative delay the runner sleeps after publishing
//!   an event **and** after rejecting one

use std::time::Duration;

/// Global configuration for the relay pipeline.
///
/// Defines:
/// - **Retry budget**: how many consecutive broker failures the pump absorbs
/// - **Fan-out**: outbound broadcast channel capacity
/// - **Throttling**: the runner's cooperative delay
///
/// ## Notes
/// All fields are public for flexibility. Prefer the helper accessors to avoid
/// sprinkling clamping logic across the codebase.
#[derive(Clone, Debug)]
pub struct Config {
    /// Maximum number of consecutive broker failures before the pump gives up.
    ///
    /// The counter covers both connect and receive failures and resets to zero
    /// after any successful receive cycle. With the default of `3`, the 4th
    /// consecutive failure escalates as
    /// [`RelayError::TooManyRetries`](crate::RelayError::TooManyRetries).
    ///
    /// This is a fixed-attempt breaker, not exponential backoff: the pump
    /// relies on the broker client's own reconnect behavior between attempts.
    pub max_retries: u32,

    /// Capacity of the outbound broadcast channel ring buffer.
    ///
    /// Subscribers that lag behind more than `bus_capacity` events will
    /// observe `Lagged` and skip older items. Minimum value is 1 (enforced by
    /// the sender).
    pub bus_capacity: usize,

    /// Fixed cooperative delay applied by the runner.
    ///
    /// Slept once after each published event (caps publish throughput, the
    /// primary throttle against overwhelming subscribers) and once after each
    /// rejected event. Both paths use the same duration deliberately.
    pub throttle: Duration,
}

impl Config {
    /// Returns a bus capacity clamped to a minimum of 1.
    ///
    /// The [`Sender`](crate::Sender) should use this value to avoid
    /// constructing an invalid channel.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `max_retries = 3` (fatal on the 4th consecutive failure)
    /// - `bus_capacity = 1024` (good baseline)
    /// - `throttle = 200ms` (matches dashboard refresh rates)
    fn default() -> Self {
        Self {
            max_retries: 3,
            bus_capacity: 1024,
            throttle: Duration::from_millis(200),
        }
    }
}
