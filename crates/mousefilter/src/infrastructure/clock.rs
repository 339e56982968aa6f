//! Monotonic clock shared by the input source and the cursor controller.
//!
//! The warp ledger compares event timestamps against the timestamps taken
//! around each warp call, so both sides must read the same clock.  Every
//! [`MonotonicClock`] copied from the same original shares its origin.

use std::time::Instant;

use mousefilter_core::Timestamp;

/// Nanoseconds elapsed since a fixed origin.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    /// Creates a clock whose origin is "now".
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    /// Reads the clock.
    pub fn now(&self) -> Timestamp {
        let nanos = self.origin.elapsed().as_nanos();
        // u64 nanoseconds cover 584 years of uptime.
        Timestamp::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}
