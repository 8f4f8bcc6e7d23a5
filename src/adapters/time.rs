//! Monotonic time source.
//!
//! Debouncers and the poll loop need time that never jumps; wall-clock
//! time (`chrono::Local`) is only used for event timestamps.

use core::time::Duration;
use std::time::Instant;

/// Time since the controller started.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    start: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Elapsed time since construction.
    pub fn now(&self) -> Duration {
        self.start.elapsed()
    }

    /// Seconds since start.
    pub fn uptime_secs(&self) -> u64 {
        self.start.elapsed().as_secs()
    }
}
