//! In-memory GPIO line for simulation and tests.
//!
//! A `SimPin` is a cheap handle onto shared state: cloning it gives a
//! second handle to the *same* line, so a test (or the `--hardware sim`
//! console) can keep a probe while the driver owns the other clone.

use core::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use embedded_hal::digital::{self, ErrorKind, ErrorType, InputPin, OutputPin};

#[derive(Debug, Default)]
struct Line {
    level: AtomicBool,
    writes: AtomicUsize,
    faulted: AtomicBool,
}

/// Simulated digital line usable as input or output.
#[derive(Debug, Clone, Default)]
pub struct SimPin {
    line: Arc<Line>,
}

/// Injected fault on a simulated line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimPinFault;

impl fmt::Display for SimPinFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("simulated line fault")
    }
}

impl digital::Error for SimPinFault {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

impl SimPin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current electrical level.
    pub fn level(&self) -> bool {
        self.line.level.load(Ordering::Acquire)
    }

    /// Force the electrical level (simulated stimulus).
    pub fn set_level(&self, high: bool) {
        self.line.level.store(high, Ordering::Release);
    }

    /// Number of output writes performed through any handle.
    pub fn writes(&self) -> usize {
        self.line.writes.load(Ordering::Acquire)
    }

    /// Make every subsequent read/write fail (or succeed again).
    pub fn set_faulted(&self, faulted: bool) {
        self.line.faulted.store(faulted, Ordering::Release);
    }

    fn check(&self) -> Result<(), SimPinFault> {
        if self.line.faulted.load(Ordering::Acquire) {
            Err(SimPinFault)
        } else {
            Ok(())
        }
    }

    fn write(&self, high: bool) -> Result<(), SimPinFault> {
        self.check()?;
        self.line.level.store(high, Ordering::Release);
        self.line.writes.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }
}

impl ErrorType for SimPin {
    type Error = SimPinFault;
}

impl InputPin for SimPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        self.check()?;
        Ok(self.level())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|h| !h)
    }
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write(false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write(true)
    }
}
