//! Indicator pattern actuator.
//!
//! Drives one output pin through a [`PatternSpec`]:
//!
//! | Pattern        | Output                                   | Background task |
//! |----------------|------------------------------------------|-----------------|
//! | `Off`          | held low                                 | none            |
//! | `Solid`        | held high                                | none            |
//! | `Blink{on,off}`| toggled high for `on`, low for `off`     | one worker      |
//!
//! ## Replacement
//!
//! Switching patterns cancels the running blink worker and **joins it**
//! before the new level is driven or a new worker starts, so at most one
//! writer ever owns the pin.  Workers sleep on a condvar instead of
//! `thread::sleep`, which makes cancellation take effect immediately
//! rather than at the end of the current phase.

use core::time::Duration;
use std::sync::Arc;
use std::thread::JoinHandle;

use embedded_hal::digital::OutputPin;
use parking_lot::{Condvar, Mutex};

use crate::drivers::task::{WORKER_STACK_KB, spawn_named};
use crate::error::HwInitError;

/// Temporal behaviour of the indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternSpec {
    Off,
    Solid,
    Blink { on: Duration, off: Duration },
}

impl PatternSpec {
    /// 0.1 s on / 0.1 s off.
    pub const FAST_BLINK: Self = Self::Blink {
        on: Duration::from_millis(100),
        off: Duration::from_millis(100),
    };
    /// 0.5 s on / 0.5 s off.
    pub const MEDIUM_BLINK: Self = Self::Blink {
        on: Duration::from_millis(500),
        off: Duration::from_millis(500),
    };
    /// 1 s on / 1 s off.
    pub const SLOW_BLINK: Self = Self::Blink {
        on: Duration::from_secs(1),
        off: Duration::from_secs(1),
    };

    pub const fn is_blink(self) -> bool {
        matches!(self, Self::Blink { .. })
    }
}

// ---------------------------------------------------------------------------
// Cancellation token
// ---------------------------------------------------------------------------

/// One-shot cancellation flag with an interruptible sleep.
#[derive(Debug, Default)]
pub struct CancelToken {
    cancelled: Mutex<bool>,
    cv: Condvar,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        *self.cancelled.lock() = true;
        self.cv.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancelled.lock()
    }

    /// Sleep for up to `timeout`. Returns `true` if cancelled.
    pub fn wait(&self, timeout: Duration) -> bool {
        let mut cancelled = self.cancelled.lock();
        if !*cancelled {
            // Spurious wakeups just end the phase early; no correctness issue.
            let _ = self.cv.wait_for(&mut cancelled, timeout);
        }
        *cancelled
    }
}

// ---------------------------------------------------------------------------
// Actuator
// ---------------------------------------------------------------------------

struct Blinker {
    cancel: Arc<CancelToken>,
    handle: JoinHandle<()>,
}

/// Single-output pattern driver.
pub struct PatternActuator<P: OutputPin + Send + 'static> {
    name: &'static str,
    pin: Arc<Mutex<P>>,
    current: PatternSpec,
    blinker: Option<Blinker>,
}

impl<P: OutputPin + Send + 'static> PatternActuator<P> {
    /// Take ownership of `pin` and drive it low.
    pub fn new(name: &'static str, mut pin: P) -> Result<Self, HwInitError> {
        pin.set_low().map_err(|_| HwInitError::OutputInit(name))?;
        Ok(Self {
            name,
            pin: Arc::new(Mutex::new(pin)),
            current: PatternSpec::Off,
            blinker: None,
        })
    }

    pub fn current(&self) -> PatternSpec {
        self.current
    }

    /// Whether a blink worker is currently running.
    pub fn is_blinking(&self) -> bool {
        self.blinker.is_some()
    }

    /// Apply `spec`. Re-applying the active pattern is a no-op.
    pub fn set_pattern(&mut self, spec: PatternSpec) {
        if spec == self.current && (!spec.is_blink() || self.blinker.is_some()) {
            return;
        }

        self.stop_blink();

        match spec {
            PatternSpec::Off => drive(&self.pin, false, self.name),
            PatternSpec::Solid => drive(&self.pin, true, self.name),
            PatternSpec::Blink { on, off } => self.start_blink(on, off),
        }
        self.current = spec;
        log::debug!("{} pattern -> {:?}", self.name, spec);
    }

    pub fn off(&mut self) {
        self.set_pattern(PatternSpec::Off);
    }

    fn start_blink(&mut self, on: Duration, off: Duration) {
        let cancel = Arc::new(CancelToken::new());
        let token = Arc::clone(&cancel);
        let pin = Arc::clone(&self.pin);
        let name = self.name;

        let spawned = spawn_named(&format!("{name}-blink"), WORKER_STACK_KB, move || {
            loop {
                drive(&pin, true, name);
                if token.wait(on) {
                    break;
                }
                drive(&pin, false, name);
                if token.wait(off) {
                    break;
                }
            }
        });

        match spawned {
            Ok(handle) => self.blinker = Some(Blinker { cancel, handle }),
            Err(e) => {
                log::error!("{name}: blink worker spawn failed ({e}), holding solid");
                drive(&self.pin, true, name);
            }
        }
    }

    fn stop_blink(&mut self) {
        if let Some(blinker) = self.blinker.take() {
            blinker.cancel.cancel();
            if blinker.handle.join().is_err() {
                log::error!("{}: blink worker panicked", self.name);
            }
        }
    }
}

impl<P: OutputPin + Send + 'static> Drop for PatternActuator<P> {
    fn drop(&mut self) {
        self.stop_blink();
        drive(&self.pin, false, self.name);
    }
}

fn drive<P: OutputPin>(pin: &Mutex<P>, high: bool, name: &str) {
    let mut pin = pin.lock();
    let res = if high { pin.set_high() } else { pin.set_low() };
    if let Err(e) = res {
        log::warn!("{name} output write failed: {e:?}");
    }
}
