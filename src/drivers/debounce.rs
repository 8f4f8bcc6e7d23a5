//! Debounced digital inputs.
//!
//! ## Algorithm
//!
//! The core is [`Debouncer::step`], a pure function of (previous state,
//! raw sample, monotonic time).  It reports a new stable level only after
//! the raw level has differed from the reported one *continuously* for at
//! least the debounce interval; any bounce back restarts the candidate
//! timer.  The very first sample is accepted immediately so a seat that is
//! already occupied at boot is seen on the first poll.
//!
//! [`DebouncedInput`] wraps a `Debouncer` around an `embedded-hal` input
//! pin, handles active-low wiring and optionally mirrors the *raw* level
//! onto a feedback LED for immediate tactile feedback.

use core::time::Duration;

use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

use crate::error::SensorError;

/// Result of one debounce step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    /// Reported (debounced) level after this sample.
    pub level: bool,
    /// Whether `level` changed on this sample.
    pub changed: bool,
}

/// Pure debounce state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Debouncer {
    interval: Duration,
    stable: Option<bool>,
    /// Raw level that differs from `stable`, and when it was first seen.
    candidate: Option<(bool, Duration)>,
    last_change: Duration,
}

impl Debouncer {
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            stable: None,
            candidate: None,
            last_change: Duration::ZERO,
        }
    }

    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Last reported level (`false` before the first sample).
    pub fn level(&self) -> bool {
        self.stable.unwrap_or(false)
    }

    /// When the reported level last changed.
    pub const fn last_change(&self) -> Duration {
        self.last_change
    }

    /// Feed one raw sample taken at `now`.
    pub fn step(&mut self, raw: bool, now: Duration) -> Step {
        let Some(stable) = self.stable else {
            self.stable = Some(raw);
            self.last_change = now;
            return Step {
                level: raw,
                changed: raw,
            };
        };

        if raw == stable {
            self.candidate = None;
            return Step {
                level: stable,
                changed: false,
            };
        }

        let since = match self.candidate {
            Some((level, since)) if level == raw => since,
            _ => {
                self.candidate = Some((raw, now));
                now
            }
        };

        if now.saturating_sub(since) >= self.interval {
            self.stable = Some(raw);
            self.candidate = None;
            self.last_change = now;
            Step {
                level: raw,
                changed: true,
            }
        } else {
            Step {
                level: stable,
                changed: false,
            }
        }
    }
}

/// Fires once per released → pressed transition of a debounced level.
///
/// The first sample only seeds the edge: a button already held at startup
/// has not been pressed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RisingEdge {
    last: Option<bool>,
}

impl RisingEdge {
    pub const fn new() -> Self {
        Self { last: None }
    }

    pub fn update(&mut self, level: bool) -> bool {
        let fired = level && self.last == Some(false);
        self.last = Some(level);
        fired
    }
}

// ---------------------------------------------------------------------------
// Pin-backed input
// ---------------------------------------------------------------------------

/// Placeholder feedback output for inputs without an LED.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFeedback;

impl ErrorType for NoFeedback {
    type Error = core::convert::Infallible;
}

impl OutputPin for NoFeedback {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// A physical input sampled through a [`Debouncer`].
pub struct DebouncedInput<I: InputPin, F: OutputPin = NoFeedback> {
    name: &'static str,
    pin: I,
    active_low: bool,
    feedback: Option<F>,
    debouncer: Debouncer,
}

impl<I: InputPin> DebouncedInput<I, NoFeedback> {
    pub fn new(name: &'static str, pin: I, active_low: bool, interval: Duration) -> Self {
        Self {
            name,
            pin,
            active_low,
            feedback: None,
            debouncer: Debouncer::new(interval),
        }
    }
}

impl<I: InputPin, F: OutputPin> DebouncedInput<I, F> {
    /// Input whose raw level is mirrored onto `feedback`.
    pub fn with_feedback(
        name: &'static str,
        pin: I,
        active_low: bool,
        interval: Duration,
        feedback: Option<F>,
    ) -> Self {
        Self {
            name,
            pin,
            active_low,
            feedback,
            debouncer: Debouncer::new(interval),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Last reported level without sampling.
    pub fn level(&self) -> bool {
        self.debouncer.level()
    }

    /// Read the pin and return the debounced "active" level.
    pub fn sample(&mut self, now: Duration) -> Result<bool, SensorError> {
        let high = self.pin.is_high().map_err(|e| SensorError::ReadFailed {
            input: self.name,
            reason: format!("{e:?}"),
        })?;
        let raw = high != self.active_low;

        if let Some(led) = self.feedback.as_mut() {
            let res = if raw { led.set_high() } else { led.set_low() };
            if let Err(e) = res {
                log::debug!("{} feedback LED write failed: {:?}", self.name, e);
            }
        }

        Ok(self.debouncer.step(raw, now).level)
    }

    /// Drive the feedback LED low (shutdown).
    pub fn release(&mut self) {
        if let Some(led) = self.feedback.as_mut() {
            let _ = led.set_low();
        }
    }
}
