//! Error types for the LinkedBench controller.
//!
//! Each failure category gets its own small enum so callers can match on
//! exactly what they can handle:
//!
//! | Type          | Raised by                       | Handling                         |
//! |---------------|---------------------------------|----------------------------------|
//! | `SensorError` | debounced inputs, poll cycle    | logged, cycle skipped, backoff   |
//! | `ControlError`| manual / remote mode requests   | returned to caller, no mutation  |
//! | `HwInitError` | GPIO / I2C bring-up             | fatal, propagated out of `main`  |
//! | `ConfigError` | config file load / validation   | fatal, propagated out of `main`  |
//!
//! Sink failures (log store, relay) live next to their ports in
//! [`crate::app::ports`].

use core::fmt;

use crate::fsm::Mode;

// ---------------------------------------------------------------------------
// Sensor faults
// ---------------------------------------------------------------------------

/// A digital input could not be sampled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SensorError {
    /// The pin read itself failed (driver error text attached).
    ReadFailed { input: &'static str, reason: String },
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFailed { input, reason } => write!(f, "{input} read failed: {reason}"),
        }
    }
}

impl std::error::Error for SensorError {}

// ---------------------------------------------------------------------------
// Mode-change rejections
// ---------------------------------------------------------------------------

/// Why a manual or remote mode change was refused.
///
/// A rejected request never mutates bench state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlError {
    /// The numeric mode code is outside the active policy's mode set.
    InvalidMode(i64),
    /// Nobody is seated.
    BenchEmpty,
    /// The seat count currently pins the mode (e.g. two occupants force
    /// Study buddy under the seat-count policy).
    ModeLocked { seats: usize },
    /// The mode exists but cannot be requested directly (e.g. Empty).
    NotSelectable(Mode),
}

impl fmt::Display for ControlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidMode(code) => write!(f, "invalid mode: {code}"),
            Self::BenchEmpty => write!(f, "cannot set mode while bench is empty"),
            Self::ModeLocked { seats } => {
                write!(f, "mode is fixed while {seats} seat(s) are occupied")
            }
            Self::NotSelectable(mode) => write!(f, "mode '{}' cannot be selected", mode.name()),
        }
    }
}

impl std::error::Error for ControlError {}

// ---------------------------------------------------------------------------
// Hardware bring-up
// ---------------------------------------------------------------------------

/// Errors during one-shot peripheral initialisation.
#[derive(Debug)]
pub enum HwInitError {
    /// A GPIO line could not be exported or configured.
    Gpio { pin: u32, source: std::io::Error },
    /// The I2C bus device could not be opened or addressed.
    I2c { bus: u8, source: std::io::Error },
    /// Driving the initial safe output level failed.
    OutputInit(&'static str),
}

impl fmt::Display for HwInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gpio { pin, source } => write!(f, "GPIO {pin} setup failed: {source}"),
            Self::I2c { bus, source } => write!(f, "I2C bus {bus} setup failed: {source}"),
            Self::OutputInit(what) => write!(f, "could not drive {what} to its safe level"),
        }
    }
}

impl std::error::Error for HwInitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Gpio { source, .. } | Self::I2c { source, .. } => Some(source),
            Self::OutputInit(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Errors loading or validating [`SystemConfig`](crate::config::SystemConfig).
#[derive(Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    Io(std::io::Error),
    /// The config file is not valid JSON for `SystemConfig`.
    Parse(serde_json::Error),
    /// A field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "config read failed: {e}"),
            Self::Parse(e) => write!(f, "config parse failed: {e}"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Parse(e) => Some(e),
            Self::ValidationFailed(_) => None,
        }
    }
}
