//! Port traits: the hexagonal boundary between the bench controller and
//! the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ BenchController (domain)
//! ```
//!
//! Driven adapters (seat sensors, indicator, display, buzzer, log store,
//! relay) implement these traits.  The controller consumes them through
//! generics, so the domain core never touches hardware or I/O directly.
//! All port errors are typed.

use core::fmt;
use core::time::Duration;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::diagnostics::HealthSnapshot;
use crate::drivers::buzzer::Chime;
use crate::drivers::pattern::PatternSpec;
use crate::error::SensorError;

use super::events::{BenchEvent, EventType};

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Debounced seat and button levels.
///
/// `now` is monotonic time since process start; implementations feed it
/// to their debouncers.
pub trait SensorPort {
    /// One level per seat, in seat order.
    fn read_seats(&mut self, now: Duration) -> Result<Vec<bool>, SensorError>;

    /// Debounced mode-button level (`true` = pressed).
    fn read_mode_button(&mut self, now: Duration) -> Result<bool, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Output ports (driven adapters: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Status indicator light.
pub trait IndicatorPort {
    fn set_pattern(&mut self, spec: PatternSpec);

    fn indicator_off(&mut self) {
        self.set_pattern(PatternSpec::Off);
    }
}

/// Two-line text display. Failures are the adapter's problem (logged).
pub trait DisplayPort {
    fn show(&mut self, line1: &str, line2: &str);

    fn clear_display(&mut self);
}

/// Audible feedback. Must return without waiting for the tone.
pub trait ChimePort {
    fn chime(&mut self, chime: Chime);

    /// Drop pending chimes and leave the buzzer silent.
    fn silence(&mut self) {}
}

// ───────────────────────────────────────────────────────────────
// Event sink port (drain task → storage / telemetry)
// ───────────────────────────────────────────────────────────────

/// Destination for drained events.
///
/// Sinks are called from the drain task only, never under the bench lock.
pub trait EventSink: Send {
    /// Short label for log lines.
    fn name(&self) -> &'static str;

    fn emit(&mut self, event: &BenchEvent) -> Result<(), SinkError>;
}

// ───────────────────────────────────────────────────────────────
// Log store port
// ───────────────────────────────────────────────────────────────

/// Largest page a single query may return.
pub const MAX_QUERY_LIMIT: u32 = 1000;
/// Longest statistics window.
pub const MAX_STATS_DAYS: u32 = 365;

/// Event log query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryFilter {
    pub bench_id: Option<String>,
    pub event_type: Option<EventType>,
    pub limit: u32,
    pub offset: u32,
}

impl Default for QueryFilter {
    fn default() -> Self {
        Self {
            bench_id: None,
            event_type: None,
            limit: 100,
            offset: 0,
        }
    }
}

impl QueryFilter {
    /// `limit` clamped to `1..=MAX_QUERY_LIMIT`.
    pub fn effective_limit(&self) -> u32 {
        self.limit.clamp(1, MAX_QUERY_LIMIT)
    }
}

/// An event as persisted, with its store id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEvent {
    pub id: i64,
    pub bench_id: String,
    pub event_type: String,
    pub mode: Option<u8>,
    pub mode_name: Option<String>,
    pub seats: Option<u8>,
    pub timestamp: String,
    pub recorded_ms: i64,
}

/// Aggregate counts over a time window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventStats {
    pub total: u64,
    pub by_type: BTreeMap<String, u64>,
    pub by_mode: BTreeMap<String, u64>,
    pub period_days: u32,
}

/// Append/query event log.
pub trait EventLog: Send + Sync {
    /// Persist `event`, returning its id.
    fn append(&self, event: &BenchEvent) -> Result<i64, StoreError>;

    /// Most recent first.
    fn query(&self, filter: &QueryFilter) -> Result<Vec<StoredEvent>, StoreError>;

    fn get(&self, id: i64) -> Result<Option<StoredEvent>, StoreError>;

    /// Counts over the last `days` days (clamped to `1..=MAX_STATS_DAYS`).
    fn stats(&self, bench_id: Option<&str>, days: u32) -> Result<EventStats, StoreError>;

    /// Delete events older than `days` days; returns rows removed.
    fn prune(&self, days: u32) -> Result<usize, StoreError>;
}

// ───────────────────────────────────────────────────────────────
// Relay port
// ───────────────────────────────────────────────────────────────

/// Best-effort publish-only telemetry.
///
/// Neither call waits for an acknowledgement.
pub trait EventRelay: Send + Sync {
    fn publish(&self, event: &BenchEvent) -> Result<(), RelayError>;

    fn publish_status(&self, snapshot: &HealthSnapshot) -> Result<(), RelayError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`EventLog`] operations.
#[derive(Debug)]
pub enum StoreError {
    Sqlite(rusqlite::Error),
    Serialize(serde_json::Error),
}

/// Errors from [`EventRelay`] operations.
#[derive(Debug)]
pub enum RelayError {
    /// The broker connection is currently down.
    NotConnected,
    /// The client refused the message (queue full, client closed).
    Publish(String),
    Serialize(serde_json::Error),
}

/// Errors from [`EventSink::emit`].
#[derive(Debug)]
pub enum SinkError {
    Store(StoreError),
    Relay(RelayError),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sqlite(e) => write!(f, "sqlite: {e}"),
            Self::Serialize(e) => write!(f, "serialize: {e}"),
        }
    }
}

impl fmt::Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConnected => write!(f, "not connected"),
            Self::Publish(msg) => write!(f, "publish failed: {msg}"),
            Self::Serialize(e) => write!(f, "serialize: {e}"),
        }
    }
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store(e) => write!(f, "log store: {e}"),
            Self::Relay(e) => write!(f, "relay: {e}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Sqlite(e) => Some(e),
            Self::Serialize(e) => Some(e),
        }
    }
}

impl std::error::Error for RelayError {}
impl std::error::Error for SinkError {}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Sqlite(e)
    }
}

impl From<StoreError> for SinkError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

impl From<RelayError> for SinkError {
    fn from(e: RelayError) -> Self {
        Self::Relay(e)
    }
}
