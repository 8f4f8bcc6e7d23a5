//! Outbound bench events and status snapshots.
//!
//! The [`BenchController`](super::service::BenchController) creates a
//! [`BenchEvent`] for every qualifying transition and hands it to the
//! event queue.  Events are immutable once created; sinks only ever see
//! owned copies.

use core::fmt;
use core::str::FromStr;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::fsm::{BenchState, Mode, ModeCause, OccupancyPolicy, Transition};

/// Kind of bench event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Occupation,
    Vacation,
    ModeChange,
    ModeChangeRemote,
}

impl EventType {
    pub const ALL: [Self; 4] = [
        Self::Occupation,
        Self::Vacation,
        Self::ModeChange,
        Self::ModeChangeRemote,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Occupation => "occupation",
            Self::Vacation => "vacation",
            Self::ModeChange => "mode_change",
            Self::ModeChangeRemote => "mode_change_remote",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown event type '{s}'"))
    }
}

/// One observed transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchEvent {
    pub event_type: EventType,
    pub bench_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seats: Option<u8>,
    pub timestamp: DateTime<Local>,
}

impl BenchEvent {
    /// Build the event for `transition`, or `None` if it does not qualify.
    ///
    /// `state` must already reflect the transition.
    pub fn for_transition(
        transition: Transition,
        state: &BenchState,
        bench_id: &str,
        timestamp: DateTime<Local>,
    ) -> Option<Self> {
        let event_type = match transition {
            Transition::Occupied => EventType::Occupation,
            Transition::Vacated => EventType::Vacation,
            Transition::ModeChanged(ModeCause::Remote) => EventType::ModeChangeRemote,
            Transition::ModeChanged(_) => EventType::ModeChange,
            Transition::Unchanged | Transition::SeatsChanged => return None,
        };

        let (mode, mode_name) = if event_type == EventType::Vacation {
            (None, None)
        } else {
            (Some(state.mode_code()), Some(state.mode().name().to_owned()))
        };

        let seats = match (state.policy(), transition) {
            (
                OccupancyPolicy::SeatCount,
                Transition::Occupied | Transition::ModeChanged(ModeCause::SeatCount),
            ) => Some(state.active_seats() as u8),
            _ => None,
        };

        Some(Self {
            event_type,
            bench_id: bench_id.to_owned(),
            mode,
            mode_name,
            seats,
            timestamp,
        })
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Hands out non-decreasing event timestamps.
///
/// A wall-clock step backwards (NTP correction) is clamped to the previous
/// stamp.
#[derive(Debug, Default)]
pub struct EventClock {
    last: Option<DateTime<Local>>,
}

impl EventClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stamp(&mut self, now: DateTime<Local>) -> DateTime<Local> {
        let ts = match self.last {
            Some(last) if last > now => last,
            _ => now,
        };
        self.last = Some(ts);
        ts
    }
}

/// Immutable status snapshot, taken under the bench lock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchStatus {
    pub bench_id: String,
    pub policy: OccupancyPolicy,
    pub occupied: bool,
    pub seats: usize,
    pub mode: u8,
    pub mode_name: String,
    pub timestamp: DateTime<Local>,
}

impl BenchStatus {
    pub fn capture(state: &BenchState, bench_id: &str, timestamp: DateTime<Local>) -> Self {
        Self {
            bench_id: bench_id.to_owned(),
            policy: state.policy(),
            occupied: state.occupied(),
            seats: state.active_seats(),
            mode: state.mode_code(),
            mode_name: state.mode().name().to_owned(),
            timestamp,
        }
    }

    pub fn mode(&self) -> Option<Mode> {
        self.policy.mode_from_code(i64::from(self.mode))
    }
}
