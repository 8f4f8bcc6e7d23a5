//! Occupancy / social-mode state machine.
//!
//! ```text
//!            seats change            button / remote request
//!  sensors ──────────────▶ ┌──────────────────┐ ◀──────────────────
//!                          │    BenchState    │
//!                          │  seats · mode    │──▶ Transition
//!                          │  (policy rules)  │      (what happened)
//!                          └──────────────────┘
//! ```
//!
//! The machine is pure: every operation mutates [`BenchState`] and
//! returns a [`Transition`] describing what became visible.  Turning a
//! transition into an event, a chime or an indicator refresh is the
//! controller's job ([`crate::app::service`]).
//!
//! Two mutually exclusive rule sets are supported, chosen once at
//! startup through [`OccupancyPolicy`]:
//!
//! | Policy       | Modes                                               |
//! |--------------|-----------------------------------------------------|
//! | `Binary`     | Empty, Studying, Open to chat, Study buddy          |
//! | `SeatCount`  | Empty, Available, Studying, Open to chat, Study buddy|

pub mod context;
pub mod states;

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

pub use context::BenchState;

// ---------------------------------------------------------------------------
// Mode
// ---------------------------------------------------------------------------

/// Social mode shown to passers-by.
///
/// The declaration order is the display order; numeric codes depend on
/// the active policy (see [`OccupancyPolicy::code`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Empty,
    Available,
    Studying,
    OpenToChat,
    StudyBuddy,
}

impl Mode {
    /// Human-readable name, as shown on the display and in events.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Empty => "Empty",
            Self::Available => "Available",
            Self::Studying => "Studying",
            Self::OpenToChat => "Open to chat",
            Self::StudyBuddy => "Study buddy",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Policy selection
// ---------------------------------------------------------------------------

const BINARY_MODES: [Mode; 4] = [Mode::Empty, Mode::Studying, Mode::OpenToChat, Mode::StudyBuddy];

const SEAT_COUNT_MODES: [Mode; 5] = [
    Mode::Empty,
    Mode::Available,
    Mode::Studying,
    Mode::OpenToChat,
    Mode::StudyBuddy,
];

/// Rule set mapping seat occupancy to a mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OccupancyPolicy {
    /// Occupied = any seat active; the button cycles the social modes.
    #[default]
    Binary,
    /// Mode follows the number of occupants; cycling only with one.
    SeatCount,
}

impl OccupancyPolicy {
    /// Every mode of this policy, indexed by its numeric code.
    pub const fn modes(self) -> &'static [Mode] {
        match self {
            Self::Binary => &BINARY_MODES,
            Self::SeatCount => &SEAT_COUNT_MODES,
        }
    }

    /// Whether `mode` belongs to this policy's mode set.
    pub fn contains(self, mode: Mode) -> bool {
        self.modes().contains(&mode)
    }

    /// Numeric code of `mode` under this policy, `None` if not a member.
    pub fn code(self, mode: Mode) -> Option<u8> {
        self.modes().iter().position(|m| *m == mode).map(|i| i as u8)
    }

    /// Reverse of [`code`](Self::code). Accepts any integer so callers can
    /// validate untrusted input without a lossy cast first.
    pub fn mode_from_code(self, code: i64) -> Option<Mode> {
        usize::try_from(code)
            .ok()
            .and_then(|idx| self.modes().get(idx).copied())
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Binary => "binary",
            Self::SeatCount => "seat_count",
        }
    }
}

impl fmt::Display for OccupancyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OccupancyPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "binary" => Ok(Self::Binary),
            "seat_count" | "seatcount" => Ok(Self::SeatCount),
            other => Err(format!("unknown occupancy policy '{other}' (binary | seat_count)")),
        }
    }
}

// ---------------------------------------------------------------------------
// Transition
// ---------------------------------------------------------------------------

/// What caused a mode change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeCause {
    /// Rising edge on the mode button.
    Button,
    /// Control-surface request.
    Remote,
    /// A seat-count change forced a different mode.
    SeatCount,
}

/// Externally visible outcome of one state-machine step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Nothing changed.
    Unchanged,
    /// The bench went from empty to occupied.
    Occupied,
    /// The last occupant left; mode reset to Empty.
    Vacated,
    /// Seats changed without changing occupancy or mode.
    SeatsChanged,
    /// The mode changed while the bench stayed occupied.
    ModeChanged(ModeCause),
}

impl Transition {
    /// Transitions that must produce exactly one event.
    pub const fn is_qualifying(self) -> bool {
        matches!(self, Self::Occupied | Self::Vacated | Self::ModeChanged(_))
    }

    /// Whether indicator and display need redrawing.
    pub const fn needs_refresh(self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}
