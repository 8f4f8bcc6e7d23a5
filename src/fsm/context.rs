//! Bench state threaded through every transition rule.
//!
//! `BenchState` is the single aggregate the policy rules read from and
//! write to: the last recorded seat set, the derived occupied flag and the
//! current mode.  Exactly one instance lives inside the controller's lock.

use crate::drivers::pattern::PatternSpec;
use crate::error::ControlError;

use super::states::{binary, seat_count};
use super::{Mode, OccupancyPolicy, Transition};

/// Occupancy and mode of one bench.
///
/// Invariant: `occupied == seats.iter().any(|s| *s)`, and `mode` is
/// `Empty` whenever no seat is active. Under the seat-count policy the
/// converse holds too; the binary policy stays `Empty` while occupied
/// until the first button press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchState {
    policy: OccupancyPolicy,
    seats: Vec<bool>,
    occupied: bool,
    mode: Mode,
}

impl BenchState {
    /// Empty bench with `seat_count` released seats.
    pub fn new(policy: OccupancyPolicy, seat_count: usize) -> Self {
        Self {
            policy,
            seats: vec![false; seat_count],
            occupied: false,
            mode: Mode::Empty,
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn policy(&self) -> OccupancyPolicy {
        self.policy
    }

    /// Last recorded (debounced) seat set.
    pub fn seats(&self) -> &[bool] {
        &self.seats
    }

    pub fn occupied(&self) -> bool {
        self.occupied
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Number of seats currently active.
    pub fn active_seats(&self) -> usize {
        self.seats.iter().filter(|s| **s).count()
    }

    /// Numeric code of the current mode under the active policy.
    pub fn mode_code(&self) -> u8 {
        // `mode` is only ever assigned members of the policy's set.
        self.policy.code(self.mode).unwrap_or(0)
    }

    // ── Transitions ───────────────────────────────────────────

    /// Record a new debounced seat set.
    ///
    /// Returns [`Transition::Unchanged`] if `seats` equals the recorded set.
    pub fn apply_seats(&mut self, seats: &[bool]) -> Transition {
        if seats == self.seats.as_slice() {
            return Transition::Unchanged;
        }
        let prev_active = self.active_seats();
        self.seats.clear();
        self.seats.extend_from_slice(seats);

        match self.policy {
            OccupancyPolicy::Binary => binary::on_seats(self),
            OccupancyPolicy::SeatCount => seat_count::on_seats(self, prev_active),
        }
    }

    /// One manual press of the mode button.
    pub fn cycle_mode(&mut self) -> Result<Transition, ControlError> {
        match self.policy {
            OccupancyPolicy::Binary => binary::cycle(self),
            OccupancyPolicy::SeatCount => seat_count::cycle(self),
        }
    }

    /// Remote request for a specific mode.
    pub fn request_mode(&mut self, mode: Mode) -> Result<Transition, ControlError> {
        if !self.policy.contains(mode) {
            return Err(ControlError::NotSelectable(mode));
        }
        match self.policy {
            OccupancyPolicy::Binary => binary::request(self, mode),
            OccupancyPolicy::SeatCount => seat_count::request(self, mode),
        }
    }

    // ── Outputs ───────────────────────────────────────────────

    /// Indicator pattern for the current state.
    pub fn indicator_pattern(&self) -> PatternSpec {
        match self.policy {
            OccupancyPolicy::Binary => binary::pattern(self),
            OccupancyPolicy::SeatCount => seat_count::pattern(self),
        }
    }

    /// Second display line for the current state.
    pub fn status_line(&self) -> &'static str {
        match self.policy {
            OccupancyPolicy::Binary if !self.occupied => "Available",
            _ => self.mode.name(),
        }
    }

    // ── Rule helpers (crate-internal) ─────────────────────────

    pub(super) fn set_occupied(&mut self, occupied: bool) {
        self.occupied = occupied;
    }

    pub(super) fn set_mode(&mut self, mode: Mode) {
        debug_assert!(self.policy.contains(mode), "{mode:?} outside {:?}", self.policy);
        self.mode = mode;
    }

    pub(super) fn any_active(&self) -> bool {
        self.seats.iter().any(|s| *s)
    }

    pub(super) fn all_active(&self) -> bool {
        self.seats.len() > 1 && self.seats.iter().all(|s| *s)
    }
}
