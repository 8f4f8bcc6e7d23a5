//! Policy rule tables.
//!
//! Each policy is a small module of free functions over [`BenchState`].
//! `BenchState` dispatches to exactly one of them based on its
//! [`OccupancyPolicy`](super::OccupancyPolicy); the two rule sets are
//! never mixed.

use crate::drivers::pattern::PatternSpec;
use crate::error::ControlError;

use super::{BenchState, Mode, ModeCause, Transition};

// ---------------------------------------------------------------------------
// Binary policy
// ---------------------------------------------------------------------------

/// Occupied = at least one seat active.
///
/// - vacating forces Empty
/// - the button cycles Studying → Open to chat → Study buddy → Studying
///   (Empty → Studying on the first press), only while occupied
/// - seat fluctuations that keep the bench occupied emit no event
pub mod binary {
    use super::*;

    pub(crate) fn on_seats(state: &mut BenchState) -> Transition {
        let now_occupied = state.any_active();
        if now_occupied == state.occupied() {
            return Transition::SeatsChanged;
        }
        state.set_occupied(now_occupied);
        if now_occupied {
            Transition::Occupied
        } else {
            state.set_mode(Mode::Empty);
            Transition::Vacated
        }
    }

    pub(crate) fn cycle(state: &mut BenchState) -> Result<Transition, ControlError> {
        if !state.occupied() {
            return Err(ControlError::BenchEmpty);
        }
        let next = match state.mode() {
            Mode::Studying => Mode::OpenToChat,
            Mode::OpenToChat => Mode::StudyBuddy,
            Mode::Empty | Mode::Available | Mode::StudyBuddy => Mode::Studying,
        };
        state.set_mode(next);
        Ok(Transition::ModeChanged(ModeCause::Button))
    }

    pub(crate) fn request(state: &mut BenchState, mode: Mode) -> Result<Transition, ControlError> {
        if mode == Mode::Empty {
            return Err(ControlError::NotSelectable(mode));
        }
        if !state.occupied() {
            return Err(ControlError::BenchEmpty);
        }
        state.set_mode(mode);
        Ok(Transition::ModeChanged(ModeCause::Remote))
    }

    pub(crate) fn pattern(state: &BenchState) -> PatternSpec {
        if !state.occupied() {
            return PatternSpec::Off;
        }
        if state.all_active() {
            return PatternSpec::Solid;
        }
        match state.mode() {
            Mode::Empty | Mode::Available => PatternSpec::Solid,
            Mode::Studying => PatternSpec::FAST_BLINK,
            Mode::OpenToChat => PatternSpec::MEDIUM_BLINK,
            Mode::StudyBuddy => PatternSpec::SLOW_BLINK,
        }
    }
}

// ---------------------------------------------------------------------------
// Seat-count policy
// ---------------------------------------------------------------------------

/// Mode follows the number of occupants.
///
/// | count | mode                                              | event        |
/// |-------|---------------------------------------------------|--------------|
/// | 0     | Empty (forced)                                    | vacation     |
/// | 1     | Available, or the single-occupant mode already set| occupation / mode_change when leaving 2 |
/// | ≥2    | Study buddy (forced, button disabled)             | occupation / mode_change |
///
/// The button only works with exactly one occupant and cycles
/// Available → Studying → Open to chat → Available.
pub mod seat_count {
    use super::*;

    pub(crate) fn on_seats(state: &mut BenchState, prev_active: usize) -> Transition {
        let count = state.active_seats();

        if count == 0 {
            state.set_occupied(false);
            state.set_mode(Mode::Empty);
            return Transition::Vacated;
        }

        if !state.occupied() {
            state.set_occupied(true);
            state.set_mode(if count == 1 { Mode::Available } else { Mode::StudyBuddy });
            return Transition::Occupied;
        }

        let next = if count >= 2 {
            Mode::StudyBuddy
        } else if prev_active >= 2 {
            // Leaving the shared mode: the remaining occupant starts over.
            Mode::Available
        } else {
            // Different single occupant; keep whatever they had chosen.
            state.mode()
        };

        if next == state.mode() {
            Transition::SeatsChanged
        } else {
            state.set_mode(next);
            Transition::ModeChanged(ModeCause::SeatCount)
        }
    }

    pub(crate) fn cycle(state: &mut BenchState) -> Result<Transition, ControlError> {
        single_occupant(state)?;
        let next = match state.mode() {
            Mode::Available => Mode::Studying,
            Mode::Studying => Mode::OpenToChat,
            Mode::OpenToChat | Mode::Empty | Mode::StudyBuddy => Mode::Available,
        };
        state.set_mode(next);
        Ok(Transition::ModeChanged(ModeCause::Button))
    }

    pub(crate) fn request(state: &mut BenchState, mode: Mode) -> Result<Transition, ControlError> {
        if matches!(mode, Mode::Empty | Mode::StudyBuddy) {
            return Err(ControlError::NotSelectable(mode));
        }
        single_occupant(state)?;
        state.set_mode(mode);
        Ok(Transition::ModeChanged(ModeCause::Remote))
    }

    pub(crate) fn pattern(state: &BenchState) -> PatternSpec {
        match state.mode() {
            Mode::Empty => PatternSpec::Off,
            Mode::Available | Mode::StudyBuddy => PatternSpec::Solid,
            Mode::Studying => PatternSpec::FAST_BLINK,
            Mode::OpenToChat => PatternSpec::MEDIUM_BLINK,
        }
    }

    fn single_occupant(state: &BenchState) -> Result<(), ControlError> {
        match state.active_seats() {
            0 => Err(ControlError::BenchEmpty),
            1 => Ok(()),
            seats => Err(ControlError::ModeLocked { seats }),
        }
    }
}
