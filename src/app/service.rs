//! Bench controller: the hexagonal core.
//!
//! [`BenchController`] owns the bench state, the output hardware and the
//! producer end of the event queue, all behind one lock.  Every mutation
//! (poll cycle, remote mode request) and every status query takes that
//! lock, so a snapshot can never observe a half-applied transition.
//!
//! ```text
//!  SensorPort ──▶ ┌────────────────────────┐ ──▶ EventProducer
//!                 │    BenchController     │
//!  Indicator  ◀── │  BenchState · policy   │
//!  Display    ◀── │                        │
//!  Chime      ◀── └────────────────────────┘
//! ```
//!
//! Sensor reads happen *outside* the lock; queueing an event never blocks,
//! and chimes are handed to a worker, so the lock is only ever held for
//! in-memory work plus the output writes themselves.

use core::time::Duration;

use chrono::Local;
use log::{info, warn};
use parking_lot::Mutex;

use crate::config::SystemConfig;
use crate::drivers::buzzer::Chime;
use crate::drivers::debounce::RisingEdge;
use crate::error::{ControlError, SensorError};
use crate::events::EventProducer;
use crate::fsm::{BenchState, Mode, ModeCause, OccupancyPolicy, Transition};

use super::events::{BenchEvent, BenchStatus, EventClock};
use super::ports::{ChimePort, DisplayPort, IndicatorPort, SensorPort};

/// First display line.
pub const DISPLAY_TITLE: &str = "LinkedBench";

/// What one poll cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleOutcome {
    pub seats: Transition,
    /// `None` when the button produced no rising edge this cycle.
    pub button: Option<Result<Transition, ControlError>>,
}

struct Inner<H> {
    state: BenchState,
    outputs: H,
    clock: EventClock,
    button: RisingEdge,
}

// ───────────────────────────────────────────────────────────────
// BenchController
// ───────────────────────────────────────────────────────────────

/// Occupancy / mode controller for one bench.
pub struct BenchController<H> {
    bench_id: String,
    error_chime_when_empty: bool,
    events: EventProducer,
    inner: Mutex<Inner<H>>,
}

impl<H: IndicatorPort + DisplayPort + ChimePort> BenchController<H> {
    pub fn new(
        bench_id: impl Into<String>,
        policy: OccupancyPolicy,
        seat_count: usize,
        outputs: H,
        events: EventProducer,
    ) -> Self {
        Self {
            bench_id: bench_id.into(),
            error_chime_when_empty: false,
            events,
            inner: Mutex::new(Inner {
                state: BenchState::new(policy, seat_count),
                outputs,
                clock: EventClock::new(),
                button: RisingEdge::new(),
            }),
        }
    }

    /// Construct from configuration.
    pub fn from_config(config: &SystemConfig, outputs: H, events: EventProducer) -> Self {
        let mut ctl = Self::new(
            config.bench_id.clone(),
            config.policy,
            config.pins.seats.len(),
            outputs,
            events,
        );
        ctl.error_chime_when_empty = config.error_chime_when_empty;
        ctl
    }

    /// Beep on a rejected button press under the binary policy.
    #[must_use]
    pub fn with_error_chime_when_empty(mut self, enabled: bool) -> Self {
        self.error_chime_when_empty = enabled;
        self
    }

    pub fn bench_id(&self) -> &str {
        &self.bench_id
    }

    pub fn policy(&self) -> OccupancyPolicy {
        self.inner.lock().state.policy()
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Draw the initial indicator/display and play the startup chime.
    pub fn start(&self) {
        let mut inner = self.inner.lock();
        Self::refresh(&mut inner);
        inner.outputs.chime(Chime::Startup);
        info!(
            "Bench '{}' started ({} policy, {} seats)",
            self.bench_id,
            inner.state.policy(),
            inner.state.seats().len()
        );
    }

    /// Drive every output to its idle state.
    pub fn shutdown(&self) {
        let mut inner = self.inner.lock();
        inner.outputs.indicator_off();
        inner.outputs.clear_display();
        inner.outputs.silence();
        info!("Bench '{}' outputs released", self.bench_id);
    }

    // ── Per-cycle orchestration ───────────────────────────────

    /// One poll cycle: seats → state machine, then button → manual cycle.
    ///
    /// A sensor fault aborts the cycle before anything is mutated for the
    /// failing step.
    pub fn poll_cycle(
        &self,
        sensors: &mut impl SensorPort,
        now: Duration,
    ) -> Result<CycleOutcome, SensorError> {
        let seats = sensors.read_seats(now)?;
        let seats = self.apply_seats(&seats);

        let pressed = sensors.read_mode_button(now)?;
        let button = {
            let mut inner = self.inner.lock();
            if inner.button.update(pressed) {
                Some(self.cycle_locked(&mut inner))
            } else {
                None
            }
        };

        Ok(CycleOutcome { seats, button })
    }

    /// Record a debounced seat set.
    pub fn apply_seats(&self, seats: &[bool]) -> Transition {
        let mut inner = self.inner.lock();
        if seats.len() != inner.state.seats().len() {
            warn!(
                "Ignoring seat set of length {} (expected {})",
                seats.len(),
                inner.state.seats().len()
            );
            return Transition::Unchanged;
        }
        let transition = inner.state.apply_seats(seats);
        match transition {
            Transition::Occupied => info!("Bench occupied ({} seat(s))", inner.state.active_seats()),
            Transition::Vacated => info!("Bench vacated"),
            Transition::ModeChanged(_) => info!("Mode forced to: {}", inner.state.mode()),
            Transition::SeatsChanged | Transition::Unchanged => {}
        }
        self.commit(&mut inner, transition);
        transition
    }

    /// One manual press of the mode button.
    pub fn press_mode_button(&self) -> Result<Transition, ControlError> {
        let mut inner = self.inner.lock();
        self.cycle_locked(&mut inner)
    }

    // ── Control surface ───────────────────────────────────────

    /// Snapshot taken under the bench lock.
    pub fn status(&self) -> BenchStatus {
        let inner = self.inner.lock();
        BenchStatus::capture(&inner.state, &self.bench_id, Local::now())
    }

    /// Remote mode request. On rejection nothing is mutated.
    pub fn set_mode(&self, mode: Mode) -> Result<BenchStatus, ControlError> {
        let mut inner = self.inner.lock();
        let transition = inner.state.request_mode(mode).inspect_err(|e| {
            warn!("Remote mode request rejected: {e}");
        })?;
        info!("Mode set remotely to: {}", inner.state.mode());
        self.commit(&mut inner, transition);
        Ok(BenchStatus::capture(&inner.state, &self.bench_id, Local::now()))
    }

    /// Clone of the current state (tests, diagnostics).
    pub fn state(&self) -> BenchState {
        self.inner.lock().state.clone()
    }

    /// Run `f` against the output hardware under the bench lock.
    pub fn with_outputs<R>(&self, f: impl FnOnce(&mut H) -> R) -> R {
        f(&mut self.inner.lock().outputs)
    }

    // ── Internal ──────────────────────────────────────────────

    fn cycle_locked(&self, inner: &mut Inner<H>) -> Result<Transition, ControlError> {
        match inner.state.cycle_mode() {
            Ok(transition) => {
                info!("Mode changed to: {}", inner.state.mode());
                self.commit(inner, transition);
                Ok(transition)
            }
            Err(e) => {
                info!("Mode button ignored: {e}");
                if self.rejection_chime(inner.state.policy()) {
                    inner.outputs.chime(Chime::Error);
                }
                Err(e)
            }
        }
    }

    fn rejection_chime(&self, policy: OccupancyPolicy) -> bool {
        match policy {
            OccupancyPolicy::Binary => self.error_chime_when_empty,
            OccupancyPolicy::SeatCount => true,
        }
    }

    /// Turn a transition into event + feedback + output refresh.
    fn commit(&self, inner: &mut Inner<H>, transition: Transition) {
        if transition.is_qualifying() {
            let timestamp = inner.clock.stamp(Local::now());
            if let Some(event) =
                BenchEvent::for_transition(transition, &inner.state, &self.bench_id, timestamp)
            {
                self.events.enqueue(event);
            }
        }

        match transition {
            Transition::Occupied => inner.outputs.chime(Chime::Short),
            Transition::ModeChanged(ModeCause::Button) => inner.outputs.chime(Chime::Confirm),
            _ => {}
        }

        if transition.needs_refresh() {
            Self::refresh(inner);
        }
    }

    fn refresh(inner: &mut Inner<H>) {
        let pattern = inner.state.indicator_pattern();
        inner.outputs.set_pattern(pattern);
        inner.outputs.show(DISPLAY_TITLE, inner.state.status_line());
    }
}
