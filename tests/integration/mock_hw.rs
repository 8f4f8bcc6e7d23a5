//! Mock adapters for integration tests.
//!
//! Records every output call so tests can assert on the full command
//! history without touching real GPIO or I2C.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use core::time::Duration;

use linkedbench::app::events::BenchEvent;
use linkedbench::app::ports::{
    ChimePort, DisplayPort, EventRelay, EventSink, IndicatorPort, RelayError, SensorPort, SinkError,
};
use linkedbench::app::service::BenchController;
use linkedbench::diagnostics::HealthSnapshot;
use linkedbench::drivers::buzzer::Chime;
use linkedbench::drivers::pattern::PatternSpec;
use linkedbench::error::SensorError;
use linkedbench::events::{EventConsumer, event_queue};
use linkedbench::fsm::OccupancyPolicy;

// ── Output call record ────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum OutputCall {
    Pattern(PatternSpec),
    Show(String, String),
    Clear,
    Chime(Chime),
    Silence,
}

// ── MockOutputs ───────────────────────────────────────────────

#[derive(Default)]
pub struct MockOutputs {
    pub calls: Vec<OutputCall>,
}

#[allow(dead_code)]
impl MockOutputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pattern(&self) -> Option<PatternSpec> {
        self.calls.iter().rev().find_map(|c| match c {
            OutputCall::Pattern(p) => Some(*p),
            _ => None,
        })
    }

    pub fn line2(&self) -> Option<&str> {
        self.calls.iter().rev().find_map(|c| match c {
            OutputCall::Show(_, l2) => Some(l2.as_str()),
            _ => None,
        })
    }

    pub fn chimes(&self) -> Vec<Chime> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                OutputCall::Chime(ch) => Some(*ch),
                _ => None,
            })
            .collect()
    }
}

impl IndicatorPort for MockOutputs {
    fn set_pattern(&mut self, spec: PatternSpec) {
        self.calls.push(OutputCall::Pattern(spec));
    }
}

impl DisplayPort for MockOutputs {
    fn show(&mut self, line1: &str, line2: &str) {
        self.calls.push(OutputCall::Show(line1.to_owned(), line2.to_owned()));
    }

    fn clear_display(&mut self) {
        self.calls.push(OutputCall::Clear);
    }
}

impl ChimePort for MockOutputs {
    fn chime(&mut self, chime: Chime) {
        self.calls.push(OutputCall::Chime(chime));
    }

    fn silence(&mut self) {
        self.calls.push(OutputCall::Silence);
    }
}

// ── ScriptedSensors ───────────────────────────────────────────

/// Replays scripted debounced levels; the last entry repeats.
pub struct ScriptedSensors {
    seats: VecDeque<Vec<bool>>,
    buttons: VecDeque<bool>,
    last_seats: Vec<bool>,
    last_button: bool,
    pub fail_seats: bool,
}

#[allow(dead_code)]
impl ScriptedSensors {
    pub fn new(seat_count: usize) -> Self {
        Self {
            seats: VecDeque::new(),
            buttons: VecDeque::new(),
            last_seats: vec![false; seat_count],
            last_button: false,
            fail_seats: false,
        }
    }

    pub fn push_seats(&mut self, seats: &[bool]) -> &mut Self {
        self.seats.push_back(seats.to_vec());
        self
    }

    pub fn push_button(&mut self, pressed: bool) -> &mut Self {
        self.buttons.push_back(pressed);
        self
    }
}

impl SensorPort for ScriptedSensors {
    fn read_seats(&mut self, _now: Duration) -> Result<Vec<bool>, SensorError> {
        if self.fail_seats {
            return Err(SensorError::ReadFailed {
                input: "seat1",
                reason: "scripted fault".into(),
            });
        }
        if let Some(next) = self.seats.pop_front() {
            self.last_seats = next;
        }
        Ok(self.last_seats.clone())
    }

    fn read_mode_button(&mut self, _now: Duration) -> Result<bool, SensorError> {
        if let Some(next) = self.buttons.pop_front() {
            self.last_button = next;
        }
        Ok(self.last_button)
    }
}

// ── Sinks / relay ─────────────────────────────────────────────

/// Sink that keeps every event it sees; optionally fails after recording.
#[derive(Clone, Default)]
pub struct RecordingSink {
    pub seen: Arc<Mutex<Vec<BenchEvent>>>,
    pub fail: bool,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn events(&self) -> Vec<BenchEvent> {
        self.seen.lock().unwrap().clone()
    }
}

impl EventSink for RecordingSink {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn emit(&mut self, event: &BenchEvent) -> Result<(), SinkError> {
        self.seen.lock().unwrap().push(event.clone());
        if self.fail {
            Err(RelayError::NotConnected.into())
        } else {
            Ok(())
        }
    }
}

#[derive(Default)]
pub struct RecordingRelay {
    pub events: Mutex<Vec<BenchEvent>>,
    pub statuses: Mutex<Vec<HealthSnapshot>>,
}

impl EventRelay for RecordingRelay {
    fn publish(&self, event: &BenchEvent) -> Result<(), RelayError> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }

    fn publish_status(&self, snapshot: &HealthSnapshot) -> Result<(), RelayError> {
        self.statuses.lock().unwrap().push(snapshot.clone());
        Ok(())
    }
}

// ── Fixtures ──────────────────────────────────────────────────

pub type MockBench = BenchController<MockOutputs>;

/// Two-seat bench with mock outputs, already started.
pub fn bench(policy: OccupancyPolicy) -> (MockBench, EventConsumer) {
    let (tx, rx) = event_queue();
    let ctl = BenchController::new("TEST_BENCH", policy, 2, MockOutputs::new(), tx);
    ctl.start();
    (ctl, rx)
}

/// Everything queued so far.
pub fn drain(rx: &EventConsumer) -> Vec<BenchEvent> {
    std::iter::from_fn(|| rx.try_next()).collect()
}
