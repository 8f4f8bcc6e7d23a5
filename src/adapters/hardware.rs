//! Hardware adapter: bridges bench peripherals to the domain port traits.
//!
//! [`SeatSensors`] owns the debounced seat switches and the mode button
//! and implements [`SensorPort`].  [`BenchOutputs`] owns the indicator
//! light, the text display and the buzzer and implements the three output
//! ports.  Both are generic over `embedded-hal` pins, so the same code
//! drives sysfs GPIO on the bench and [`SimPin`](super::sim_gpio::SimPin)
//! in simulation and tests.

use core::time::Duration;

use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::i2c::{self, ErrorType, I2c, Operation};
use log::{info, warn};

use crate::app::ports::{ChimePort, DisplayPort, IndicatorPort, SensorPort};
use crate::drivers::buzzer::{Buzzer, Chime};
use crate::drivers::debounce::{DebouncedInput, NoFeedback};
use crate::drivers::lcd::Lcd;
use crate::drivers::pattern::{PatternActuator, PatternSpec};
use crate::error::SensorError;

const SEAT_NAMES: [&str; 8] = [
    "seat1", "seat2", "seat3", "seat4", "seat5", "seat6", "seat7", "seat8",
];

/// Input label for seat `index` (zero-based).
pub fn seat_name(index: usize) -> &'static str {
    SEAT_NAMES.get(index).copied().unwrap_or("seat")
}

// ── SensorPort ────────────────────────────────────────────────

/// Seat switches plus the mode button.
pub struct SeatSensors<I: InputPin, F: OutputPin = NoFeedback> {
    seats: Vec<DebouncedInput<I, F>>,
    button: DebouncedInput<I>,
}

impl<I: InputPin, F: OutputPin> SeatSensors<I, F> {
    pub fn new(seats: Vec<DebouncedInput<I, F>>, button: DebouncedInput<I>) -> Self {
        Self { seats, button }
    }

    pub fn seat_count(&self) -> usize {
        self.seats.len()
    }

    /// Turn every seat feedback LED off.
    pub fn release(&mut self) {
        for seat in &mut self.seats {
            seat.release();
        }
    }
}

impl<I: InputPin, F: OutputPin> SensorPort for SeatSensors<I, F> {
    fn read_seats(&mut self, now: Duration) -> Result<Vec<bool>, SensorError> {
        self.seats.iter_mut().map(|seat| seat.sample(now)).collect()
    }

    fn read_mode_button(&mut self, now: Duration) -> Result<bool, SensorError> {
        self.button.sample(now)
    }
}

impl<I: InputPin, F: OutputPin> Drop for SeatSensors<I, F> {
    fn drop(&mut self) {
        self.release();
    }
}

// ── Output ports ──────────────────────────────────────────────

/// Where status text goes.
pub enum TextDisplay<D> {
    Lcd(Lcd<D>),
    /// No panel attached: lines are written to the log.
    Log,
}

impl<D: I2c> TextDisplay<D> {
    /// Initialise `lcd`, falling back to log output if the panel does
    /// not answer.
    pub fn probe(mut lcd: Lcd<D>) -> Self {
        match lcd.init() {
            Ok(()) => {
                info!("LCD initialised");
                Self::Lcd(lcd)
            }
            Err(e) => {
                warn!("LCD init failed ({:?}), display output goes to the log", e);
                Self::Log
            }
        }
    }
}

/// Bus type for benches without a panel; every transfer fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetachedBus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoDevice;

impl i2c::Error for NoDevice {
    fn kind(&self) -> i2c::ErrorKind {
        i2c::ErrorKind::NoAcknowledge(i2c::NoAcknowledgeSource::Address)
    }
}

impl ErrorType for DetachedBus {
    type Error = NoDevice;
}

impl I2c for DetachedBus {
    fn transaction(&mut self, _address: u8, _operations: &mut [Operation<'_>]) -> Result<(), NoDevice> {
        Err(NoDevice)
    }
}

/// Indicator, display and buzzer behind the output ports.
pub struct BenchOutputs<P: OutputPin + Send + 'static, D: I2c> {
    indicator: PatternActuator<P>,
    display: TextDisplay<D>,
    buzzer: Option<Buzzer>,
}

impl<P: OutputPin + Send + 'static, D: I2c> BenchOutputs<P, D> {
    pub fn new(indicator: PatternActuator<P>, display: TextDisplay<D>, buzzer: Option<Buzzer>) -> Self {
        Self {
            indicator,
            display,
            buzzer,
        }
    }

    pub fn indicator(&self) -> PatternSpec {
        self.indicator.current()
    }

    pub fn has_lcd(&self) -> bool {
        matches!(self.display, TextDisplay::Lcd(_))
    }
}

impl<P: OutputPin + Send + 'static, D: I2c> IndicatorPort for BenchOutputs<P, D> {
    fn set_pattern(&mut self, spec: PatternSpec) {
        self.indicator.set_pattern(spec);
    }
}

impl<P: OutputPin + Send + 'static, D: I2c> DisplayPort for BenchOutputs<P, D> {
    fn show(&mut self, line1: &str, line2: &str) {
        match &mut self.display {
            TextDisplay::Lcd(lcd) => {
                if let Err(e) = lcd.show(line1, line2) {
                    warn!("LCD write failed: {:?}", e);
                }
            }
            TextDisplay::Log => info!("[DISPLAY] {} | {}", line1, line2),
        }
    }

    fn clear_display(&mut self) {
        if let TextDisplay::Lcd(lcd) = &mut self.display {
            if let Err(e) = lcd.clear() {
                warn!("LCD clear failed: {:?}", e);
            }
        }
    }
}

impl<P: OutputPin + Send + 'static, D: I2c> ChimePort for BenchOutputs<P, D> {
    fn chime(&mut self, chime: Chime) {
        match &self.buzzer {
            Some(buzzer) => buzzer.play(chime),
            None => log::debug!("[BUZZER] {:?}", chime),
        }
    }

    fn silence(&mut self) {
        if let Some(buzzer) = &mut self.buzzer {
            buzzer.stop();
        }
    }
}

impl<P: OutputPin + Send + 'static, D: I2c> Drop for BenchOutputs<P, D> {
    fn drop(&mut self) {
        self.indicator.off();
        self.clear_display();
    }
}
