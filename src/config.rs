//! System configuration parameters
//!
//! All tunable parameters for the bench controller.  Built-in defaults can
//! be overridden by a JSON file (`--config`), and selected fields again by
//! CLI flags / environment variables in `main`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::fsm::OccupancyPolicy;
use crate::pins;

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    // --- Identity ---
    /// Bench identifier carried on every event
    pub bench_id: String,
    /// Seat → mode rule set
    pub policy: OccupancyPolicy,

    // --- Timing ---
    /// Sensor poll cadence (milliseconds)
    pub poll_interval_ms: u64,
    /// Input debounce interval (milliseconds)
    pub debounce_ms: u64,
    /// Pause after a sensor read fault (milliseconds)
    pub sensor_fault_backoff_ms: u64,
    /// Drain-loop queue wait; bounds shutdown latency (milliseconds)
    pub queue_wait_ms: u64,
    /// Health snapshot interval (seconds)
    pub health_interval_secs: u64,

    // --- Feedback ---
    /// Binary policy: beep when the button is pressed on an empty bench
    pub error_chime_when_empty: bool,

    // --- Storage ---
    /// SQLite event log location
    pub database_path: PathBuf,
    /// Events older than this are pruned at startup (days)
    pub retention_days: u32,

    // --- Hardware ---
    pub pins: PinConfig,
    pub display: DisplayConfig,

    // --- Relay ---
    /// MQTT relay; `None` disables remote publishing
    pub mqtt: Option<MqttConfig>,
}

/// One pressure plate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatPins {
    pub input: u32,
    /// Plate LED following the raw switch level
    #[serde(default)]
    pub feedback_led: Option<u32>,
}

/// GPIO assignments (BCM numbering).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PinConfig {
    pub seats: Vec<SeatPins>,
    pub seat_active_low: bool,
    pub mode_button: u32,
    pub mode_button_active_low: bool,
    pub indicator: u32,
    pub buzzer: u32,
}

/// Character LCD on I2C.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub enabled: bool,
    pub i2c_bus: u8,
    pub address: u8,
}

/// MQTT broker connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    pub host: String,
    pub port: u16,
    pub keep_alive_secs: u64,
    /// Defaults to `linkedbench_<bench_id>`
    pub client_id: Option<String>,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            bench_id: "BENCH_001".into(),
            policy: OccupancyPolicy::Binary,

            // Timing
            poll_interval_ms: 100, // 10 Hz
            debounce_ms: 50,
            sensor_fault_backoff_ms: 1000,
            queue_wait_ms: 1000,
            health_interval_secs: 60, // 1/min

            error_chime_when_empty: false,

            // Storage
            database_path: PathBuf::from("linkedbench.db"),
            retention_days: 30,

            pins: PinConfig::default(),
            display: DisplayConfig::default(),
            mqtt: None,
        }
    }
}

impl Default for PinConfig {
    fn default() -> Self {
        Self {
            seats: vec![
                SeatPins {
                    input: pins::SEAT1_INPUT,
                    feedback_led: Some(pins::SEAT1_LED),
                },
                SeatPins {
                    input: pins::SEAT2_INPUT,
                    feedback_led: Some(pins::SEAT2_LED),
                },
            ],
            seat_active_low: pins::SEAT_ACTIVE_LOW,
            mode_button: pins::MODE_BUTTON,
            mode_button_active_low: pins::MODE_BUTTON_ACTIVE_LOW,
            indicator: pins::INDICATOR_LED,
            buzzer: pins::BUZZER,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            i2c_bus: pins::LCD_I2C_BUS,
            address: pins::LCD_I2C_ADDRESS,
        }
    }
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 1883,
            keep_alive_secs: 60,
            client_id: None,
        }
    }
}

impl MqttConfig {
    pub fn client_id_for(&self, bench_id: &str) -> String {
        self.client_id
            .clone()
            .unwrap_or_else(|| format!("linkedbench_{bench_id}"))
    }
}

impl PinConfig {
    /// Every GPIO line in use.
    pub fn all_lines(&self) -> Vec<u32> {
        let mut lines: Vec<u32> = self
            .seats
            .iter()
            .flat_map(|s| std::iter::once(s.input).chain(s.feedback_led))
            .collect();
        lines.extend([self.mode_button, self.indicator, self.buzzer]);
        lines
    }
}

impl SystemConfig {
    /// Defaults overlaid with the JSON file at `path`.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&text).map_err(ConfigError::Parse)
    }

    /// Reject values the controller cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bench_id.trim().is_empty() {
            return Err(ConfigError::ValidationFailed("bench_id must not be empty"));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed("poll_interval_ms must be > 0"));
        }
        if self.queue_wait_ms == 0 {
            return Err(ConfigError::ValidationFailed("queue_wait_ms must be > 0"));
        }
        if self.health_interval_secs == 0 {
            return Err(ConfigError::ValidationFailed("health_interval_secs must be > 0"));
        }
        if self.sensor_fault_backoff_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "sensor_fault_backoff_ms must be > 0",
            ));
        }
        if self.debounce_ms > 5000 {
            return Err(ConfigError::ValidationFailed("debounce_ms must be <= 5000"));
        }
        if self.pins.seats.is_empty() {
            return Err(ConfigError::ValidationFailed("at least one seat is required"));
        }
        if self.pins.seats.len() > usize::from(u8::MAX) {
            return Err(ConfigError::ValidationFailed("too many seats"));
        }
        let mut lines = self.pins.all_lines();
        lines.sort_unstable();
        if lines.windows(2).any(|w| w[0] == w[1]) {
            return Err(ConfigError::ValidationFailed("GPIO line assigned twice"));
        }
        if let Some(mqtt) = &self.mqtt {
            if mqtt.host.trim().is_empty() {
                return Err(ConfigError::ValidationFailed("mqtt.host must not be empty"));
            }
        }
        Ok(())
    }
}
