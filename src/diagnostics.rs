//! Health reporting.
//!
//! Every `health_interval_secs` the health task builds a [`HealthSnapshot`]
//! (CPU temperature + occupancy) and publishes it on the relay's status
//! channel.  It runs on its own thread, independent of the event queue,
//! and polls the running flag at least once per second so shutdown is
//! never held up by a long interval.

use core::sync::atomic::{AtomicBool, Ordering};
use core::time::Duration;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::app::ports::EventRelay;

/// Linux thermal zone reporting millidegrees Celsius.
pub const CPU_TEMP_PATH: &str = "/sys/class/thermal/thermal_zone0/temp";

/// Granularity at which the health loop re-checks the running flag.
const STOP_POLL: Duration = Duration::from_secs(1);

/// Periodic health record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthSnapshot {
    pub bench_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// Degrees Celsius; 0.0 when unavailable.
    pub cpu_temp: f32,
    pub occupied: bool,
    pub uptime_secs: u64,
    pub timestamp: DateTime<Local>,
}

impl HealthSnapshot {
    pub fn new(bench_id: &str, cpu_temp: f32, occupied: bool, uptime_secs: u64) -> Self {
        Self {
            bench_id: bench_id.to_owned(),
            kind: "system_health".into(),
            cpu_temp,
            occupied,
            uptime_secs,
            timestamp: Local::now(),
        }
    }
}

/// Parse a sysfs thermal reading (millidegrees) into degrees.
pub fn parse_millidegrees(raw: &str) -> Option<f32> {
    raw.trim().parse::<i64>().ok().map(|m| m as f32 / 1000.0)
}

/// Read the CPU temperature, 0.0 if the zone is missing or unreadable.
pub fn read_cpu_temp(path: &Path) -> f32 {
    match std::fs::read_to_string(path) {
        Ok(raw) => parse_millidegrees(&raw).unwrap_or_else(|| {
            log::debug!("Unparseable thermal reading '{}'", raw.trim());
            0.0
        }),
        Err(e) => {
            log::debug!("CPU temperature unavailable ({}): {}", path.display(), e);
            0.0
        }
    }
}

/// Periodic health publisher.
pub struct HealthMonitor<R: ?Sized> {
    bench_id: String,
    interval: Duration,
    temp_path: PathBuf,
    relay: Arc<R>,
}

impl<R: EventRelay + ?Sized> HealthMonitor<R> {
    pub fn new(bench_id: impl Into<String>, interval: Duration, relay: Arc<R>) -> Self {
        Self {
            bench_id: bench_id.into(),
            interval,
            temp_path: PathBuf::from(CPU_TEMP_PATH),
            relay,
        }
    }

    /// Read temperature from `path` instead of the default thermal zone.
    #[must_use]
    pub fn with_temp_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.temp_path = path.into();
        self
    }

    /// Build and publish one snapshot. Failures are logged, not returned.
    pub fn publish_once(&self, occupied: bool, uptime_secs: u64) -> HealthSnapshot {
        let snapshot = HealthSnapshot::new(
            &self.bench_id,
            read_cpu_temp(&self.temp_path),
            occupied,
            uptime_secs,
        );
        match self.relay.publish_status(&snapshot) {
            Ok(()) => log::debug!("Health published (cpu {:.1}°C)", snapshot.cpu_temp),
            Err(e) => log::warn!("Health publish failed: {}", e),
        }
        snapshot
    }

    /// Publish every interval until `running` clears.
    ///
    /// `probe` returns `(occupied, uptime_secs)` at publish time.
    pub fn run(&self, running: &AtomicBool, mut probe: impl FnMut() -> (bool, u64)) {
        let mut next = Instant::now() + self.interval;
        while running.load(Ordering::Acquire) {
            let now = Instant::now();
            if now >= next {
                let (occupied, uptime) = probe();
                self.publish_once(occupied, uptime);
                next = now + self.interval;
            }
            std::thread::sleep(STOP_POLL.min(next.saturating_duration_since(now)));
        }
        log::info!("Health monitor stopped");
    }
}
