//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing one structured line per bench event
//! to the process log.  Registered first so every event is visible in the
//! journal even when the store or the relay is failing.

use log::info;

use crate::app::events::BenchEvent;
use crate::app::ports::{EventSink, SinkError};

/// Adapter that logs every [`BenchEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

/// `EVENT | type=... bench=... [mode=... (name)] [seats=...] at=...`
pub fn format_event(event: &BenchEvent) -> String {
    let mut line = format!("EVENT | type={} bench={}", event.event_type, event.bench_id);
    if let Some(mode) = event.mode {
        line.push_str(&format!(
            " mode={} ({})",
            mode,
            event.mode_name.as_deref().unwrap_or("?")
        ));
    }
    if let Some(seats) = event.seats {
        line.push_str(&format!(" seats={seats}"));
    }
    line.push_str(&format!(" at={}", event.timestamp.to_rfc3339()));
    line
}

impl EventSink for LogEventSink {
    fn name(&self) -> &'static str {
        "log"
    }

    fn emit(&mut self, event: &BenchEvent) -> Result<(), SinkError> {
        info!("{}", format_event(event));
        Ok(())
    }
}
