//! Control/status surface.
//!
//! The only public way into the controller from outside the process.
//! Input is validated here (type and range of the mode code) before the
//! state machine sees it; the state machine then applies its own
//! occupancy rules.

use std::sync::Arc;

use super::commands::{ControlRequest, ControlResponse};
use super::events::BenchStatus;
use super::ports::{ChimePort, DisplayPort, EventLog, IndicatorPort};
use super::service::BenchController;
use crate::error::ControlError;

pub struct ControlSurface<H> {
    controller: Arc<BenchController<H>>,
    log: Option<Arc<dyn EventLog>>,
}

impl<H> Clone for ControlSurface<H> {
    fn clone(&self) -> Self {
        Self {
            controller: Arc::clone(&self.controller),
            log: self.log.clone(),
        }
    }
}

impl<H: IndicatorPort + DisplayPort + ChimePort> ControlSurface<H> {
    pub fn new(controller: Arc<BenchController<H>>) -> Self {
        Self {
            controller,
            log: None,
        }
    }

    /// Expose event history queries from `log`.
    #[must_use]
    pub fn with_event_log(mut self, log: Arc<dyn EventLog>) -> Self {
        self.log = Some(log);
        self
    }

    pub fn get_status(&self) -> BenchStatus {
        self.controller.status()
    }

    /// Set the mode by its numeric code under the active policy.
    pub fn set_mode(&self, code: i64) -> Result<BenchStatus, ControlError> {
        let mode = self
            .controller
            .policy()
            .mode_from_code(code)
            .ok_or(ControlError::InvalidMode(code))?;
        self.controller.set_mode(mode)
    }

    /// Dispatch one decoded request.
    pub fn handle(&self, request: ControlRequest) -> ControlResponse {
        match request {
            ControlRequest::Status => ControlResponse::Status(self.get_status()),
            ControlRequest::SetMode { mode } => match mode.as_i64() {
                Some(code) => match self.set_mode(code) {
                    Ok(status) => ControlResponse::Status(status),
                    Err(e) => ControlResponse::error(e.to_string()),
                },
                None => ControlResponse::error("mode must be an integer"),
            },
            ControlRequest::Events { filter } => {
                let Some(log) = &self.log else {
                    return ControlResponse::error("event log unavailable");
                };
                match log.query(&filter) {
                    Ok(events) => ControlResponse::Events {
                        count: events.len(),
                        events,
                    },
                    Err(e) => ControlResponse::error(e.to_string()),
                }
            }
            ControlRequest::Event { id } => {
                let Some(log) = &self.log else {
                    return ControlResponse::error("event log unavailable");
                };
                match log.get(id) {
                    Ok(Some(event)) => ControlResponse::Event(event),
                    Ok(None) => ControlResponse::error("Event not found"),
                    Err(e) => ControlResponse::error(e.to_string()),
                }
            }
            ControlRequest::Stats { bench_id, days } => {
                let Some(log) = &self.log else {
                    return ControlResponse::error("event log unavailable");
                };
                match log.stats(bench_id.as_deref(), days) {
                    Ok(stats) => ControlResponse::Stats(stats),
                    Err(e) => ControlResponse::error(e.to_string()),
                }
            }
        }
    }

    /// Decode one JSON request line and encode the reply.
    pub fn handle_json(&self, line: &str) -> String {
        let response = match serde_json::from_str::<ControlRequest>(line) {
            Ok(request) => self.handle(request),
            Err(e) => ControlResponse::error(format!("bad request: {e}")),
        };
        serde_json::to_string(&response)
            .unwrap_or_else(|e| format!(r#"{{"error":"encode failed: {e}"}}"#))
    }
}
