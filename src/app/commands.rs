//! Inbound requests to the control surface and their replies.
//!
//! Requests arrive as JSON objects tagged by `op`:
//!
//! ```text
//! {"op":"status"}
//! {"op":"set_mode","mode":2}
//! {"op":"events","event_type":"occupation","limit":20}
//! {"op":"event","id":7}
//! {"op":"stats","days":7}
//! ```
//!
//! `mode` is kept as a raw JSON value so the control surface, not serde,
//! decides what counts as a valid mode.

use serde::{Deserialize, Serialize};

use super::events::BenchStatus;
use super::ports::{EventStats, QueryFilter, StoredEvent};

/// Requests that external adapters can send into the bench controller.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ControlRequest {
    /// Current status snapshot.
    Status,

    /// Remote mode change.
    SetMode {
        #[serde(default)]
        mode: serde_json::Value,
    },

    /// Recent events from the log store.
    Events {
        #[serde(flatten)]
        filter: QueryFilter,
    },

    /// A single stored event.
    Event { id: i64 },

    /// Per-type / per-mode counts over a window.
    Stats {
        #[serde(default)]
        bench_id: Option<String>,
        #[serde(default = "default_stats_days")]
        days: u32,
    },
}

fn default_stats_days() -> u32 {
    7
}

/// Reply to a [`ControlRequest`]; serialised without a wrapper.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ControlResponse {
    Status(BenchStatus),
    Events { events: Vec<StoredEvent>, count: usize },
    Event(StoredEvent),
    Stats(EventStats),
    Error { error: String },
}

impl ControlResponse {
    pub fn error(msg: impl Into<String>) -> Self {
        Self::Error { error: msg.into() }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}
