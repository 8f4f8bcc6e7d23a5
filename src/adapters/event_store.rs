//! SQLite event log.
//!
//! Implements [`EventLog`] on a single `rusqlite` connection behind a
//! mutex.  Only the drain task writes; the console reads.  Windows and
//! pruning use `recorded_ms`, the event's own timestamp in epoch millis.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Local};
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::app::events::BenchEvent;
use crate::app::ports::{
    EventLog, EventSink, EventStats, MAX_STATS_DAYS, QueryFilter, SinkError, StoreError,
    StoredEvent,
};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS events (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        bench_id    TEXT    NOT NULL,
        event_type  TEXT    NOT NULL,
        mode        INTEGER,
        mode_name   TEXT,
        seats       INTEGER,
        timestamp   TEXT    NOT NULL,
        recorded_ms INTEGER NOT NULL,
        data        TEXT    NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_events_bench    ON events(bench_id);
    CREATE INDEX IF NOT EXISTS idx_events_type     ON events(event_type);
    CREATE INDEX IF NOT EXISTS idx_events_recorded ON events(recorded_ms DESC);
"#;

const SELECT_COLUMNS: &str =
    "SELECT id, bench_id, event_type, mode, mode_name, seats, timestamp, recorded_ms FROM events";

pub struct SqliteEventLog {
    conn: Mutex<Connection>,
}

impl SqliteEventLog {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn window_start_ms(days: u32) -> i64 {
        (Local::now() - ChronoDuration::days(i64::from(days))).timestamp_millis()
    }
}

fn map_row(row: &Row<'_>) -> rusqlite::Result<StoredEvent> {
    Ok(StoredEvent {
        id: row.get(0)?,
        bench_id: row.get(1)?,
        event_type: row.get(2)?,
        mode: row.get(3)?,
        mode_name: row.get(4)?,
        seats: row.get(5)?,
        timestamp: row.get(6)?,
        recorded_ms: row.get(7)?,
    })
}

impl EventLog for SqliteEventLog {
    fn append(&self, event: &BenchEvent) -> Result<i64, StoreError> {
        let data = event.to_json().map_err(StoreError::Serialize)?;
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO events (bench_id, event_type, mode, mode_name, seats, timestamp, recorded_ms, data)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                event.bench_id,
                event.event_type.as_str(),
                event.mode,
                event.mode_name,
                event.seats,
                event.timestamp.to_rfc3339(),
                event.timestamp.timestamp_millis(),
                data,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn query(&self, filter: &QueryFilter) -> Result<Vec<StoredEvent>, StoreError> {
        let sql = format!(
            "{SELECT_COLUMNS}
             WHERE (?1 IS NULL OR bench_id = ?1)
               AND (?2 IS NULL OR event_type = ?2)
             ORDER BY recorded_ms DESC, id DESC
             LIMIT ?3 OFFSET ?4"
        );
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params![
                filter.bench_id,
                filter.event_type.map(|t| t.as_str()),
                filter.effective_limit(),
                filter.offset,
            ],
            map_row,
        )?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn get(&self, id: i64) -> Result<Option<StoredEvent>, StoreError> {
        let conn = self.conn.lock();
        let event = conn
            .query_row(&format!("{SELECT_COLUMNS} WHERE id = ?1"), [id], map_row)
            .optional()?;
        Ok(event)
    }

    fn stats(&self, bench_id: Option<&str>, days: u32) -> Result<EventStats, StoreError> {
        let days = days.clamp(1, MAX_STATS_DAYS);
        let since = Self::window_start_ms(days);
        let conn = self.conn.lock();

        let mut stats = EventStats {
            period_days: days,
            ..EventStats::default()
        };

        let mut by_type = conn.prepare(
            "SELECT event_type, COUNT(*) FROM events
             WHERE recorded_ms >= ?1 AND (?2 IS NULL OR bench_id = ?2)
             GROUP BY event_type",
        )?;
        let rows = by_type.query_map(params![since, bench_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;
        let mut type_counts = BTreeMap::new();
        for row in rows {
            let (kind, count) = row?;
            stats.total += count as u64;
            type_counts.insert(kind, count as u64);
        }
        stats.by_type = type_counts;

        let mut by_mode = conn.prepare(
            "SELECT mode_name, COUNT(*) FROM events
             WHERE recorded_ms >= ?1 AND (?2 IS NULL OR bench_id = ?2)
               AND mode_name IS NOT NULL
             GROUP BY mode_name",
        )?;
        let rows = by_mode.query_map(params![since, bench_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;
        for row in rows {
            let (mode, count) = row?;
            stats.by_mode.insert(mode, count as u64);
        }

        Ok(stats)
    }

    fn prune(&self, days: u32) -> Result<usize, StoreError> {
        let cutoff = Self::window_start_ms(days);
        let conn = self.conn.lock();
        let removed = conn.execute("DELETE FROM events WHERE recorded_ms < ?1", [cutoff])?;
        if removed > 0 {
            log::info!("Pruned {} event(s) older than {} days", removed, days);
        }
        Ok(removed)
    }
}

/// Drain-side adapter appending every event to an [`EventLog`].
pub struct StoreSink<L: ?Sized> {
    log: Arc<L>,
}

impl<L: EventLog + ?Sized> StoreSink<L> {
    pub fn new(log: Arc<L>) -> Self {
        Self { log }
    }
}

impl<L: EventLog + ?Sized> EventSink for StoreSink<L> {
    fn name(&self) -> &'static str {
        "store"
    }

    fn emit(&mut self, event: &BenchEvent) -> Result<(), SinkError> {
        let id = self.log.append(event)?;
        log::debug!("Event saved: {} (id {})", event.event_type, id);
        Ok(())
    }
}
