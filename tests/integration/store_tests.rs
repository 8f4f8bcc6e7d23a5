//! SQLite event log: filters, paging, statistics and retention.

use chrono::{Duration as ChronoDuration, Local};

use linkedbench::adapters::event_store::SqliteEventLog;
use linkedbench::app::events::{BenchEvent, EventType};
use linkedbench::app::ports::{EventLog, MAX_QUERY_LIMIT, QueryFilter};

fn event(bench: &str, t: EventType, mode: Option<(u8, &str)>, age_days: i64) -> BenchEvent {
    BenchEvent {
        event_type: t,
        bench_id: bench.into(),
        mode: mode.map(|(c, _)| c),
        mode_name: mode.map(|(_, n)| n.to_owned()),
        seats: None,
        timestamp: Local::now() - ChronoDuration::days(age_days),
    }
}

fn seeded() -> SqliteEventLog {
    let db = SqliteEventLog::open_in_memory().unwrap();
    db.append(&event("A", EventType::Occupation, Some((0, "Empty")), 3)).unwrap();
    db.append(&event("A", EventType::ModeChange, Some((1, "Studying")), 2)).unwrap();
    db.append(&event("A", EventType::Vacation, None, 1)).unwrap();
    db.append(&event("B", EventType::Occupation, Some((0, "Empty")), 0)).unwrap();
    db.append(&event("B", EventType::ModeChangeRemote, Some((1, "Studying")), 0)).unwrap();
    db
}

#[test]
fn query_orders_newest_first() {
    let db = seeded();
    let all = db.query(&QueryFilter::default()).unwrap();
    assert_eq!(all.len(), 5);
    assert_eq!(all[0].event_type, "mode_change_remote");
    assert_eq!(all[4].event_type, "occupation");
    assert_eq!(all[4].bench_id, "A");
}

#[test]
fn query_filters_by_bench_and_type() {
    let db = seeded();
    let filter = QueryFilter {
        bench_id: Some("A".into()),
        ..QueryFilter::default()
    };
    assert_eq!(db.query(&filter).unwrap().len(), 3);

    let filter = QueryFilter {
        event_type: Some(EventType::Occupation),
        ..QueryFilter::default()
    };
    let rows = db.query(&filter).unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.event_type == "occupation"));
}

#[test]
fn query_pages_and_clamps_limit() {
    let db = seeded();
    let page = |limit, offset| {
        db.query(&QueryFilter {
            limit,
            offset,
            ..QueryFilter::default()
        })
        .unwrap()
    };
    assert_eq!(page(2, 0).len(), 2);
    assert_eq!(page(2, 4).len(), 1);
    assert_eq!(page(0, 0).len(), 1, "zero limit is raised to one");
    assert_eq!(page(u32::MAX, 0).len(), 5);
    assert_eq!(
        QueryFilter {
            limit: u32::MAX,
            ..QueryFilter::default()
        }
        .effective_limit(),
        MAX_QUERY_LIMIT
    );
}

#[test]
fn stats_count_by_type_and_mode_within_window() {
    let db = seeded();
    db.append(&event("A", EventType::Occupation, Some((0, "Empty")), 30)).unwrap();

    let week = db.stats(None, 7).unwrap();
    assert_eq!(week.total, 5);
    assert_eq!(week.period_days, 7);
    assert_eq!(week.by_type.get("occupation"), Some(&2));
    assert_eq!(week.by_mode.get("Studying"), Some(&2));
    assert_eq!(week.by_mode.get("Empty"), Some(&2));

    let bench_b = db.stats(Some("B"), 7).unwrap();
    assert_eq!(bench_b.total, 2);

    let clamped = db.stats(None, 10_000).unwrap();
    assert_eq!(clamped.period_days, 365);
    assert_eq!(clamped.total, 6);
}

#[test]
fn stored_payload_keeps_the_event_fields() {
    let db = SqliteEventLog::open_in_memory().unwrap();
    let mut ev = event("S", EventType::ModeChange, Some((4, "Study buddy")), 0);
    ev.seats = Some(2);
    let id = db.append(&ev).unwrap();

    let stored = db.get(id).unwrap().unwrap();
    assert_eq!(stored.seats, Some(2));
    assert_eq!(stored.mode_name.as_deref(), Some("Study buddy"));
    assert_eq!(stored.recorded_ms, ev.timestamp.timestamp_millis());
}

#[test]
fn file_backed_log_survives_reopen() {
    let path = std::env::temp_dir().join(format!("linkedbench-store-{}.db", std::process::id()));
    let _ = std::fs::remove_file(&path);
    {
        let db = SqliteEventLog::open(&path).unwrap();
        db.append(&event("F", EventType::Occupation, None, 0)).unwrap();
    }
    let db = SqliteEventLog::open(&path).unwrap();
    assert_eq!(db.query(&QueryFilter::default()).unwrap().len(), 1);
    drop(db);
    std::fs::remove_file(&path).unwrap();
}
