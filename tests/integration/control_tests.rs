//! Control surface and console: validation, remote rules, history queries.

use core::sync::atomic::AtomicBool;
use std::io::Cursor;
use std::sync::Arc;

use linkedbench::adapters::console;
use linkedbench::adapters::event_store::SqliteEventLog;
use linkedbench::app::commands::{ControlRequest, ControlResponse};
use linkedbench::app::control::ControlSurface;
use linkedbench::app::events::EventType;
use linkedbench::app::ports::{EventLog, QueryFilter};
use linkedbench::drivers::buzzer::Chime;
use linkedbench::error::ControlError;
use linkedbench::fsm::{Mode, OccupancyPolicy};
use serde_json::{Value, json};

use crate::mock_hw::{MockOutputs, bench, drain};

fn surface(policy: OccupancyPolicy) -> (ControlSurface<MockOutputs>, linkedbench::events::EventConsumer) {
    let (ctl, rx) = bench(policy);
    (ControlSurface::new(Arc::new(ctl)), rx)
}

fn ask(surface: &ControlSurface<MockOutputs>, request: Value) -> Value {
    serde_json::from_str(&surface.handle_json(&request.to_string())).unwrap()
}

// ── Status ────────────────────────────────────────────────────

#[test]
fn status_reports_snapshot() {
    let (s, _rx) = surface(OccupancyPolicy::Binary);
    let status = s.get_status();
    assert_eq!(status.bench_id, "TEST_BENCH");
    assert!(!status.occupied);
    assert_eq!(status.mode, 0);
    assert_eq!(status.mode_name, "Empty");

    let reply = ask(&s, json!({"op": "status"}));
    assert_eq!(reply["bench_id"], "TEST_BENCH");
    assert_eq!(reply["policy"], "binary");
    assert_eq!(reply["occupied"], false);
}

// ── Remote mode changes ───────────────────────────────────────

#[test]
fn remote_set_mode_on_empty_bench_is_rejected_without_mutation() {
    let (s, rx) = surface(OccupancyPolicy::Binary);
    assert_eq!(s.set_mode(2), Err(ControlError::BenchEmpty));
    assert_eq!(s.get_status().mode, 0);
    assert!(drain(&rx).is_empty());

    let reply = ask(&s, json!({"op": "set_mode", "mode": 2}));
    assert_eq!(reply["error"], "cannot set mode while bench is empty");
}

#[test]
fn remote_set_mode_validates_the_code() {
    let (ctl, rx) = bench(OccupancyPolicy::Binary);
    ctl.apply_seats(&[true, false]);
    drain(&rx);
    let s = ControlSurface::new(Arc::new(ctl));

    assert_eq!(s.set_mode(9), Err(ControlError::InvalidMode(9)));
    assert_eq!(s.set_mode(-1), Err(ControlError::InvalidMode(-1)));
    assert_eq!(s.set_mode(0), Err(ControlError::NotSelectable(Mode::Empty)));

    let reply = ask(&s, json!({"op": "set_mode", "mode": "studying"}));
    assert_eq!(reply["error"], "mode must be an integer");
    let reply = ask(&s, json!({"op": "set_mode"}));
    assert_eq!(reply["error"], "mode must be an integer");

    assert!(drain(&rx).is_empty(), "rejections emit nothing");
}

#[test]
fn remote_set_mode_on_occupied_bench_emits_remote_event() {
    let (ctl, rx) = bench(OccupancyPolicy::Binary);
    ctl.apply_seats(&[true, false]);
    drain(&rx);
    let ctl = Arc::new(ctl);
    let s = ControlSurface::new(Arc::clone(&ctl));

    let status = s.set_mode(2).unwrap();
    assert_eq!(status.mode, 2);
    assert_eq!(status.mode_name, "Open to chat");

    // Same mode again still reports the request.
    s.set_mode(2).unwrap();

    let events = drain(&rx);
    assert_eq!(events.len(), 2);
    for ev in &events {
        assert_eq!(ev.event_type, EventType::ModeChangeRemote);
        assert_eq!(ev.mode, Some(2));
    }
    ctl.with_outputs(|o| {
        assert_eq!(o.chimes(), vec![Chime::Startup, Chime::Short], "remote changes are silent");
        assert_eq!(o.line2(), Some("Open to chat"));
    });
}

#[test]
fn seat_count_remote_rules() {
    let (ctl, rx) = bench(OccupancyPolicy::SeatCount);
    let ctl = Arc::new(ctl);
    let s = ControlSurface::new(Arc::clone(&ctl));

    ctl.apply_seats(&[true, true]);
    assert_eq!(s.set_mode(2), Err(ControlError::ModeLocked { seats: 2 }));

    ctl.apply_seats(&[true, false]);
    assert_eq!(s.set_mode(4), Err(ControlError::NotSelectable(Mode::StudyBuddy)));
    assert_eq!(s.set_mode(5), Err(ControlError::InvalidMode(5)));

    let status = s.set_mode(3).unwrap();
    assert_eq!(status.mode_name, "Open to chat");
    let last = drain(&rx).pop().unwrap();
    assert_eq!(last.event_type, EventType::ModeChangeRemote);
    assert_eq!(last.mode, Some(3));
}

// ── History queries ───────────────────────────────────────────

#[test]
fn history_requests_need_an_event_log() {
    let (s, _rx) = surface(OccupancyPolicy::Binary);
    let reply = s.handle(ControlRequest::Event { id: 1 });
    assert_eq!(reply, ControlResponse::error("event log unavailable"));
}

#[test]
fn history_requests_read_the_store() {
    let (ctl, rx) = bench(OccupancyPolicy::Binary);
    ctl.apply_seats(&[true, false]);
    ctl.press_mode_button().unwrap();
    ctl.apply_seats(&[false, false]);

    let store = Arc::new(SqliteEventLog::open_in_memory().unwrap());
    for ev in drain(&rx) {
        store.append(&ev).unwrap();
    }
    let log: Arc<dyn EventLog> = store.clone();
    let s = ControlSurface::new(Arc::new(ctl)).with_event_log(log);

    let reply = ask(&s, json!({"op": "events", "limit": 2}));
    assert_eq!(reply["count"], 2);
    assert_eq!(reply["events"][0]["event_type"], "vacation");

    let reply = ask(&s, json!({"op": "events", "event_type": "occupation"}));
    assert_eq!(reply["count"], 1);

    let first = store.query(&QueryFilter::default()).unwrap().pop().unwrap();
    let reply = ask(&s, json!({"op": "event", "id": first.id}));
    assert_eq!(reply["event_type"], "occupation");

    let reply = ask(&s, json!({"op": "event", "id": 424242}));
    assert_eq!(reply["error"], "Event not found");

    let reply = ask(&s, json!({"op": "stats", "days": 7}));
    assert_eq!(reply["total"], 3);
    assert_eq!(reply["by_type"]["mode_change"], 1);
    assert_eq!(reply["period_days"], 7);
}

// ── Console ───────────────────────────────────────────────────

#[test]
fn console_answers_one_line_per_request() {
    let (s, _rx) = surface(OccupancyPolicy::Binary);
    let input = Cursor::new("{\"op\":\"status\"}\n\n{not json\n");
    let mut output = Vec::new();
    let running = AtomicBool::new(true);

    let handled = console::serve(&s, input, &mut output, &running).unwrap();
    assert_eq!(handled, 2);

    let text = String::from_utf8(output).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    let status: Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(status["bench_id"], "TEST_BENCH");
    let error: Value = serde_json::from_str(lines[1]).unwrap();
    assert!(error["error"].as_str().unwrap().starts_with("bad request"));
}

#[test]
fn console_stops_when_not_running() {
    let (s, _rx) = surface(OccupancyPolicy::Binary);
    let running = AtomicBool::new(false);
    let mut output = Vec::new();
    let handled =
        console::serve(&s, Cursor::new("{\"op\":\"status\"}\n"), &mut output, &running).unwrap();
    assert_eq!(handled, 0);
    assert!(output.is_empty());
}
