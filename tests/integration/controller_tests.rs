//! BenchController → state machine → outputs, against mock hardware.

use core::time::Duration;

use linkedbench::app::events::EventType;
use linkedbench::app::service::BenchController;
use linkedbench::drivers::buzzer::Chime;
use linkedbench::drivers::pattern::PatternSpec;
use linkedbench::error::ControlError;
use linkedbench::events::event_queue;
use linkedbench::fsm::{Mode, ModeCause, OccupancyPolicy, Transition};

use crate::mock_hw::{MockOutputs, ScriptedSensors, bench, drain};

// ── Binary policy ─────────────────────────────────────────────

#[test]
fn start_draws_idle_screen_and_plays_startup() {
    let (ctl, rx) = bench(OccupancyPolicy::Binary);
    ctl.with_outputs(|o| {
        assert_eq!(o.pattern(), Some(PatternSpec::Off));
        assert_eq!(o.line2(), Some("Available"));
        assert_eq!(o.chimes(), vec![Chime::Startup]);
    });
    assert!(drain(&rx).is_empty(), "startup emits no event");
}

#[test]
fn binary_occupation_emits_one_event_with_mode() {
    let (ctl, rx) = bench(OccupancyPolicy::Binary);

    assert_eq!(ctl.apply_seats(&[true, false]), Transition::Occupied);

    let events = drain(&rx);
    assert_eq!(events.len(), 1);
    let ev = &events[0];
    assert_eq!(ev.event_type, EventType::Occupation);
    assert_eq!(ev.bench_id, "TEST_BENCH");
    assert_eq!(ev.mode, Some(0));
    assert_eq!(ev.mode_name.as_deref(), Some("Empty"));
    assert_eq!(ev.seats, None);

    ctl.with_outputs(|o| {
        assert_eq!(o.pattern(), Some(PatternSpec::Solid));
        assert_eq!(o.chimes(), vec![Chime::Startup, Chime::Short]);
    });
}

#[test]
fn binary_button_cycles_social_modes() {
    let (ctl, rx) = bench(OccupancyPolicy::Binary);
    ctl.apply_seats(&[true, false]);
    drain(&rx);

    let mut seen = Vec::new();
    for _ in 0..4 {
        assert_eq!(
            ctl.press_mode_button(),
            Ok(Transition::ModeChanged(ModeCause::Button))
        );
        seen.push(ctl.state().mode());
    }
    assert_eq!(
        seen,
        vec![Mode::Studying, Mode::OpenToChat, Mode::StudyBuddy, Mode::Studying]
    );

    let events = drain(&rx);
    assert!(events.iter().all(|e| e.event_type == EventType::ModeChange));
    let codes: Vec<_> = events.iter().map(|e| e.mode).collect();
    assert_eq!(codes, vec![Some(1), Some(2), Some(3), Some(1)]);

    ctl.with_outputs(|o| {
        assert_eq!(o.pattern(), Some(PatternSpec::FAST_BLINK));
        assert_eq!(o.line2(), Some("Studying"));
        assert_eq!(o.chimes().iter().filter(|c| **c == Chime::Confirm).count(), 4);
    });
}

#[test]
fn binary_button_on_empty_bench_is_silent_by_default() {
    let (ctl, rx) = bench(OccupancyPolicy::Binary);

    assert_eq!(ctl.press_mode_button(), Err(ControlError::BenchEmpty));
    assert_eq!(ctl.state().mode(), Mode::Empty);
    assert!(drain(&rx).is_empty());
    ctl.with_outputs(|o| assert_eq!(o.chimes(), vec![Chime::Startup]));
}

#[test]
fn binary_button_on_empty_bench_can_beep() {
    let (tx, _rx) = event_queue();
    let ctl = BenchController::new("B", OccupancyPolicy::Binary, 2, MockOutputs::new(), tx)
        .with_error_chime_when_empty(true);

    assert!(ctl.press_mode_button().is_err());
    ctl.with_outputs(|o| assert_eq!(o.chimes(), vec![Chime::Error]));
}

#[test]
fn binary_second_occupant_only_refreshes() {
    let (ctl, rx) = bench(OccupancyPolicy::Binary);
    ctl.apply_seats(&[true, false]);
    ctl.press_mode_button().unwrap();
    drain(&rx);

    assert_eq!(ctl.apply_seats(&[true, true]), Transition::SeatsChanged);
    assert!(drain(&rx).is_empty());
    ctl.with_outputs(|o| assert_eq!(o.pattern(), Some(PatternSpec::Solid)));

    assert_eq!(ctl.apply_seats(&[false, true]), Transition::SeatsChanged);
    assert!(drain(&rx).is_empty());
    assert_eq!(ctl.state().mode(), Mode::Studying);
    ctl.with_outputs(|o| assert_eq!(o.pattern(), Some(PatternSpec::FAST_BLINK)));
}

#[test]
fn vacating_resets_mode_and_emits_vacation() {
    let (ctl, rx) = bench(OccupancyPolicy::Binary);
    ctl.apply_seats(&[false, true]);
    ctl.press_mode_button().unwrap();
    ctl.press_mode_button().unwrap();
    drain(&rx);

    assert_eq!(ctl.apply_seats(&[false, false]), Transition::Vacated);

    let events = drain(&rx);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, EventType::Vacation);
    assert_eq!(events[0].mode, None);
    assert_eq!(events[0].mode_name, None);

    let status = ctl.status();
    assert!(!status.occupied);
    assert_eq!(status.mode, 0);
    ctl.with_outputs(|o| {
        assert_eq!(o.pattern(), Some(PatternSpec::Off));
        assert_eq!(o.line2(), Some("Available"));
    });
}

#[test]
fn repeated_seat_set_is_unchanged() {
    let (ctl, rx) = bench(OccupancyPolicy::Binary);
    ctl.apply_seats(&[true, false]);
    let before = ctl.with_outputs(|o| o.calls.len());

    assert_eq!(ctl.apply_seats(&[true, false]), Transition::Unchanged);
    assert_eq!(drain(&rx).len(), 1);
    assert_eq!(ctl.with_outputs(|o| o.calls.len()), before);
}

// ── Seat-count policy ─────────────────────────────────────────

#[test]
fn seat_count_single_occupant_is_available() {
    let (ctl, rx) = bench(OccupancyPolicy::SeatCount);

    assert_eq!(ctl.apply_seats(&[true, false]), Transition::Occupied);

    let events = drain(&rx);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, EventType::Occupation);
    assert_eq!(events[0].mode, Some(1));
    assert_eq!(events[0].mode_name.as_deref(), Some("Available"));
    assert_eq!(events[0].seats, Some(1));
    ctl.with_outputs(|o| {
        assert_eq!(o.pattern(), Some(PatternSpec::Solid));
        assert_eq!(o.line2(), Some("Available"));
    });
}

#[test]
fn seat_count_walk_emits_ordered_events() {
    let (ctl, rx) = bench(OccupancyPolicy::SeatCount);

    ctl.apply_seats(&[true, false]);
    ctl.apply_seats(&[true, true]);
    ctl.apply_seats(&[false, true]);
    ctl.apply_seats(&[false, false]);

    let events = drain(&rx);
    let summary: Vec<_> = events
        .iter()
        .map(|e| (e.event_type, e.mode, e.seats))
        .collect();
    assert_eq!(
        summary,
        vec![
            (EventType::Occupation, Some(1), Some(1)),
            (EventType::ModeChange, Some(4), Some(2)),
            (EventType::ModeChange, Some(1), Some(1)),
            (EventType::Vacation, None, None),
        ]
    );
    assert!(
        events.windows(2).all(|w| w[0].timestamp <= w[1].timestamp),
        "timestamps never go backwards"
    );
}

#[test]
fn seat_count_two_occupants_lock_the_button() {
    let (ctl, rx) = bench(OccupancyPolicy::SeatCount);
    ctl.apply_seats(&[true, true]);
    assert_eq!(ctl.state().mode(), Mode::StudyBuddy);
    drain(&rx);

    assert_eq!(
        ctl.press_mode_button(),
        Err(ControlError::ModeLocked { seats: 2 })
    );
    assert_eq!(ctl.state().mode(), Mode::StudyBuddy);
    assert!(drain(&rx).is_empty());
    ctl.with_outputs(|o| assert_eq!(o.chimes().last(), Some(&Chime::Error)));
}

#[test]
fn seat_count_button_cycles_single_occupant_modes() {
    let (ctl, rx) = bench(OccupancyPolicy::SeatCount);
    ctl.apply_seats(&[false, true]);
    drain(&rx);

    for _ in 0..3 {
        ctl.press_mode_button().unwrap();
    }
    let codes: Vec<_> = drain(&rx).iter().map(|e| e.mode).collect();
    assert_eq!(codes, vec![Some(2), Some(3), Some(1)]);
}

#[test]
fn seat_count_button_on_empty_bench_beeps() {
    let (ctl, rx) = bench(OccupancyPolicy::SeatCount);
    assert_eq!(ctl.press_mode_button(), Err(ControlError::BenchEmpty));
    assert!(drain(&rx).is_empty());
    ctl.with_outputs(|o| assert_eq!(o.chimes(), vec![Chime::Startup, Chime::Error]));
}

// ── Poll cycle ────────────────────────────────────────────────

#[test]
fn poll_cycle_acts_on_rising_edges_only() {
    let (ctl, rx) = bench(OccupancyPolicy::Binary);
    let mut sensors = ScriptedSensors::new(2);
    sensors.push_seats(&[true, false]);
    for level in [false, true, false, true] {
        sensors.push_button(level);
    }

    let mut presses = 0;
    for tick in 0..4u64 {
        let outcome = ctl
            .poll_cycle(&mut sensors, Duration::from_millis(tick * 100))
            .unwrap();
        if outcome.button.is_some() {
            presses += 1;
        }
    }

    assert_eq!(presses, 2);
    assert_eq!(ctl.state().mode(), Mode::OpenToChat);
    let types: Vec<_> = drain(&rx).iter().map(|e| e.event_type).collect();
    assert_eq!(
        types,
        vec![EventType::Occupation, EventType::ModeChange, EventType::ModeChange]
    );
}

#[test]
fn button_held_at_boot_does_not_cycle() {
    let (ctl, rx) = bench(OccupancyPolicy::Binary);
    let mut sensors = ScriptedSensors::new(2);
    sensors.push_seats(&[true, false]);
    sensors.push_button(true);

    let outcome = ctl.poll_cycle(&mut sensors, Duration::ZERO).unwrap();
    assert_eq!(outcome.seats, Transition::Occupied);
    assert!(outcome.button.is_none());
    ctl.poll_cycle(&mut sensors, Duration::from_millis(100)).unwrap();

    assert_eq!(ctl.state().mode(), Mode::Empty);
    let types: Vec<_> = drain(&rx).iter().map(|e| e.event_type).collect();
    assert_eq!(types, vec![EventType::Occupation]);
}

#[test]
fn sensor_fault_leaves_state_untouched() {
    let (ctl, rx) = bench(OccupancyPolicy::Binary);
    let mut sensors = ScriptedSensors::new(2);
    sensors.push_seats(&[true, true]);
    sensors.fail_seats = true;

    assert!(ctl.poll_cycle(&mut sensors, Duration::ZERO).is_err());
    assert!(!ctl.status().occupied);
    assert!(drain(&rx).is_empty());

    sensors.fail_seats = false;
    let outcome = ctl.poll_cycle(&mut sensors, Duration::ZERO).unwrap();
    assert_eq!(outcome.seats, Transition::Occupied);
}

#[test]
fn shutdown_turns_outputs_off() {
    let (ctl, _rx) = bench(OccupancyPolicy::Binary);
    ctl.apply_seats(&[true, false]);
    ctl.shutdown();
    ctl.with_outputs(|o| {
        assert_eq!(o.pattern(), Some(PatternSpec::Off));
        let tail = &o.calls[o.calls.len() - 2..];
        assert_eq!(
            tail,
            &[crate::mock_hw::OutputCall::Clear, crate::mock_hw::OutputCall::Silence]
        );
    });
}
