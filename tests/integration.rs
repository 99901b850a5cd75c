//! Integration tests for Spectrum HID
//!
//! These tests drive the full engine: scripted matrix, majority sampling,
//! debounce, combination resolution, HID emission and reporting.

use spectrum_hid::config::Config;
use spectrum_hid::engine::{Engine, EngineOptions};
use spectrum_hid::hid::{HidAction, RecordingSink};
use spectrum_hid::keyboard::layout::{CAPS_SHIFT_IDX, SYMBOL_SHIFT_IDX};
use spectrum_hid::keyboard::{down_set, HidKeycode, KeyMode, Layout, MatrixPosition};
use spectrum_hid::matrix::{MatrixScanner, NoDelay, ReplayScript, ScanTiming, ScriptedMatrix};
use spectrum_hid::report::SessionReport;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::{Duration, Instant};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

type TestEngine = Engine<ScriptedMatrix, NoDelay, RecordingSink>;

fn engine_with(layout: Layout, window: usize) -> TestEngine {
    let scanner = MatrixScanner::new(ScriptedMatrix::new(8, 5), NoDelay, ScanTiming::default());
    let options = EngineOptions {
        debounce_window: window,
        ..EngineOptions::default()
    };
    Engine::new(scanner, Arc::new(layout), &options, RecordingSink::new())
}

fn engine() -> TestEngine {
    engine_with(Layout::spectrum(), 1)
}

/// Hold `down` for `cycles` scans, collecting any descriptions.
fn hold(engine: &mut TestEngine, down: &[usize], cycles: usize) -> Vec<String> {
    engine
        .pins_mut()
        .set_closed(down_set(down.iter().copied()));
    (0..cycles)
        .filter_map(|_| engine.cycle().description.map(|d| d.to_string()))
        .collect()
}

fn replay(engine: &mut TestEngine, source: &str) {
    let script = ReplayScript::parse(source, 40).expect("Failed to parse script");
    let running = AtomicBool::new(true);
    engine.run_script(&script, &running, Duration::ZERO);
}

fn assert_balanced(actions: &[HidAction]) {
    let mut held: HashMap<HidKeycode, i32> = HashMap::new();
    for action in actions {
        let count = held.entry(action.keycode()).or_default();
        match action {
            HidAction::Press(_) => *count += 1,
            HidAction::Release(_) => *count -= 1,
        }
        assert!(*count >= 0, "released {} before pressing it", action.keycode());
    }
    for (keycode, count) in held {
        assert_eq!(count, 0, "{} left pressed", keycode);
    }
}

// ---------------------------------------------------------------------------
// Resolution scenarios
// ---------------------------------------------------------------------------

#[test]
fn caps_combo_uses_table_name() {
    let mut engine = engine();
    hold(&mut engine, &[25], 1);
    let lines = hold(&mut engine, &[1, 25], 1);
    assert_eq!(lines, vec!["Key pressed: CAPS LOCK (TWO + LEFT_SHIFT)"]);
}

#[test]
fn symbol_combo_without_entry_falls_back() {
    let mut engine = engine();
    hold(&mut engine, &[36], 1);
    let lines = hold(&mut engine, &[5, 36], 1);
    assert_eq!(lines, vec!["Key pressed: SYMBOL SHIFT + Q (Q + LEFT_ALT)"]);
}

#[test]
fn special_combo_sends_only_substitute() {
    let mut engine = engine();
    replay(&mut engine, "17 25 x3\n-\n");
    assert_eq!(
        engine.sink().actions(),
        &[
            HidAction::Press(HidKeycode::RIGHT_ARROW),
            HidAction::Release(HidKeycode::RIGHT_ARROW),
        ]
    );
}

#[test]
fn swapped_modifier_round_trip() {
    let mut layout = Layout::spectrum();
    layout.swaps.set(CAPS_SHIFT_IDX, MatrixPosition(1), true);
    layout.special.insert("CAPS LOCK", None);
    let mut engine = engine_with(layout, 1);

    replay(&mut engine, "25 x2\n25 1 x2\n25\n-\n");
    let actions = engine.sink().actions();
    let alt_press = actions
        .iter()
        .position(|a| *a == HidAction::Press(HidKeycode::LEFT_ALT))
        .expect("substituted modifier pressed");
    let two_press = actions
        .iter()
        .position(|a| *a == HidAction::Press(HidKeycode::TWO))
        .expect("key pressed");
    assert!(alt_press < two_press);
    assert_eq!(engine.sink().count_releases(HidKeycode::LEFT_ALT), 1);
    assert_balanced(actions);
}

#[test]
fn lone_modifier_is_sent_but_not_described() {
    let mut engine = engine();
    let mut lines = hold(&mut engine, &[SYMBOL_SHIFT_IDX.index()], 5);
    lines.extend(hold(&mut engine, &[], 2));
    assert!(lines.is_empty());
    assert_eq!(
        engine.sink().actions(),
        &[
            HidAction::Press(HidKeycode::LEFT_ALT),
            HidAction::Release(HidKeycode::LEFT_ALT),
        ]
    );
}

// ---------------------------------------------------------------------------
// Debounce through the engine
// ---------------------------------------------------------------------------

#[test]
fn dropout_inside_window_does_not_retrigger() {
    let mut engine = engine_with(Layout::spectrum(), 4);
    replay(&mut engine, "5 x2\n-\n5\n- x2\n5\n");
    assert_eq!(engine.sink().count_presses(HidKeycode::Q), 1);
    assert_eq!(engine.sink().count_releases(HidKeycode::Q), 1);
}

#[test]
fn release_latency_bounded_by_window() {
    for window in 1..=5 {
        let mut engine = engine_with(Layout::spectrum(), window);
        hold(&mut engine, &[9], 3);
        engine.pins_mut().set_closed(down_set([]));

        let mut cycles = 0;
        loop {
            cycles += 1;
            if engine.cycle().transitions.releases().count() > 0 {
                break;
            }
            assert!(cycles <= window, "window {} exceeded", window);
        }
        assert_eq!(cycles, window);
    }
}

// ---------------------------------------------------------------------------
// Ledger invariant over longer sessions
// ---------------------------------------------------------------------------

#[test]
fn mixed_typing_session_is_balanced() {
    let mut engine = engine_with(Layout::spectrum(), 2);
    replay(
        &mut engine,
        "# type, shift, cursor, symbols, overlap
5 x2
5 6 x2
6
25 x2
25 19 x3
25
36 0 x2
36 0 1 x2
36
25 36 x2
25 36 4
4
15 25 x2
15
-
",
    );
    assert!(engine.emitter().ledger().is_empty());
    assert_balanced(engine.sink().actions());
    assert_eq!(engine.stats().hid.fallback_releases, 0);
}

#[test]
fn overlapping_shift_sources_keep_host_in_step() {
    let mut engine = engine();
    for frame in [&[36][..], &[0, 36], &[0, 25, 36], &[25, 36]] {
        hold(&mut engine, frame, 1);
    }

    let mut host = std::collections::BTreeSet::new();
    for action in engine.sink().actions() {
        match *action {
            HidAction::Press(k) => host.insert(k),
            HidAction::Release(k) => host.remove(&k),
        };
    }
    assert!(host.contains(&HidKeycode::LEFT_SHIFT));
    assert!(engine.emitter().is_held(HidKeycode::LEFT_SHIFT));

    hold(&mut engine, &[], 1);
    assert!(engine.emitter().ledger().is_empty());
    assert_balanced(engine.sink().actions());
}

#[test]
fn interrupted_replay_releases_held_keys() {
    let mut engine = engine();
    let script = ReplayScript::parse("36 x3\n36 2 x3\n", 40).expect("Failed to parse script");
    let running = AtomicBool::new(true);

    // Stop half way through the held combination.
    for frame in script.frames().iter().take(4) {
        engine.pins_mut().set_closed(frame.clone());
        engine.cycle();
    }
    assert!(!engine.emitter().ledger().is_empty());
    running.store(false, std::sync::atomic::Ordering::SeqCst);
    engine.run_script(&script, &running, Duration::ZERO);

    assert!(engine.emitter().ledger().is_empty());
    assert_balanced(engine.sink().actions());
}

// ---------------------------------------------------------------------------
// Reporting
// ---------------------------------------------------------------------------

#[test]
fn modifier_hold_timeout_then_partner() {
    let mut engine = engine();
    let start = Instant::now();
    engine.pins_mut().set_closed(down_set([25]));
    assert!(engine.cycle_at(start).description.is_none());
    assert!(engine
        .cycle_at(start + Duration::from_secs(1))
        .description
        .is_none());

    engine.pins_mut().set_closed(down_set([4, 25]));
    let desc = engine
        .cycle_at(start + Duration::from_secs(2))
        .description
        .expect("combined description");
    assert_eq!(desc.name.as_str(), "CURSOR LEFT");
}

#[test]
fn held_combo_is_described_once() {
    let mut engine = engine();
    hold(&mut engine, &[36], 1);
    let lines = hold(&mut engine, &[36, 37], 10);
    assert_eq!(lines, vec!["Key pressed: . (LEFT_ALT + M)"]);
    assert_eq!(engine.stats().descriptions, 1);
}

// ---------------------------------------------------------------------------
// Config and report
// ---------------------------------------------------------------------------

#[test]
fn engine_from_config_applies_mapping() {
    let toml_str = r#"
[debounce]
window = 1

[mapping.special]
"DELETE" = "DELETE"
"#;
    let config: Config = toml::from_str(toml_str).expect("Failed to deserialize");
    let mut engine = Engine::from_config(
        &config,
        ScriptedMatrix::new(8, 5),
        NoDelay,
        RecordingSink::new(),
    )
    .expect("Failed to build engine");

    hold(&mut engine, &[15, 25], 1);
    hold(&mut engine, &[], 1);
    assert_eq!(engine.sink().count_presses(HidKeycode::DELETE), 1);
    assert_eq!(engine.sink().count_presses(HidKeycode::BACKSPACE), 0);
}

#[test]
fn engine_from_invalid_config_fails() {
    let mut config = Config::default();
    config.matrix.samples = 0;
    let result = Engine::from_config(
        &config,
        ScriptedMatrix::new(8, 5),
        NoDelay,
        RecordingSink::new(),
    );
    assert!(result.is_err());
}

#[test]
fn session_report_reflects_engine() {
    let mut engine = engine();
    replay(&mut engine, "5\n-\n5\n-\n25 17\n-\n");

    let report = SessionReport::new(
        engine.start_time(),
        engine.stats(),
        engine.state(),
        engine.layout(),
        KeyMode::Pc,
    );
    assert_eq!(report.summary.special_presses, 1);
    assert_eq!(report.summary.hid_presses, report.summary.hid_releases);
    assert_eq!(report.positions[0].name, "Q");
    assert_eq!(report.positions[0].presses, 2);
    assert!(report.to_json().expect("Failed to serialize").contains("\"max_rollover\": 2"));
}
