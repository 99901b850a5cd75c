//! The scan → debounce → track → emit → report loop
//!
//! One call to [`Engine::cycle`] runs a whole cycle to completion. The order
//! inside a cycle is fixed: the aggregated state is computed before anything
//! is resolved, HID output is emitted before the reporter looks at the
//! result, and the reporter never feeds back into HID output.

use crate::config::{Config, ConfigError};
use crate::hid::{EmitterStats, HidEventEmitter, HidSink};
use crate::keyboard::{
    ChangeReporter, ComboResolver, CycleTransitions, Description, DownSet, KeyMode, Layout,
    MatrixState,
};
use crate::matrix::{
    DebounceAggregator, Delay, MatrixPins, MatrixScanner, ReplayScript, ScriptedMatrix,
};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Settings the engine is built with
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub mode: KeyMode,
    pub debounce_window: usize,
    /// Describe transitions through the change reporter
    pub report: bool,
    pub modifier_hold: Duration,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            mode: KeyMode::Pc,
            debounce_window: crate::matrix::debounce::DEFAULT_WINDOW,
            report: true,
            modifier_hold: Duration::from_millis(500),
        }
    }
}

impl From<&Config> for EngineOptions {
    fn from(config: &Config) -> Self {
        Self {
            mode: config.engine.mode,
            debounce_window: config.debounce.window,
            report: config.report.enabled,
            modifier_hold: config.modifier_hold(),
        }
    }
}

/// Engine-level counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStats {
    /// Cycles run
    pub cycles: u64,
    /// Position transitions seen after debouncing
    pub transitions: u64,
    /// Diagnostic descriptions produced
    pub descriptions: u64,
    /// Largest number of positions down at once
    pub max_rollover: usize,
    /// HID side
    pub hid: EmitterStats,
}

/// What happened in one cycle
#[derive(Debug, Clone)]
pub struct CycleOutcome {
    pub transitions: CycleTransitions,
    pub description: Option<Description>,
}

pub struct Engine<P, D, S> {
    scanner: MatrixScanner<P, D>,
    debounce: DebounceAggregator,
    state: MatrixState,
    emitter: HidEventEmitter<S>,
    reporter: Option<ChangeReporter>,
    layout: Arc<Layout>,
    descriptions: u64,
    start_time: Instant,
}

impl<P: MatrixPins, D: Delay, S: HidSink> Engine<P, D, S> {
    pub fn new(
        scanner: MatrixScanner<P, D>,
        layout: Arc<Layout>,
        options: &EngineOptions,
        sink: S,
    ) -> Self {
        let key_count = scanner.key_count();
        let resolver = ComboResolver::new(Arc::clone(&layout));
        let mode = layout.mode_table(options.mode);

        let reporter = options.report.then(|| {
            ChangeReporter::new(resolver.clone(), mode.clone(), options.modifier_hold)
        });

        Self {
            scanner,
            debounce: DebounceAggregator::new(key_count, options.debounce_window),
            state: MatrixState::new(key_count),
            emitter: HidEventEmitter::new(resolver, mode, sink),
            reporter,
            layout,
            descriptions: 0,
            start_time: Instant::now(),
        }
    }

    /// Build an engine from a validated config.
    pub fn from_config(config: &Config, pins: P, delay: D, sink: S) -> Result<Self, ConfigError> {
        config.validate()?;
        let layout = Arc::new(config.layout()?);
        let scanner = MatrixScanner::new(pins, delay, config.matrix.timing());
        Ok(Self::new(scanner, layout, &EngineOptions::from(config), sink))
    }

    pub fn cycle(&mut self) -> CycleOutcome {
        self.cycle_at(Instant::now())
    }

    /// Run one cycle, using `now` for modifier hold timing.
    pub fn cycle_at(&mut self, now: Instant) -> CycleOutcome {
        let frame = self.scanner.scan();
        self.debounce.push(frame);
        let aggregated = self.debounce.state();

        let transitions = self.state.update(aggregated.as_slice());
        if !transitions.is_empty() {
            debug!(
                "cycle {}: {:?} -> {:?}",
                self.state.cycle(),
                transitions.previous,
                transitions.current
            );
            self.emitter.apply(&transitions);
        }

        let description = self
            .reporter
            .as_mut()
            .and_then(|reporter| reporter.observe_at(&transitions.current, now));
        if let Some(desc) = &description {
            self.descriptions += 1;
            info!("{}", desc);
        }

        CycleOutcome {
            transitions,
            description,
        }
    }

    /// Cycle until `running` is cleared or `max_cycles` have run, then release
    /// everything still held.
    pub fn run(&mut self, running: &AtomicBool, cycle_delay: Duration, max_cycles: Option<u64>) {
        let mut cycles = 0u64;
        while running.load(Ordering::SeqCst) && max_cycles.map_or(true, |max| cycles < max) {
            self.cycle();
            cycles += 1;
            if !cycle_delay.is_zero() {
                thread::sleep(cycle_delay);
            }
        }
        self.shutdown();
    }

    /// Release every keycode the ledger still holds.
    pub fn shutdown(&mut self) {
        if !self.emitter.ledger().is_empty() {
            info!("Releasing {} held position(s)", self.emitter.ledger().len());
        }
        self.emitter.release_all();
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            cycles: self.state.cycle(),
            transitions: self.state.total_events(),
            descriptions: self.descriptions,
            max_rollover: self.state.max_rollover(),
            hid: self.emitter.stats(),
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn state(&self) -> &MatrixState {
        &self.state
    }

    pub fn emitter(&self) -> &HidEventEmitter<S> {
        &self.emitter
    }

    pub fn sink(&self) -> &S {
        self.emitter.sink()
    }

    pub fn pins(&self) -> &P {
        self.scanner.pins()
    }

    pub fn pins_mut(&mut self) -> &mut P {
        self.scanner.pins_mut()
    }

    pub fn start_time(&self) -> Instant {
        self.start_time
    }
}

impl<D: Delay, S: HidSink> Engine<ScriptedMatrix, D, S> {
    /// Feed a script frame by frame, then keep scanning an idle matrix until
    /// the debounce window has drained. Stops early if `running` is cleared.
    pub fn run_script(&mut self, script: &ReplayScript, running: &AtomicBool, cycle_delay: Duration) {
        info!("Replaying {} frame(s)", script.len());

        let idle = self.debounce.capacity();
        let frames = script
            .frames()
            .iter()
            .cloned()
            .chain(std::iter::repeat_with(DownSet::new).take(idle));

        for frame in frames {
            if !running.load(Ordering::SeqCst) {
                info!("Replay interrupted");
                break;
            }
            self.pins_mut().set_closed(frame);
            self.cycle();
            if !cycle_delay.is_zero() {
                thread::sleep(cycle_delay);
            }
        }

        self.shutdown();
    }
}
