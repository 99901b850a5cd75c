//! Tracking of which matrix positions are down

use super::{CycleTransitions, DownSet, KeyEvent, MatrixPosition};

/// Per-position statistics
#[derive(Debug, Clone, Default)]
pub struct PositionStats {
    /// Whether the position is currently down
    pub is_pressed: bool,
    /// Total number of presses recorded
    pub press_count: u64,
    /// Cycle of the last press
    pub last_press_cycle: Option<u64>,
    /// Length of the last completed press, in cycles
    pub last_hold_cycles: Option<u64>,
}

/// Down-set tracking across scan cycles
pub struct MatrixState {
    /// Statistics for each position
    positions: Vec<PositionStats>,
    /// Currently down positions
    down: DownSet,
    /// Maximum simultaneous positions down
    max_simultaneous: usize,
    /// Total transitions processed
    total_events: u64,
    /// Cycles seen so far
    cycle: u64,
}

impl MatrixState {
    pub fn new(key_count: usize) -> Self {
        Self {
            positions: vec![PositionStats::default(); key_count],
            down: DownSet::new(),
            max_simultaneous: 0,
            total_events: 0,
            cycle: 0,
        }
    }

    /// Diff an aggregated state against the previous one.
    ///
    /// `closed[i]` is true when position `i` is down this cycle. Entries past
    /// the tracked key count are ignored.
    pub fn update(&mut self, closed: &[bool]) -> CycleTransitions {
        self.cycle += 1;
        let cycle = self.cycle;

        let current: DownSet = closed
            .iter()
            .take(self.positions.len())
            .enumerate()
            .filter(|(_, &down)| down)
            .map(|(idx, _)| MatrixPosition(idx))
            .collect();

        let mut events: Vec<KeyEvent> = self
            .down
            .difference(&current)
            .map(|&pos| KeyEvent::release(pos, cycle))
            .collect();
        events.extend(
            current
                .difference(&self.down)
                .map(|&pos| KeyEvent::press(pos, cycle)),
        );

        for event in &events {
            let stats = &mut self.positions[event.position.index()];
            match event.event_type {
                super::KeyEventType::Press => {
                    stats.is_pressed = true;
                    stats.press_count += 1;
                    stats.last_press_cycle = Some(cycle);
                }
                super::KeyEventType::Release => {
                    stats.is_pressed = false;
                    stats.last_hold_cycles = stats.last_press_cycle.map(|start| cycle - start);
                }
            }
        }
        self.total_events += events.len() as u64;

        if current.len() > self.max_simultaneous {
            self.max_simultaneous = current.len();
        }

        let previous = std::mem::replace(&mut self.down, current.clone());
        CycleTransitions {
            previous,
            current,
            events,
        }
    }

    /// Currently down positions
    pub fn down(&self) -> &DownSet {
        &self.down
    }

    pub fn position_stats(&self, pos: MatrixPosition) -> Option<&PositionStats> {
        self.positions.get(pos.index())
    }

    /// Maximum number of positions held at once
    pub fn max_rollover(&self) -> usize {
        self.max_simultaneous
    }

    pub fn total_events(&self) -> u64 {
        self.total_events
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Positions held for more than `threshold` cycles
    pub fn find_stuck_positions(&self, threshold: u64) -> Vec<MatrixPosition> {
        self.down
            .iter()
            .copied()
            .filter(|pos| {
                self.positions[pos.index()]
                    .last_press_cycle
                    .is_some_and(|start| self.cycle - start > threshold)
            })
            .collect()
    }
}
