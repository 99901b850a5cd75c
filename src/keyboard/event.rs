//! Matrix transition events

use super::{DownSet, MatrixPosition};

/// Type of matrix transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEventType {
    /// Position went from released to pressed
    Press,
    /// Position went from pressed to released
    Release,
}

/// A single position transition seen in one scan cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// The matrix position
    pub position: MatrixPosition,
    /// Type of event (press/release)
    pub event_type: KeyEventType,
    /// Scan cycle the transition was observed in
    pub cycle: u64,
}

impl KeyEvent {
    pub fn new(position: MatrixPosition, event_type: KeyEventType, cycle: u64) -> Self {
        Self {
            position,
            event_type,
            cycle,
        }
    }

    pub fn press(position: MatrixPosition, cycle: u64) -> Self {
        Self::new(position, KeyEventType::Press, cycle)
    }

    pub fn release(position: MatrixPosition, cycle: u64) -> Self {
        Self::new(position, KeyEventType::Release, cycle)
    }
}

/// Everything that changed between two consecutive aggregated states.
#[derive(Debug, Clone, Default)]
pub struct CycleTransitions {
    /// Down-set before this cycle
    pub previous: DownSet,
    /// Down-set after this cycle
    pub current: DownSet,
    /// Releases first, then presses, each in ascending position order
    pub events: Vec<KeyEvent>,
}

impl CycleTransitions {
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn presses(&self) -> impl Iterator<Item = MatrixPosition> + '_ {
        self.events
            .iter()
            .filter(|e| e.event_type == KeyEventType::Press)
            .map(|e| e.position)
    }

    pub fn releases(&self) -> impl Iterator<Item = MatrixPosition> + '_ {
        self.events
            .iter()
            .filter(|e| e.event_type == KeyEventType::Release)
            .map(|e| e.position)
    }

    pub fn has_press(&self) -> bool {
        self.presses().next().is_some()
    }
}
