//! Sliding-window debounce
//!
//! The last N raw frames are kept and OR-ed together. A position that read
//! closed in any frame still in the window counts as down, so a single noisy
//! sample cannot drop a keystroke. Release is stretched by at most
//! N scan cycles.

use super::{AggregatedState, ScanFrame};
use std::collections::VecDeque;

/// Default number of frames merged.
pub const DEFAULT_WINDOW: usize = 4;

pub struct DebounceAggregator {
    window: VecDeque<ScanFrame>,
    capacity: usize,
    key_count: usize,
}

impl DebounceAggregator {
    /// A capacity of zero is treated as one (no smoothing).
    pub fn new(key_count: usize, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            window: VecDeque::with_capacity(capacity + 1),
            capacity,
            key_count,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    /// Add the newest frame, evicting the oldest on overflow.
    pub fn push(&mut self, frame: ScanFrame) {
        self.window.push_back(frame);
        while self.window.len() > self.capacity {
            self.window.pop_front();
        }
    }

    /// OR of every frame currently in the window.
    ///
    /// Always `key_count` entries long, whatever the frames' lengths.
    pub fn state(&self) -> AggregatedState {
        let mut merged = ScanFrame::released(self.key_count);
        for frame in &self.window {
            merged.merge(frame);
        }
        merged
    }

    pub fn clear(&mut self) {
        self.window.clear();
    }
}
