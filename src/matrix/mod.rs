//! Key matrix scanning
//!
//! With the default [`DiodeOrientation::ColToRow`], column lines are outputs
//! driven active one at a time and row lines are inputs pulled up and
//! idle-high. A position reads closed when its row line is pulled active
//! while its column is driven. Boards wired with the diodes the other way
//! round drive rows and read columns instead. Each input is sampled several
//! times per driven line and a majority vote decides, which rejects
//! single-sample electrical noise without debounce capacitors.

pub mod debounce;
pub mod replay;

pub use debounce::DebounceAggregator;
pub use replay::{ReplayError, ReplayScript, ScriptedMatrix, MAX_REPEAT};

use crate::keyboard::{DownSet, MatrixPosition};
use log::trace;
use serde::{Deserialize, Serialize};
use std::thread;
use std::time::Duration;

/// Raw state of every position from one scan, `true` = closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanFrame {
    closed: Vec<bool>,
}

/// Logical OR of the frames in the debounce window. Same shape as a scan.
pub type AggregatedState = ScanFrame;

impl ScanFrame {
    /// An all-released frame.
    pub fn released(key_count: usize) -> Self {
        Self {
            closed: vec![false; key_count],
        }
    }

    pub fn from_positions(key_count: usize, down: &DownSet) -> Self {
        let mut frame = Self::released(key_count);
        for pos in down {
            frame.set(*pos, true);
        }
        frame
    }

    pub fn len(&self) -> usize {
        self.closed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closed.is_empty()
    }

    pub fn is_closed(&self, pos: MatrixPosition) -> bool {
        self.closed.get(pos.index()).copied().unwrap_or(false)
    }

    /// Out-of-range positions are ignored.
    pub fn set(&mut self, pos: MatrixPosition, closed: bool) {
        if let Some(slot) = self.closed.get_mut(pos.index()) {
            *slot = closed;
        }
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.closed
    }

    pub fn down_set(&self) -> DownSet {
        self.closed
            .iter()
            .enumerate()
            .filter(|(_, &closed)| closed)
            .map(|(idx, _)| MatrixPosition(idx))
            .collect()
    }

    /// OR another frame of the same shape into this one.
    pub fn merge(&mut self, other: &ScanFrame) {
        for (slot, &closed) in self.closed.iter_mut().zip(other.closed.iter()) {
            *slot |= closed;
        }
    }
}

/// Electrical access to the matrix lines.
///
/// Implementations own pin direction and pull configuration; the scanner
/// only sequences them.
pub trait MatrixPins {
    fn row_count(&self) -> usize;

    fn col_count(&self) -> usize;

    /// Switch a column line to output and drive it active (low).
    fn activate_column(&mut self, col: usize);

    /// Return a column line to its idle, pulled-up input state.
    fn release_column(&mut self, col: usize);

    /// Whether a row line currently reads active (low).
    fn row_active(&mut self, row: usize) -> bool;

    /// Switch a row line to output and drive it active (low).
    fn activate_row(&mut self, row: usize);

    /// Return a row line to its idle, pulled-up input state.
    fn release_row(&mut self, row: usize);

    /// Whether a column line currently reads active (low).
    fn col_active(&mut self, col: usize) -> bool;
}

/// Which side of the matrix the diodes let the scanner drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DiodeOrientation {
    /// Drive columns, read rows
    #[default]
    ColToRow,
    /// Drive rows, read columns
    RowToCol,
}

/// Blocking microsecond delay.
pub trait Delay {
    fn delay_us(&mut self, us: u32);
}

/// Delay backed by `thread::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdDelay;

impl Delay for StdDelay {
    fn delay_us(&mut self, us: u32) {
        if us > 0 {
            thread::sleep(Duration::from_micros(us as u64));
        }
    }
}

/// Delay that returns immediately. Used with scripted matrices.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

impl Delay for NoDelay {
    fn delay_us(&mut self, _us: u32) {}
}

/// Line driving and sampling policy for one scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanTiming {
    pub orientation: DiodeOrientation,
    /// Wait after driving and after releasing a line
    pub settle_us: u32,
    /// Readings taken per input line per driven line
    pub samples: u8,
    /// Readings that must agree before a position counts as closed
    pub majority: u8,
    /// Gap between readings
    pub sample_interval_us: u32,
}

impl Default for ScanTiming {
    fn default() -> Self {
        Self {
            orientation: DiodeOrientation::ColToRow,
            settle_us: 1200,
            samples: 5,
            majority: 3,
            sample_interval_us: 100,
        }
    }
}

/// Drives the matrix and produces one [`ScanFrame`] per call.
pub struct MatrixScanner<P, D> {
    pins: P,
    delay: D,
    timing: ScanTiming,
}

impl<P: MatrixPins, D: Delay> MatrixScanner<P, D> {
    pub fn new(pins: P, delay: D, timing: ScanTiming) -> Self {
        Self { pins, delay, timing }
    }

    pub fn key_count(&self) -> usize {
        self.pins.row_count() * self.pins.col_count()
    }

    pub fn timing(&self) -> ScanTiming {
        self.timing
    }

    pub fn pins(&self) -> &P {
        &self.pins
    }

    pub fn pins_mut(&mut self) -> &mut P {
        &mut self.pins
    }

    /// Drive every output line in turn. All lines are back in their idle
    /// state when this returns.
    pub fn scan(&mut self) -> ScanFrame {
        let rows = self.pins.row_count();
        let cols = self.pins.col_count();
        let mut frame = ScanFrame::released(rows * cols);

        match self.timing.orientation {
            DiodeOrientation::ColToRow => {
                for col in 0..cols {
                    self.pins.activate_column(col);
                    self.delay.delay_us(self.timing.settle_us);

                    for row in 0..rows {
                        if self.sample(|pins| pins.row_active(row)) {
                            frame.set(MatrixPosition::from_row_col(row, col, cols), true);
                        }
                    }

                    self.pins.release_column(col);
                    self.delay.delay_us(self.timing.settle_us);
                }
            }
            DiodeOrientation::RowToCol => {
                for row in 0..rows {
                    self.pins.activate_row(row);
                    self.delay.delay_us(self.timing.settle_us);

                    for col in 0..cols {
                        if self.sample(|pins| pins.col_active(col)) {
                            frame.set(MatrixPosition::from_row_col(row, col, cols), true);
                        }
                    }

                    self.pins.release_row(row);
                    self.delay.delay_us(self.timing.settle_us);
                }
            }
        }

        trace!("scan: {:?}", frame.down_set());
        frame
    }

    /// Majority vote over repeated reads of one input line.
    fn sample(&mut self, mut read: impl FnMut(&mut P) -> bool) -> bool {
        let mut active = 0u8;
        for _ in 0..self.timing.samples {
            if read(&mut self.pins) {
                active += 1;
            }
            self.delay.delay_us(self.timing.sample_interval_us);
        }
        active >= self.timing.majority
    }
}
