//! Scripted matrix for replaying key sequences on a host
//!
//! A replay script lists one scan frame per line as whitespace-separated
//! matrix positions:
//!
//! ```text
//! # CAPS SHIFT + 8 (cursor right), held for three scans
//! 25 x2
//! 25 17 x3
//! -          # all released
//! ```
//!
//! `xN` repeats the line N times (at most [`MAX_REPEAT`]), `-` is an
//! all-released frame, and blank lines and `#` comments are skipped.

use super::MatrixPins;
use crate::keyboard::{DownSet, MatrixPosition};
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

/// Largest `xN` repeat accepted on one line.
pub const MAX_REPEAT: usize = 100_000;

/// Error type for loading replay scripts
#[derive(Debug, Error)]
pub enum ReplayError {
    /// IO error reading the script
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// A line that could not be parsed
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
}

/// Frames to feed the matrix, one per scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayScript {
    frames: Vec<DownSet>,
}

impl ReplayScript {
    pub fn parse(source: &str, key_count: usize) -> Result<Self, ReplayError> {
        let mut frames = Vec::new();

        for (idx, raw) in source.lines().enumerate() {
            let line = idx + 1;
            let content = raw.split('#').next().unwrap_or("").trim();
            if content.is_empty() {
                continue;
            }

            let mut down = DownSet::new();
            let mut repeat = 1usize;
            for token in content.split_whitespace() {
                if token == "-" {
                    continue;
                }
                if let Some(count) = token.strip_prefix('x') {
                    repeat = count.parse().map_err(|_| ReplayError::Parse {
                        line,
                        message: format!("bad repeat count '{}'", token),
                    })?;
                    if repeat > MAX_REPEAT {
                        return Err(ReplayError::Parse {
                            line,
                            message: format!("repeat count {} exceeds {}", repeat, MAX_REPEAT),
                        });
                    }
                    continue;
                }
                let index: usize = token.parse().map_err(|_| ReplayError::Parse {
                    line,
                    message: format!("bad position '{}'", token),
                })?;
                if index >= key_count {
                    return Err(ReplayError::Parse {
                        line,
                        message: format!("position {} outside matrix of {} keys", index, key_count),
                    });
                }
                down.insert(MatrixPosition(index));
            }

            frames.extend(std::iter::repeat(down).take(repeat));
        }

        Ok(Self { frames })
    }

    pub fn load(path: &Path, key_count: usize) -> Result<Self, ReplayError> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents, key_count)
    }

    pub fn from_frames(frames: Vec<DownSet>) -> Self {
        Self { frames }
    }

    pub fn frames(&self) -> &[DownSet] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// The line currently driven active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Driven {
    Column(usize),
    Row(usize),
}

/// Matrix whose closed positions are set from software.
#[derive(Debug, Clone)]
pub struct ScriptedMatrix {
    rows: usize,
    cols: usize,
    closed: DownSet,
    driven: Option<Driven>,
}

impl ScriptedMatrix {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            closed: DownSet::new(),
            driven: None,
        }
    }

    /// Set the positions that read closed from the next scan on.
    pub fn set_closed(&mut self, closed: DownSet) {
        self.closed = closed;
    }

    pub fn closed(&self) -> &DownSet {
        &self.closed
    }

    /// Whether every line is back to idle.
    pub fn is_idle(&self) -> bool {
        self.driven.is_none()
    }
}

impl MatrixPins for ScriptedMatrix {
    fn row_count(&self) -> usize {
        self.rows
    }

    fn col_count(&self) -> usize {
        self.cols
    }

    fn activate_column(&mut self, col: usize) {
        self.driven = Some(Driven::Column(col));
    }

    fn release_column(&mut self, col: usize) {
        if self.driven == Some(Driven::Column(col)) {
            self.driven = None;
        }
    }

    fn row_active(&mut self, row: usize) -> bool {
        match self.driven {
            Some(Driven::Column(col)) => self
                .closed
                .contains(&MatrixPosition::from_row_col(row, col, self.cols)),
            _ => false,
        }
    }

    fn activate_row(&mut self, row: usize) {
        self.driven = Some(Driven::Row(row));
    }

    fn release_row(&mut self, row: usize) {
        if self.driven == Some(Driven::Row(row)) {
            self.driven = None;
        }
    }

    fn col_active(&mut self, col: usize) -> bool {
        match self.driven {
            Some(Driven::Row(row)) => self
                .closed
                .contains(&MatrixPosition::from_row_col(row, col, self.cols)),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyboard::down_set;
    use crate::matrix::{DiodeOrientation, MatrixScanner, NoDelay, ScanTiming};

    #[test]
    fn parses_frames_repeats_and_comments() {
        let script = ReplayScript::parse(
            "# header\n25 x2\n\n25 17 x3  # cursor right\n-\n",
            40,
        )
        .unwrap();
        assert_eq!(script.len(), 6);
        assert_eq!(script.frames()[0], down_set([25]));
        assert_eq!(script.frames()[2], down_set([17, 25]));
        assert!(script.frames()[5].is_empty());
    }

    #[test]
    fn rejects_out_of_range_position() {
        let err = ReplayScript::parse("1\n40\n", 40).unwrap_err();
        match err {
            ReplayError::Parse { line, .. } => assert_eq!(line, 2),
            _ => panic!("Expected parse error"),
        }
    }

    #[test]
    fn rejects_garbage() {
        assert!(ReplayScript::parse("abc", 40).is_err());
        assert!(ReplayScript::parse("1 xq", 40).is_err());
    }

    #[test]
    fn rejects_oversized_repeat() {
        let err = ReplayScript::parse("5 x2\n5 x99999999999\n", 40).unwrap_err();
        match err {
            ReplayError::Parse { line, .. } => assert_eq!(line, 2),
            _ => panic!("Expected parse error"),
        }
        let script = ReplayScript::parse(&format!("5 x{}", MAX_REPEAT), 40).unwrap();
        assert_eq!(script.len(), MAX_REPEAT);
    }

    #[test]
    fn scripted_matrix_scans_as_set() {
        let mut pins = ScriptedMatrix::new(8, 5);
        pins.set_closed(down_set([0, 36, 39]));
        let mut scanner = MatrixScanner::new(pins, NoDelay, ScanTiming::default());
        assert_eq!(scanner.scan().down_set(), down_set([0, 36, 39]));
        assert!(scanner.pins().is_idle());
    }

    #[test]
    fn scripted_matrix_scans_rows_to_columns() {
        let mut pins = ScriptedMatrix::new(8, 5);
        pins.set_closed(down_set([4, 36]));
        let timing = ScanTiming {
            orientation: DiodeOrientation::RowToCol,
            ..ScanTiming::default()
        };
        let mut scanner = MatrixScanner::new(pins, NoDelay, timing);
        assert_eq!(scanner.scan().down_set(), down_set([4, 36]));
        assert!(scanner.pins().is_idle());
    }
}
