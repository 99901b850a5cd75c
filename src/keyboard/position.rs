//! Matrix positions and down-sets

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// One physical key, identified by its row/column intersection.
///
/// The index is `row * col_count + col`, fixed by the wiring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MatrixPosition(pub usize);

impl MatrixPosition {
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    pub const fn from_row_col(row: usize, col: usize, col_count: usize) -> Self {
        Self(row * col_count + col)
    }

    pub const fn index(self) -> usize {
        self.0
    }

    pub const fn row(self, col_count: usize) -> usize {
        self.0 / col_count
    }

    pub const fn col(self, col_count: usize) -> usize {
        self.0 % col_count
    }
}

impl From<usize> for MatrixPosition {
    fn from(index: usize) -> Self {
        Self(index)
    }
}

impl fmt::Display for MatrixPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Positions currently held down, iterated in ascending order.
pub type DownSet = BTreeSet<MatrixPosition>;

/// Build a down-set from raw indices.
pub fn down_set<I: IntoIterator<Item = usize>>(indices: I) -> DownSet {
    indices.into_iter().map(MatrixPosition).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_col_roundtrip() {
        let pos = MatrixPosition::from_row_col(7, 1, 5);
        assert_eq!(pos.index(), 36);
        assert_eq!(pos.row(5), 7);
        assert_eq!(pos.col(5), 1);
    }

    #[test]
    fn down_set_iterates_ascending() {
        let set = down_set([36, 5, 25]);
        let order: Vec<usize> = set.iter().map(|p| p.index()).collect();
        assert_eq!(order, vec![5, 25, 36]);
    }
}
