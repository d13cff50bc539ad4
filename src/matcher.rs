//! Match detection: row/column runs of 3+, blocker interruption, blocker capture.

use crate::grid::{Grid, Pos};
use crate::piece::Ball;
use std::collections::HashSet;

/// Shortest run that counts as a match.
pub const MIN_RUN: usize = 3;

/// Insertion-ordered set of cells to clear. Order is detection order (rows, then
/// columns, then captured blockers) so logs and snapshots are reproducible.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClearSet {
    cells: Vec<Pos>,
    seen: HashSet<Pos>,
}

impl ClearSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `pos`; false if already present.
    pub fn insert(&mut self, pos: Pos) -> bool {
        if self.seen.insert(pos) {
            self.cells.push(pos);
            true
        } else {
            false
        }
    }

    pub fn remove(&mut self, pos: Pos) -> bool {
        if self.seen.remove(&pos) {
            self.cells.retain(|&p| p != pos);
            true
        } else {
            false
        }
    }

    pub fn extend<I: IntoIterator<Item = Pos>>(&mut self, cells: I) {
        for pos in cells {
            self.insert(pos);
        }
    }

    #[inline]
    pub fn contains(&self, pos: Pos) -> bool {
        self.seen.contains(&pos)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Pos> + '_ {
        self.cells.iter().copied()
    }

    pub fn as_slice(&self) -> &[Pos] {
        &self.cells
    }
}

impl FromIterator<Pos> for ClearSet {
    fn from_iter<I: IntoIterator<Item = Pos>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

/// Everything the current board says must be cleared: all runs of 3+ in rows and
/// columns, then every blocker orthogonally adjacent to one of those run cells.
///
/// Capture is a single pass over the run cells; a captured blocker does not capture
/// its own neighbours.
pub fn find_matches(grid: &Grid) -> ClearSet {
    let mut out = ClearSet::new();
    for row in 0..grid.rows() {
        scan_line(grid, grid.row_positions(row), &mut out);
    }
    for col in 0..grid.cols() {
        scan_line(grid, grid.col_positions(col), &mut out);
    }

    let runs: Vec<Pos> = out.iter().collect();
    for pos in runs {
        for n in grid.neighbours(pos) {
            if grid.kind(n).is_some_and(|k| k.is_blocker()) {
                out.insert(n);
            }
        }
    }
    if !out.is_empty() {
        tracing::trace!(cells = out.len(), "matches found");
    }
    out
}

/// Run-length scan of one row or column. Blockers and empty cells end the current
/// run and never start one.
fn scan_line(grid: &Grid, line: impl Iterator<Item = Pos>, out: &mut ClearSet) {
    let mut run: Vec<Pos> = Vec::new();
    let mut current: Option<Ball> = None;

    for pos in line {
        let key = grid.kind(pos).and_then(|k| k.match_key());
        match key {
            Some(ball) if current == Some(ball) => run.push(pos),
            _ => {
                flush(&mut run, out);
                current = key;
                if key.is_some() {
                    run.push(pos);
                }
            }
        }
    }
    flush(&mut run, out);
}

fn flush(run: &mut Vec<Pos>, out: &mut ClearSet) {
    if run.len() >= MIN_RUN {
        out.extend(run.iter().copied());
    }
    run.clear();
}

/// Maximal runs of at least `min_len` in scan order: rows top to bottom (left to right
/// within a row), then columns left to right (top to bottom). Blockers separate runs.
pub fn runs_at_least(grid: &Grid, min_len: usize) -> Vec<Run> {
    let mut runs = Vec::new();
    for row in 0..grid.rows() {
        collect_runs(grid, grid.row_positions(row), Axis::Horizontal, min_len, &mut runs);
    }
    for col in 0..grid.cols() {
        collect_runs(grid, grid.col_positions(col), Axis::Vertical, min_len, &mut runs);
    }
    runs
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// A maximal same-kind run in one row or column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub axis: Axis,
    pub ball: Ball,
    pub cells: Vec<Pos>,
}

fn collect_runs(
    grid: &Grid,
    line: impl Iterator<Item = Pos>,
    axis: Axis,
    min_len: usize,
    runs: &mut Vec<Run>,
) {
    let mut cells: Vec<Pos> = Vec::new();
    let mut current: Option<Ball> = None;
    let mut emit = |cells: &mut Vec<Pos>, ball: Option<Ball>| {
        if let Some(ball) = ball {
            if cells.len() >= min_len {
                runs.push(Run {
                    axis,
                    ball,
                    cells: std::mem::take(cells),
                });
            }
        }
        cells.clear();
    };

    for pos in line {
        let key = grid.kind(pos).and_then(|k| k.match_key());
        match key {
            Some(ball) if current == Some(ball) => cells.push(pos),
            _ => {
                emit(&mut cells, current);
                current = key;
                if key.is_some() {
                    cells.push(pos);
                }
            }
        }
    }
    emit(&mut cells, current);
}
