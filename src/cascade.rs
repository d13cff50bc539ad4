//! Cascade resolution: clear, gravity, refill, re-detect, one pass at a time.

use crate::error::InvariantViolation;
use crate::generator::PieceGenerator;
use crate::grid::{Grid, Pos};
use crate::matcher::{ClearSet, find_matches};
use crate::piece::Piece;
use crate::rules::Rules;
use rand::Rng;
use rand::rngs::StdRng;

/// Result of one clear + compact + refill pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassOutcome {
    /// Pieces removed this pass, in clear-set order.
    pub cleared: Vec<Piece>,
    pub score_delta: u32,
    /// Matches on the refilled board; empty means the board settled.
    pub next: ClearSet,
}

/// Observable state after a committed pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassSnapshot {
    /// 1-based pass number within the current swap.
    pub pass: usize,
    pub cleared: Vec<Piece>,
    pub score_delta: u32,
    pub grid: Grid,
    pub next: ClearSet,
}

impl PassSnapshot {
    pub fn has_more(&self) -> bool {
        !self.next.is_empty()
    }
}

/// Runs one pass over `grid` in place.
///
/// Cleared cells are emptied, each column is compacted downwards keeping the order of
/// the survivors, and the vacated top cells get fresh pieces from `generator`.
pub fn resolve_pass<R: Rng>(
    grid: &mut Grid,
    clear: &ClearSet,
    generator: &mut PieceGenerator<R>,
    points_per_piece: u32,
) -> Result<PassOutcome, InvariantViolation> {
    let cleared: Vec<Piece> = clear.iter().filter_map(|pos| grid.take(pos)).collect();
    let score_delta = (cleared.len() as u32).saturating_mul(points_per_piece);

    for col in 0..grid.cols() {
        // Survivors bottom to top.
        let survivors: Vec<Piece> = (0..grid.rows())
            .rev()
            .filter_map(|row| grid.take(Pos::new(row, col)))
            .collect();
        let mut row = grid.rows();
        for piece in survivors {
            row -= 1;
            grid.place(Pos::new(row, col), piece);
        }
        // Refill top-down so new ids increase downwards within a column.
        for r in 0..row {
            let pos = Pos::new(r, col);
            let piece = generator.spawn(pos);
            grid.place(pos, piece);
        }
    }

    grid.check_at_rest()?;
    let next = find_matches(grid);
    tracing::debug!(
        cleared = cleared.len(),
        score_delta,
        pending = next.len(),
        "cascade pass"
    );
    Ok(PassOutcome {
        cleared,
        score_delta,
        next,
    })
}

/// Lazy sequence of pass snapshots for one clear-set. Ends after the pass that leaves no
/// matches, or after yielding one error if the pass cap is hit. Not restartable; build a
/// new one from fresh state instead.
#[derive(Debug)]
pub struct Cascade<'g, R = StdRng> {
    grid: Grid,
    pending: ClearSet,
    generator: &'g mut PieceGenerator<R>,
    points_per_piece: u32,
    max_passes: usize,
    passes: usize,
    failed: bool,
}

/// Starts resolving `clear` on a copy of `grid`.
pub fn resolve_cascade<'g, R: Rng>(
    grid: &Grid,
    clear: ClearSet,
    generator: &'g mut PieceGenerator<R>,
    rules: &Rules,
) -> Cascade<'g, R> {
    Cascade {
        grid: grid.clone(),
        pending: clear,
        generator,
        points_per_piece: rules.points_per_piece,
        max_passes: rules.max_cascade_passes,
        passes: 0,
        failed: false,
    }
}

impl<R: Rng> Cascade<'_, R> {
    /// Board after the last yielded pass.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn passes(&self) -> usize {
        self.passes
    }

    pub fn into_grid(self) -> Grid {
        self.grid
    }
}

impl<R: Rng> Iterator for Cascade<'_, R> {
    type Item = Result<PassSnapshot, InvariantViolation>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pending.is_empty() {
            return None;
        }
        if self.passes >= self.max_passes {
            self.failed = true;
            return Some(Err(InvariantViolation::CascadePassCapExceeded {
                cap: self.max_passes,
            }));
        }
        let outcome = match resolve_pass(
            &mut self.grid,
            &self.pending,
            self.generator,
            self.points_per_piece,
        ) {
            Ok(o) => o,
            Err(e) => {
                self.failed = true;
                return Some(Err(e));
            }
        };
        self.passes += 1;
        self.pending = outcome.next.clone();
        Some(Ok(PassSnapshot {
            pass: self.passes,
            cleared: outcome.cleared,
            score_delta: outcome.score_delta,
            grid: self.grid.clone(),
            next: outcome.next,
        }))
    }
}
