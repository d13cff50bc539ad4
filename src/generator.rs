//! Piece generation (weighted kind roll, counter ids) and match-free board setup.

use crate::error::InvariantViolation;
use crate::grid::{Grid, Pos};
use crate::piece::{Ball, Piece, PieceId, PieceKind};
use crate::rules::Rules;
use rand::prelude::*;
use rand::rngs::StdRng;

/// Source of new pieces. The RNG lives here so a session's whole random stream
/// can be replayed from one seed, or swapped for a scripted source in tests.
#[derive(Debug, Clone)]
pub struct PieceGenerator<R = StdRng> {
    rng: R,
    next_id: u64,
    blocker_chance: f64,
    palette: &'static [Ball],
}

impl PieceGenerator<StdRng> {
    pub fn seeded(seed: u64, rules: &Rules) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), rules)
    }
}

impl<R: Rng> PieceGenerator<R> {
    /// Blocker chance is clamped to [0, 1]; NaN counts as zero.
    pub fn with_rng(rng: R, rules: &Rules) -> Self {
        let blocker_chance = if rules.blocker_chance.is_nan() {
            0.0
        } else {
            rules.blocker_chance.clamp(0.0, 1.0)
        };
        Self {
            rng,
            next_id: 0,
            blocker_chance,
            palette: rules.palette(),
        }
    }

    /// Blocker with `blocker_chance`, otherwise a uniform pick from the palette.
    pub fn random_kind(&mut self) -> PieceKind {
        if self.rng.random_bool(self.blocker_chance) {
            return PieceKind::Blocker;
        }
        let i = self.rng.random_range(0..self.palette.len());
        PieceKind::ball(self.palette[i])
    }

    pub fn next_id(&mut self) -> PieceId {
        let id = PieceId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Ensure future ids are strictly greater than `id` (used when adopting a preset board).
    pub fn reserve_through(&mut self, id: PieceId) {
        self.next_id = self.next_id.max(id.0 + 1);
    }

    /// A fresh piece for `pos` with a new id and a random kind.
    pub fn spawn(&mut self, pos: Pos) -> Piece {
        let id = self.next_id();
        let kind = self.random_kind();
        Piece::new(id, kind, pos.row, pos.col)
    }

    /// Fill a `rows` x `cols` board and re-roll until no 3-run exists in any row or column.
    ///
    /// Each pass checks every ball against its two left and two upper neighbours; any cell
    /// closing a run gets a new kind. Passes repeat until one finds nothing. Re-rolls are
    /// counted across passes and exceeding `max_rerolls` means the catalog cannot produce a
    /// stable board (e.g. a single kind and no blockers).
    pub fn initialize_board(
        &mut self,
        rows: usize,
        cols: usize,
        max_rerolls: usize,
    ) -> Result<Grid, InvariantViolation> {
        let mut grid = Grid::empty(rows, cols);
        for pos in grid.positions().collect::<Vec<_>>() {
            let piece = self.spawn(pos);
            grid.place(pos, piece);
        }

        let mut rerolls = 0usize;
        loop {
            let mut dirty = false;
            for pos in grid.positions().collect::<Vec<_>>() {
                if !closes_run(&grid, pos) {
                    continue;
                }
                rerolls += 1;
                if rerolls > max_rerolls {
                    return Err(InvariantViolation::InitRerollCapExceeded { cap: max_rerolls });
                }
                let kind = self.random_kind();
                if let Some(p) = grid.get_mut(pos) {
                    p.kind = kind;
                }
                dirty = true;
            }
            if !dirty {
                break;
            }
        }
        tracing::debug!(rows, cols, rerolls, "board initialized");
        Ok(grid)
    }
}

/// True if `pos` is the last cell of a 3-run ending here horizontally or vertically.
fn closes_run(grid: &Grid, pos: Pos) -> bool {
    let Some(key) = grid.kind(pos).and_then(|k| k.match_key()) else {
        return false;
    };
    let same = |p: Pos| grid.kind(p).and_then(|k| k.match_key()) == Some(key);
    let horizontal = pos.col >= 2
        && same(Pos::new(pos.row, pos.col - 1))
        && same(Pos::new(pos.row, pos.col - 2));
    let vertical = pos.row >= 2
        && same(Pos::new(pos.row - 1, pos.col))
        && same(Pos::new(pos.row - 2, pos.col));
    horizontal || vertical
}
