//! Game session: owns the board, score, move budget and selection, and is the only
//! writer of the board.

use crate::cascade::{PassSnapshot, resolve_pass};
use crate::error::{CallerError, EngineResult, InvariantViolation};
use crate::generator::PieceGenerator;
use crate::grid::{Grid, Pos};
use crate::matcher::{ClearSet, find_matches};
use crate::piece::Piece;
use crate::rules::Rules;
use crate::swap::{SwapVerdict, evaluate_swap, valid_swaps};
use rand::Rng;
use rand::rngs::StdRng;

/// Outcome of a full swap, cascade included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapReport {
    /// False for an invalid move; the board, score and moves are then unchanged.
    pub accepted: bool,
    /// Board after the swap settled (or the untouched board when rejected).
    pub grid: Grid,
    /// Pieces cleared over all passes.
    pub cleared: usize,
    pub score_delta: u32,
    pub move_delta: u32,
    /// The swapped piece that became special, as it was when promoted.
    pub promoted: Option<Piece>,
    pub passes: usize,
}

impl SwapReport {
    fn rejected(grid: Grid) -> Self {
        Self {
            accepted: false,
            grid,
            cleared: 0,
            score_delta: 0,
            move_delta: 0,
            promoted: None,
            passes: 0,
        }
    }
}

/// First half of a step-wise swap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwapStart {
    Invalid,
    Accepted {
        promoted: Option<Piece>,
        /// Clear-set handed to the first cascade pass.
        clear: ClearSet,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectOutcome {
    Selected(Pos),
    Deselected,
    Swapped(Box<SwapReport>),
}

#[derive(Debug, Clone)]
struct Pending {
    clear: ClearSet,
    passes: usize,
}

/// Mutable game state persisting across swaps.
#[derive(Debug, Clone)]
pub struct Session<R = StdRng> {
    rules: Rules,
    generator: PieceGenerator<R>,
    grid: Grid,
    score: u32,
    moves_remaining: u32,
    selection: Option<Pos>,
    /// Set while a cascade is partially resolved.
    pending: Option<Pending>,
}

impl Session<StdRng> {
    /// New session with an OS-random seed.
    pub fn new(rules: Rules) -> EngineResult<Self> {
        Self::seeded(rules, rand::random())
    }

    /// Reproducible session: same seed and same swaps give the same game.
    pub fn seeded(rules: Rules, seed: u64) -> EngineResult<Self> {
        let generator = PieceGenerator::seeded(seed, &rules);
        Self::with_generator(rules, generator)
    }
}

impl<R: Rng> Session<R> {
    /// New session drawing every piece from `generator`.
    pub fn with_generator(rules: Rules, mut generator: PieceGenerator<R>) -> EngineResult<Self> {
        check_rules(&rules)?;
        let grid = generator.initialize_board(rules.rows, rules.cols, rules.max_init_rerolls)?;
        Ok(Self {
            moves_remaining: rules.moves,
            rules,
            generator,
            grid,
            score: 0,
            selection: None,
            pending: None,
        })
    }

    /// Adopt a preset board. It must be full, consistent and free of matches; board
    /// dimensions override `rules.rows`/`rules.cols`.
    pub fn from_grid(
        mut rules: Rules,
        grid: Grid,
        mut generator: PieceGenerator<R>,
    ) -> EngineResult<Self> {
        grid.check_at_rest()
            .map_err(|e| CallerError::UnstableBoard(e.to_string()))?;
        let matches = find_matches(&grid);
        if !matches.is_empty() {
            return Err(CallerError::UnstableBoard(format!(
                "{} cells already match",
                matches.len()
            ))
            .into());
        }
        if let Some(max) = grid.max_id() {
            generator.reserve_through(max);
        }
        rules.rows = grid.rows();
        rules.cols = grid.cols();
        check_rules(&rules)?;
        Ok(Self {
            moves_remaining: rules.moves,
            rules,
            generator,
            grid,
            score: 0,
            selection: None,
            pending: None,
        })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn moves_remaining(&self) -> u32 {
        self.moves_remaining
    }

    /// Move budget spent. Swaps are still accepted; stopping is the caller's call.
    pub fn is_over(&self) -> bool {
        self.moves_remaining == 0
    }

    pub fn selection(&self) -> Option<Pos> {
        self.selection
    }

    /// True between `begin_swap` and the final `resolve_step`.
    pub fn is_resolving(&self) -> bool {
        self.pending.is_some()
    }

    /// First accepted swap in row-major order, if any.
    pub fn hint(&self) -> Option<(Pos, Pos)> {
        valid_swaps(&self.grid).into_iter().next()
    }

    fn ensure_idle(&self) -> Result<(), CallerError> {
        if self.pending.is_some() {
            return Err(CallerError::Busy);
        }
        Ok(())
    }

    fn piece_at(&self, pos: Pos) -> Result<Piece, CallerError> {
        self.grid.get(pos).copied().ok_or(CallerError::OutOfBounds {
            pos,
            rows: self.grid.rows(),
            cols: self.grid.cols(),
        })
    }

    /// Validate and apply a swap; on acceptance the first cascade pass becomes pending.
    ///
    /// The move budget is charged here, once per accepted swap, never by cascade passes.
    #[tracing::instrument(skip(self, a, b), fields(a = %a.pos(), b = %b.pos()))]
    pub fn begin_swap(&mut self, a: Piece, b: Piece) -> EngineResult<SwapStart> {
        self.ensure_idle()?;
        let verdict = evaluate_swap(&self.grid, &a, &b)?;
        self.selection = None;

        let plan = match verdict {
            SwapVerdict::Invalid => return Ok(SwapStart::Invalid),
            SwapVerdict::Accepted(plan) => plan,
        };
        plan.grid.check_at_rest()?;

        if self.moves_remaining == 0 {
            tracing::warn!("swap accepted with no moves remaining");
        }
        self.moves_remaining = self.moves_remaining.saturating_sub(1);
        let promoted = plan.promotion.and_then(|p| plan.grid.get(p.pos).copied());
        self.grid = plan.grid;
        self.pending = Some(Pending {
            clear: plan.clear.clone(),
            passes: 0,
        });
        Ok(SwapStart::Accepted {
            promoted,
            clear: plan.clear,
        })
    }

    /// Run the next cascade pass and commit its board. `Ok(None)` once nothing is pending.
    ///
    /// An invariant violation ends the cascade; the board stays at the last committed pass.
    pub fn resolve_step(&mut self) -> EngineResult<Option<PassSnapshot>> {
        let Some(pending) = self.pending.as_mut() else {
            return Ok(None);
        };
        if pending.clear.is_empty() {
            self.pending = None;
            return Ok(None);
        }
        if pending.passes >= self.rules.max_cascade_passes {
            self.pending = None;
            return Err(InvariantViolation::CascadePassCapExceeded {
                cap: self.rules.max_cascade_passes,
            }
            .into());
        }

        let outcome = match resolve_pass(
            &mut self.grid,
            &pending.clear,
            &mut self.generator,
            self.rules.points_per_piece,
        ) {
            Ok(o) => o,
            Err(e) => {
                self.pending = None;
                return Err(e.into());
            }
        };
        pending.passes += 1;
        let pass = pending.passes;
        self.score = self.score.saturating_add(outcome.score_delta);
        if outcome.next.is_empty() {
            self.pending = None;
        } else {
            pending.clear = outcome.next.clone();
        }
        Ok(Some(PassSnapshot {
            pass,
            cleared: outcome.cleared,
            score_delta: outcome.score_delta,
            grid: self.grid.clone(),
            next: outcome.next,
        }))
    }

    /// Swap and resolve the whole cascade, calling `on_pass` after each committed pass.
    /// The callback is where a front end paces animation; it cannot alter the outcome.
    pub fn attempt_swap_with<F>(
        &mut self,
        a: Piece,
        b: Piece,
        mut on_pass: F,
    ) -> EngineResult<SwapReport>
    where
        F: FnMut(&PassSnapshot),
    {
        let moves_before = self.moves_remaining;
        let promoted = match self.begin_swap(a, b)? {
            SwapStart::Invalid => return Ok(SwapReport::rejected(self.grid.clone())),
            SwapStart::Accepted { promoted, .. } => promoted,
        };

        let mut report = SwapReport {
            accepted: true,
            grid: self.grid.clone(),
            cleared: 0,
            score_delta: 0,
            move_delta: moves_before - self.moves_remaining,
            promoted,
            passes: 0,
        };
        while let Some(snapshot) = self.resolve_step()? {
            report.cleared += snapshot.cleared.len();
            report.score_delta += snapshot.score_delta;
            report.passes = snapshot.pass;
            on_pass(&snapshot);
        }
        report.grid = self.grid.clone();
        tracing::debug!(
            score = self.score,
            moves = self.moves_remaining,
            passes = report.passes,
            "swap resolved"
        );
        Ok(report)
    }

    /// Zero-delay swap.
    pub fn attempt_swap(&mut self, a: Piece, b: Piece) -> EngineResult<SwapReport> {
        self.attempt_swap_with(a, b, |_| {})
    }

    /// Swap the pieces currently at two cells.
    pub fn swap_cells(&mut self, a: Pos, b: Pos) -> EngineResult<SwapReport> {
        let pa = self.piece_at(a)?;
        let pb = self.piece_at(b)?;
        self.attempt_swap(pa, pb)
    }

    /// Click-style selection: select, deselect on the same cell, swap with an adjacent
    /// cell, or move the selection to a non-adjacent cell.
    #[tracing::instrument(skip(self))]
    pub fn select(&mut self, pos: Pos) -> EngineResult<SelectOutcome> {
        self.ensure_idle()?;
        self.piece_at(pos)?;
        match self.selection {
            Some(current) if current == pos => {
                self.selection = None;
                Ok(SelectOutcome::Deselected)
            }
            Some(current) if current.is_adjacent(pos) => {
                let report = self.swap_cells(current, pos)?;
                Ok(SelectOutcome::Swapped(Box::new(report)))
            }
            _ => {
                self.selection = Some(pos);
                Ok(SelectOutcome::Selected(pos))
            }
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Fresh board, zero score, full move budget.
    #[tracing::instrument(skip(self))]
    pub fn restart(&mut self) -> EngineResult<()> {
        self.ensure_idle()?;
        self.grid = self.generator.initialize_board(
            self.rules.rows,
            self.rules.cols,
            self.rules.max_init_rerolls,
        )?;
        self.score = 0;
        self.moves_remaining = self.rules.moves;
        self.selection = None;
        Ok(())
    }
}

fn check_rules(rules: &Rules) -> Result<(), CallerError> {
    rules
        .validate()
        .map_err(|e| CallerError::InvalidRules(e.to_string()))
}
