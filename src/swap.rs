//! Swap evaluation: adjacency and staleness checks, tentative swap on a working
//! copy, match / activation / promotion classification.

use crate::error::{CallerError, EngineResult};
use crate::grid::{Grid, Pos};
use crate::matcher::{ClearSet, find_matches};
use crate::piece::Piece;
use crate::special::{Promotion, activation_cells, find_promotion};

/// An accepted swap, ready for the cascade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapPlan {
    /// Post-swap working copy, with the promotion (if any) already applied.
    pub grid: Grid,
    pub a: Pos,
    pub b: Pos,
    /// Runs and captured blockers on the post-swap board.
    pub matches: ClearSet,
    /// Rows/columns of swapped pieces that were special before the swap.
    pub activations: ClearSet,
    pub promotion: Option<Promotion>,
    /// `matches ∪ activations`, minus the promoted cell.
    pub clear: ClearSet,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwapVerdict {
    Accepted(Box<SwapPlan>),
    /// Neither a match nor an activation; the caller's board is untouched.
    Invalid,
}

impl SwapVerdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }
}

/// Checks that `piece` is still stored where it says it is.
fn locate(grid: &Grid, piece: &Piece) -> Result<Pos, CallerError> {
    let pos = piece.pos();
    if !grid.in_bounds(pos) {
        return Err(CallerError::OutOfBounds {
            pos,
            rows: grid.rows(),
            cols: grid.cols(),
        });
    }
    match grid.get(pos) {
        Some(p) if p.id == piece.id => Ok(pos),
        _ => Err(CallerError::StalePiece { id: piece.id, pos }),
    }
}

/// Classifies swapping `a` with `b` without touching `grid`.
///
/// Activations are evaluated independently of matching: a swapped special fires even when
/// the swap also makes a run. A special that fires is consumed and cannot be re-promoted
/// by the same swap.
pub fn evaluate_swap(grid: &Grid, a: &Piece, b: &Piece) -> EngineResult<SwapVerdict> {
    let pa = locate(grid, a)?;
    let pb = locate(grid, b)?;
    if !pa.is_adjacent(pb) {
        return Err(CallerError::NotAdjacent { a: pa, b: pb }.into());
    }

    let mut working = grid.clone();
    working.swap(pa, pb);

    let matches = find_matches(&working);

    let mut activations = ClearSet::new();
    let mut fired = Vec::new();
    // Each swapped piece now sits at the other's old cell.
    for (before, after) in [(pa, pb), (pb, pa)] {
        if let Some(special) = grid.get(before).and_then(Piece::special) {
            activations.extend(activation_cells(&working, after, special));
            fired.push(after);
        }
    }

    if matches.is_empty() && activations.is_empty() {
        tracing::debug!(a = %pa, b = %pb, "swap rejected: no match");
        return Ok(SwapVerdict::Invalid);
    }

    let promotion = if matches.is_empty() {
        None
    } else {
        find_promotion(&working, pb, pa, &fired)
    };

    let mut clear = matches.clone();
    clear.extend(activations.iter());
    if let Some(p) = promotion {
        if let Some(piece) = working.get_mut(p.pos) {
            piece.promote(p.special);
        }
        clear.remove(p.pos);
        tracing::debug!(pos = %p.pos, special = ?p.special, "piece promoted");
    }

    tracing::debug!(
        a = %pa,
        b = %pb,
        matched = matches.len(),
        activated = activations.len(),
        "swap accepted"
    );
    Ok(SwapVerdict::Accepted(Box::new(SwapPlan {
        grid: working,
        a: pa,
        b: pb,
        matches,
        activations,
        promotion,
        clear,
    })))
}

/// Every adjacent pair (right and down neighbours, row-major) that would be accepted.
/// Consumes no randomness.
pub fn valid_swaps(grid: &Grid) -> Vec<(Pos, Pos)> {
    let mut out = Vec::new();
    for pos in grid.positions() {
        let Some(a) = grid.get(pos) else { continue };
        for other in [Pos::new(pos.row, pos.col + 1), Pos::new(pos.row + 1, pos.col)] {
            let Some(b) = grid.get(other) else { continue };
            if matches!(evaluate_swap(grid, a, b), Ok(v) if v.is_accepted()) {
                out.push((pos, other));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::piece::{PieceId, Special};

    fn grid(s: &str) -> Grid {
        s.parse().unwrap()
    }

    fn at(g: &Grid, r: usize, c: usize) -> Piece {
        *g.get(Pos::new(r, c)).unwrap()
    }

    const STABLE: &str = "B F B T A F\n\
                          F B A F T B\n\
                          T A F B F T\n\
                          A T B A B A\n\
                          B F T F T B\n\
                          T B A T A F";

    #[test]
    fn test_non_adjacent_rejected_before_mutation() {
        let g = grid(STABLE);
        let err = evaluate_swap(&g, &at(&g, 0, 0), &at(&g, 1, 1)).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Caller(CallerError::NotAdjacent { .. })
        ));
    }

    #[test]
    fn test_stale_reference_rejected() {
        let g = grid(STABLE);
        let mut a = at(&g, 0, 0);
        a.id = PieceId(999);
        let err = evaluate_swap(&g, &a, &at(&g, 0, 1)).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Caller(CallerError::StalePiece { .. })
        ));

        let mut moved = at(&g, 0, 0);
        moved.col = 9;
        let err = evaluate_swap(&g, &moved, &at(&g, 0, 1)).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Caller(CallerError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_matchless_swap_is_invalid() {
        let g = grid(STABLE);
        let before = g.clone();
        let v = evaluate_swap(&g, &at(&g, 5, 4), &at(&g, 5, 5)).unwrap();
        assert_eq!(v, SwapVerdict::Invalid);
        assert_eq!(g, before);
    }

    #[test]
    fn test_swap_into_three_run() {
        let g = grid(
            "B B F B\n\
             T F A T\n\
             A T B F",
        );
        // Row 0 becomes B B B F.
        let v = evaluate_swap(&g, &at(&g, 0, 2), &at(&g, 0, 3)).unwrap();
        let SwapVerdict::Accepted(plan) = v else {
            panic!("expected accept");
        };
        assert_eq!(plan.matches.len(), 3);
        assert_eq!(plan.promotion, None);
        assert_eq!(plan.clear, plan.matches);
        assert!(plan.grid.check_consistency().is_ok());
        // The swapped piece carries its new coordinates.
        assert_eq!(plan.grid.get(Pos::new(0, 3)).unwrap().id, at(&g, 0, 2).id);
    }

    #[test]
    fn test_four_run_promotes_swapped_piece() {
        // Post-swap row 0 reads A A A A B T.
        let g = grid(
            "A A F A B T\n\
             F T A F T B\n\
             T B T B F A",
        );
        let moved = at(&g, 1, 2);
        let v = evaluate_swap(&g, &at(&g, 0, 2), &moved).unwrap();
        let SwapVerdict::Accepted(plan) = v else {
            panic!("expected accept");
        };
        let promo = plan.promotion.unwrap();
        assert_eq!(promo.pos, Pos::new(0, 2));
        assert_eq!(promo.special, Special::RowClear);
        assert_eq!(plan.matches.len(), 4);
        assert_eq!(plan.clear.len(), 3);
        assert!(!plan.clear.contains(Pos::new(0, 2)));
        let promoted = plan.grid.get(Pos::new(0, 2)).unwrap();
        assert_eq!(promoted.id, moved.id);
        assert_eq!(promoted.special(), Some(Special::RowClear));
    }

    #[test]
    fn test_special_activates_without_match() {
        let g = grid(
            "B F B T A F\n\
             F B A F T B\n\
             T A F B- F T\n\
             A T B A B A\n\
             B F T F T B\n\
             T B A T A F",
        );
        let special = at(&g, 2, 3);
        assert_eq!(special.special(), Some(Special::RowClear));
        // (2,3) <-> (2,4): row 2 becomes T A F F B- T, no runs anywhere.
        let v = evaluate_swap(&g, &special, &at(&g, 2, 4)).unwrap();
        let SwapVerdict::Accepted(plan) = v else {
            panic!("expected accept");
        };
        assert!(plan.matches.is_empty());
        assert_eq!(plan.activations.len(), 6);
        assert!(plan.clear.iter().all(|p| p.row == 2));
        assert_eq!(plan.promotion, None);
    }

    #[test]
    fn test_activation_and_match_are_unioned() {
        let g = grid(
            "B B F T A F\n\
             F T B| A T B\n\
             T A F B F T",
        );
        // The column-clear lands on (0,2) and completes B B B in row 0.
        let v = evaluate_swap(&g, &at(&g, 0, 2), &at(&g, 1, 2)).unwrap();
        let SwapVerdict::Accepted(plan) = v else {
            panic!("expected accept");
        };
        assert_eq!(plan.matches.len(), 3);
        assert_eq!(plan.activations.len(), 3);
        assert_eq!(plan.promotion, None);
        assert_eq!(plan.clear.len(), 5);
        for pos in [(0, 0), (0, 1), (0, 2), (1, 2), (2, 2)] {
            assert!(plan.clear.contains(Pos::new(pos.0, pos.1)), "{pos:?}");
        }
    }

    #[test]
    fn test_both_swapped_specials_fire() {
        let g = grid(
            "B F B T A F\n\
             F B A F T B\n\
             T A F B- F| T\n\
             A T B A B A\n\
             B F T F T B\n\
             T B A T A F",
        );
        let v = evaluate_swap(&g, &at(&g, 2, 3), &at(&g, 2, 4)).unwrap();
        let SwapVerdict::Accepted(plan) = v else {
            panic!("expected accept");
        };
        assert!(plan.matches.is_empty());
        // Row 2 from the row-clear, column 3 from the column-clear, (2,3) shared.
        assert_eq!(plan.activations.len(), 11);
        assert!((0..6).all(|c| plan.clear.contains(Pos::new(2, c))));
        assert!((0..6).all(|r| plan.clear.contains(Pos::new(r, 3))));
        assert_eq!(plan.clear, plan.activations);
    }

    #[test]
    fn test_valid_swaps_finds_known_move() {
        let g = grid(
            "B B F B\n\
             T F A T\n\
             A T B F",
        );
        let moves = valid_swaps(&g);
        assert!(moves.contains(&(Pos::new(0, 2), Pos::new(0, 3))));
        for (a, b) in moves {
            assert!(a.is_adjacent(b));
        }
    }

    #[test]
    fn test_valid_swaps_empty_on_dead_board() {
        let g = grid(
            "B F\n\
             T A",
        );
        assert!(valid_swaps(&g).is_empty());
    }
}
