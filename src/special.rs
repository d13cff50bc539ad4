//! Line-clear specials: promotion on a 4+ run, activation clear-sets.

use crate::grid::{Grid, Pos};
use crate::matcher::{Axis, runs_at_least};
use crate::piece::Special;

/// Run length that promotes one of the swapped pieces.
pub const PROMOTION_RUN: usize = 4;

/// A swapped piece that becomes special after this swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Promotion {
    pub pos: Pos,
    pub special: Special,
}

/// Picks the promotion for a swap of `a` and `b`, judged on the post-swap board.
///
/// Every 4+ run on the board is considered in scan order (rows, then columns); the first
/// one containing `a` or `b` wins, and `a` is preferred when a run holds both. Cells in
/// `exclude` are never promoted. Runs made only of unmoved pieces promote nothing.
pub fn find_promotion(grid: &Grid, a: Pos, b: Pos, exclude: &[Pos]) -> Option<Promotion> {
    let candidates: Vec<Pos> = [a, b]
        .into_iter()
        .filter(|p| !exclude.contains(p))
        .collect();
    for run in runs_at_least(grid, PROMOTION_RUN) {
        if let Some(&pos) = candidates.iter().find(|p| run.cells.contains(p)) {
            let special = match run.axis {
                Axis::Horizontal => Special::RowClear,
                Axis::Vertical => Special::ColumnClear,
            };
            return Some(Promotion { pos, special });
        }
    }
    None
}

/// Cells cleared when the special at `pos` fires: its whole row or column, itself included.
pub fn activation_cells(grid: &Grid, pos: Pos, special: Special) -> Vec<Pos> {
    match special {
        Special::RowClear => grid.row_positions(pos.row).collect(),
        Special::ColumnClear => grid.col_positions(pos.col).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(s: &str) -> Grid {
        s.parse().unwrap()
    }

    #[test]
    fn test_horizontal_four_promotes_row_clear() {
        let g = grid(
            "A A A A B T\n\
             F T B F T B",
        );
        let p = find_promotion(&g, Pos::new(0, 2), Pos::new(1, 2), &[]);
        assert_eq!(
            p,
            Some(Promotion {
                pos: Pos::new(0, 2),
                special: Special::RowClear
            })
        );
    }

    #[test]
    fn test_vertical_four_promotes_column_clear() {
        let g = grid(
            "T B\n\
             T F\n\
             T B\n\
             T F",
        );
        let p = find_promotion(&g, Pos::new(3, 1), Pos::new(3, 0), &[]);
        assert_eq!(
            p,
            Some(Promotion {
                pos: Pos::new(3, 0),
                special: Special::ColumnClear
            })
        );
    }

    #[test]
    fn test_run_away_from_swap_promotes_nothing() {
        let g = grid(
            "A A A A B T\n\
             F T B F T B",
        );
        assert_eq!(find_promotion(&g, Pos::new(1, 4), Pos::new(1, 5), &[]), None);
    }

    #[test]
    fn test_three_run_promotes_nothing() {
        let g = grid("A A A B T F");
        assert_eq!(find_promotion(&g, Pos::new(0, 2), Pos::new(0, 3), &[]), None);
    }

    #[test]
    fn test_excluded_cell_is_skipped() {
        let g = grid("A A A A B T");
        assert_eq!(
            find_promotion(&g, Pos::new(0, 3), Pos::new(0, 4), &[Pos::new(0, 3)]),
            None
        );
    }

    #[test]
    fn test_row_run_beats_column_run() {
        // (1,1) sits in a horizontal and a vertical 4-run; rows are scanned first.
        let g = grid(
            "F B T F\n\
             B B B B\n\
             T B F T\n\
             F B T F",
        );
        let p = find_promotion(&g, Pos::new(1, 1), Pos::new(0, 1), &[]).unwrap();
        assert_eq!(p.special, Special::RowClear);
        assert_eq!(p.pos, Pos::new(1, 1));
    }

    #[test]
    fn test_activation_row_and_column() {
        let g = Grid::empty(6, 6);
        let row = activation_cells(&g, Pos::new(2, 3), Special::RowClear);
        assert_eq!(row.len(), 6);
        assert!(row.iter().all(|p| p.row == 2));
        assert!(row.contains(&Pos::new(2, 3)));

        let col = activation_cells(&g, Pos::new(2, 3), Special::ColumnClear);
        assert_eq!(col.len(), 6);
        assert!(col.iter().all(|p| p.col == 3));
    }
}
