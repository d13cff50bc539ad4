// tests/engine_properties.rs
#![forbid(unsafe_code)]

/**
 * Property tests over whole sessions.
 *
 * Generated seeds and swap sequences drive `Session`; after every swap the
 * following must hold regardless of how the cascade went:
 * - the board is full, every piece records its own cell, ids are unique;
 * - the board at rest has no match;
 * - a rejected swap leaves board, score and moves untouched;
 * - an accepted swap costs exactly one move (while moves remain) and scores
 *   ten points per cleared piece.
 */
use proptest::prelude::*;
use sportsmatch::{Grid, Pos, Rules, Session, find_matches, valid_swaps};
use std::collections::HashSet;

fn assert_at_rest(grid: &Grid, rules: &Rules) {
    assert_eq!(grid.len(), rules.rows * rules.cols);
    grid.check_at_rest().unwrap();
    let ids: HashSet<_> = grid.pieces().map(|p| p.id).collect();
    assert_eq!(ids.len(), grid.len());
    assert!(find_matches(grid).is_empty(), "unstable board:\n{grid}");
}

fn neighbour(grid: &Grid, pos: Pos, dir: u8) -> Option<Pos> {
    let (r, c) = (pos.row, pos.col);
    let n = match dir % 4 {
        0 => Pos::new(r.checked_sub(1)?, c),
        1 => Pos::new(r + 1, c),
        2 => Pos::new(r, c.checked_sub(1)?),
        _ => Pos::new(r, c + 1),
    };
    grid.in_bounds(n).then_some(n)
}

#[test]
fn first_valid_swap_rollout_keeps_invariants() {
    let rules = Rules::default();
    let mut s = Session::seeded(rules.clone(), 20_260_228).unwrap();
    assert_at_rest(s.grid(), &rules);

    let mut total_cleared = 0usize;
    while !s.is_over() {
        let Some((a, b)) = valid_swaps(s.grid()).into_iter().next() else {
            break;
        };
        let moves = s.moves_remaining();
        let report = s.swap_cells(a, b).unwrap();
        assert!(report.accepted);
        assert_eq!(s.moves_remaining(), moves - 1);
        total_cleared += report.cleared;
        assert_at_rest(s.grid(), &rules);
    }
    assert_eq!(s.score() as usize, total_cleared * 10);
}

#[test]
fn blockerless_rollout_keeps_invariants() {
    let rules = Rules {
        blocker_chance: 0.0,
        rows: 8,
        cols: 8,
        ..Rules::default()
    };
    let mut s = Session::seeded(rules.clone(), 77).unwrap();
    for _ in 0..30 {
        let Some((a, b)) = s.hint() else { break };
        s.swap_cells(a, b).unwrap();
        assert_at_rest(s.grid(), &rules);
        assert!(s.grid().pieces().all(|p| !p.kind.is_blocker()));
    }
}

proptest! {
    #[test]
    fn initialization_is_match_free(
        seed in any::<u64>(),
        rows in 1usize..10,
        cols in 1usize..10,
        kinds in 3usize..=4,
    ) {
        let rules = Rules { rows, cols, kinds, ..Rules::default() };
        let s = Session::seeded(rules.clone(), seed).unwrap();
        assert_at_rest(s.grid(), &rules);
        prop_assert_eq!(s.moves_remaining(), 64);
        prop_assert_eq!(s.score(), 0);
    }

    #[test]
    fn random_swaps_respect_core_invariants(
        seed in any::<u64>(),
        picks in prop::collection::vec((0usize..36, 0u8..4), 1..40),
    ) {
        let rules = Rules::default();
        let mut s = Session::seeded(rules.clone(), seed).unwrap();

        for (cell, dir) in picks {
            let a = Pos::new(cell / rules.cols, cell % rules.cols);
            let Some(b) = neighbour(s.grid(), a, dir) else { continue };

            let before = s.grid().clone();
            let (score, moves) = (s.score(), s.moves_remaining());
            let report = s.swap_cells(a, b).unwrap();

            if report.accepted {
                let expected_moves = moves.saturating_sub(1);
                prop_assert_eq!(s.moves_remaining(), expected_moves);
                prop_assert_eq!(report.move_delta, moves - expected_moves);
                prop_assert_eq!(s.score(), score + report.score_delta);
                prop_assert_eq!(report.score_delta as usize, report.cleared * 10);
                prop_assert!(report.cleared >= 1);
                prop_assert!(report.passes >= 1);
            } else {
                prop_assert_eq!(s.grid(), &before);
                prop_assert_eq!(s.score(), score);
                prop_assert_eq!(s.moves_remaining(), moves);
            }
            assert_at_rest(s.grid(), &rules);
        }
    }

    #[test]
    fn same_seed_same_game(
        seed in any::<u64>(),
        steps in 1usize..15,
    ) {
        let mut a = Session::seeded(Rules::default(), seed).unwrap();
        let mut b = Session::seeded(Rules::default(), seed).unwrap();
        for _ in 0..steps {
            let Some((x, y)) = a.hint() else { break };
            let ra = a.swap_cells(x, y).unwrap();
            let mut passes = 0;
            let pa = *b.grid().get(x).unwrap();
            let pb = *b.grid().get(y).unwrap();
            let rb = b.attempt_swap_with(pa, pb, |_| passes += 1).unwrap();
            prop_assert_eq!(&ra, &rb);
            prop_assert_eq!(passes, rb.passes);
        }
        prop_assert_eq!(a.grid(), b.grid());
        prop_assert_eq!(a.score(), b.score());
    }
}
