//! Engine error taxonomy: caller mistakes vs. broken engine invariants.
//!
//! An invalid move (swap with no match and no activation) is not an error; it is
//! reported through `SwapReport::accepted`.

use crate::grid::Pos;
use crate::piece::PieceId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error(transparent)]
    Caller(#[from] CallerError),
    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
}

/// Rejected before any state changes; retrying the same call fails the same way.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallerError {
    #[error("cells {a} and {b} are not orthogonally adjacent")]
    NotAdjacent { a: Pos, b: Pos },
    #[error("piece {id} is no longer at {pos}")]
    StalePiece { id: PieceId, pos: Pos },
    #[error("cell {pos} is outside the {rows}x{cols} board")]
    OutOfBounds { pos: Pos, rows: usize, cols: usize },
    #[error("a cascade is still resolving")]
    Busy,
    #[error("board is not at rest: {0}")]
    UnstableBoard(String),
    #[error("invalid rules: {0}")]
    InvalidRules(String),
}

/// Engine bug or catalog misconfiguration. Carries enough state to diagnose.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("board initialization exceeded {cap} re-rolls")]
    InitRerollCapExceeded { cap: usize },
    #[error("cascade did not settle within {cap} passes")]
    CascadePassCapExceeded { cap: usize },
    #[error("piece {id} stored at {stored} but records ({row}, {col})")]
    MisplacedPiece {
        id: PieceId,
        stored: Pos,
        row: usize,
        col: usize,
    },
    #[error("cell {0} is empty outside a cascade step")]
    EmptyCellAtRest(Pos),
}

pub type EngineResult<T> = Result<T, EngineError>;
