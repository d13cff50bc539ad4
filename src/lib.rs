//! Sportsmatch: match-3 engine on a fixed grid.
//!
//! Swaps are validated against run detection and line-clear specials, then resolved
//! through a clear / gravity / refill cascade until the board is stable. The engine is
//! synchronous; any pacing between cascade passes belongs to the caller (see
//! [`Session::attempt_swap_with`] and [`Session::resolve_step`]).

pub mod cascade;
pub mod error;
pub mod generator;
pub mod grid;
pub mod matcher;
pub mod piece;
pub mod rules;
pub mod session;
pub mod special;
pub mod swap;

pub use cascade::{Cascade, PassOutcome, PassSnapshot, resolve_cascade, resolve_pass};
pub use error::{CallerError, EngineError, EngineResult, InvariantViolation};
pub use generator::PieceGenerator;
pub use grid::{Grid, GridParseError, Pos};
pub use matcher::{ClearSet, find_matches};
pub use piece::{Ball, Piece, PieceId, PieceKind, Special};
pub use rules::{Rules, RulesError};
pub use session::{SelectOutcome, Session, SwapReport, SwapStart};
pub use special::{Promotion, activation_cells, find_promotion};
pub use swap::{SwapPlan, SwapVerdict, evaluate_swap, valid_swaps};
