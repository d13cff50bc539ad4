//! Board storage: fixed rows x cols of optional piece slots.

use crate::error::InvariantViolation;
use crate::piece::{Ball, Piece, PieceId, PieceKind, Special};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Cell coordinate. Row 0 is the top of the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pos {
    pub row: usize,
    pub col: usize,
}

impl Pos {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Manhattan distance exactly 1.
    pub fn is_adjacent(&self, other: Self) -> bool {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col) == 1
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Grid of cells. Every cell is occupied at rest; cells are only empty inside a
/// cascade pass, between removal and refill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    rows: usize,
    cols: usize,
    /// Row-major: cells[row * cols + col].
    cells: Vec<Option<Piece>>,
}

impl Grid {
    pub fn empty(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![None; rows * cols],
        }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[inline]
    pub fn in_bounds(&self, pos: Pos) -> bool {
        pos.row < self.rows && pos.col < self.cols
    }

    #[inline]
    fn index(&self, pos: Pos) -> Option<usize> {
        self.in_bounds(pos).then(|| pos.row * self.cols + pos.col)
    }

    #[inline]
    pub fn get(&self, pos: Pos) -> Option<&Piece> {
        self.index(pos).and_then(|i| self.cells[i].as_ref())
    }

    #[inline]
    pub fn get_mut(&mut self, pos: Pos) -> Option<&mut Piece> {
        self.index(pos).and_then(|i| self.cells[i].as_mut())
    }

    #[inline]
    pub fn kind(&self, pos: Pos) -> Option<PieceKind> {
        self.get(pos).map(|p| p.kind)
    }

    /// Puts `piece` at `pos`, rewriting its coordinates. Out-of-bounds is a no-op.
    pub fn place(&mut self, pos: Pos, mut piece: Piece) {
        if let Some(i) = self.index(pos) {
            piece.row = pos.row;
            piece.col = pos.col;
            self.cells[i] = Some(piece);
        }
    }

    /// Empties the cell and returns what was there.
    pub fn take(&mut self, pos: Pos) -> Option<Piece> {
        self.index(pos).and_then(|i| self.cells[i].take())
    }

    /// Exchanges two cells and updates both pieces' coordinates.
    pub fn swap(&mut self, a: Pos, b: Pos) {
        let (Some(ia), Some(ib)) = (self.index(a), self.index(b)) else {
            return;
        };
        self.cells.swap(ia, ib);
        for (i, pos) in [(ia, a), (ib, b)] {
            if let Some(p) = self.cells[i].as_mut() {
                p.row = pos.row;
                p.col = pos.col;
            }
        }
    }

    /// All positions, row-major.
    pub fn positions(&self) -> impl Iterator<Item = Pos> + '_ {
        (0..self.rows).flat_map(move |r| (0..self.cols).map(move |c| Pos::new(r, c)))
    }

    pub fn pieces(&self) -> impl Iterator<Item = &Piece> + '_ {
        self.cells.iter().flatten()
    }

    pub fn row_positions(&self, row: usize) -> impl Iterator<Item = Pos> + use<> {
        let cols = if row < self.rows { self.cols } else { 0 };
        (0..cols).map(move |c| Pos::new(row, c))
    }

    pub fn col_positions(&self, col: usize) -> impl Iterator<Item = Pos> + use<> {
        let rows = if col < self.cols { self.rows } else { 0 };
        (0..rows).map(move |r| Pos::new(r, col))
    }

    /// In-bounds orthogonal neighbours (up, down, left, right).
    pub fn neighbours(&self, pos: Pos) -> impl Iterator<Item = Pos> + '_ {
        const DIRS: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
        DIRS.into_iter().filter_map(move |(dr, dc)| {
            let r = pos.row.checked_add_signed(dr)?;
            let c = pos.col.checked_add_signed(dc)?;
            let n = Pos::new(r, c);
            self.in_bounds(n).then_some(n)
        })
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    /// Highest id on the board, if any.
    pub fn max_id(&self) -> Option<PieceId> {
        self.pieces().map(|p| p.id).max()
    }

    /// Every stored piece records the cell it is stored in.
    pub fn check_consistency(&self) -> Result<(), InvariantViolation> {
        for pos in self.positions() {
            if let Some(p) = self.get(pos) {
                if p.row != pos.row || p.col != pos.col {
                    return Err(InvariantViolation::MisplacedPiece {
                        id: p.id,
                        stored: pos,
                        row: p.row,
                        col: p.col,
                    });
                }
            }
        }
        Ok(())
    }

    /// Consistency plus full occupancy.
    pub fn check_at_rest(&self) -> Result<(), InvariantViolation> {
        self.check_consistency()?;
        match self.positions().find(|&pos| self.get(pos).is_none()) {
            Some(pos) => Err(InvariantViolation::EmptyCellAtRest(pos)),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridParseError {
    #[error("board has no cells")]
    Empty,
    #[error("row {row} has {found} cells, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("bad cell token {0:?}")]
    BadToken(String),
}

/// Text form: one line per row, whitespace-separated tokens.
/// `B F A T` balls, `#` blocker, `.` empty; a trailing `-` or `|` marks a row/column clear.
impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in 0..self.rows {
            for c in 0..self.cols {
                if c > 0 {
                    write!(f, " ")?;
                }
                let token = match self.kind(Pos::new(r, c)) {
                    Some(kind) => kind.to_string(),
                    None => ".".to_string(),
                };
                write!(f, "{:<2}", token)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

fn parse_token(token: &str) -> Result<Option<PieceKind>, GridParseError> {
    let bad = || GridParseError::BadToken(token.to_string());
    let mut chars = token.chars();
    let head = chars.next().ok_or_else(bad)?;
    let tail = chars.next();
    if chars.next().is_some() {
        return Err(bad());
    }
    match (head, tail) {
        ('.', None) => Ok(None),
        (PieceKind::BLOCKER_SYMBOL, None) => Ok(Some(PieceKind::Blocker)),
        (c, marker) => {
            let ball = Ball::from_symbol(c).ok_or_else(bad)?;
            let special = match marker {
                Some(m) => Some(Special::from_marker(m).ok_or_else(bad)?),
                None => None,
            };
            Ok(Some(PieceKind::Ball { ball, special }))
        }
    }
}

impl FromStr for Grid {
    type Err = GridParseError;

    /// Ids are numbered row-major from 0.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lines: Vec<Vec<Option<PieceKind>>> = s
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(|l| l.split_whitespace().map(parse_token).collect())
            .collect::<Result<_, _>>()?;
        let rows = lines.len();
        let cols = lines.first().map_or(0, Vec::len);
        if rows == 0 || cols == 0 {
            return Err(GridParseError::Empty);
        }
        let mut grid = Self::empty(rows, cols);
        let mut next = 0u64;
        for (r, line) in lines.iter().enumerate() {
            if line.len() != cols {
                return Err(GridParseError::Ragged {
                    row: r,
                    expected: cols,
                    found: line.len(),
                });
            }
            for (c, kind) in line.iter().enumerate() {
                if let Some(kind) = kind {
                    grid.place(Pos::new(r, c), Piece::new(PieceId(next), *kind, r, c));
                    next += 1;
                }
            }
        }
        Ok(grid)
    }
}
