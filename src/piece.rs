//! Pieces: ball catalog, blocker, line-clear specials.

use std::fmt;

/// Ordinary (matchable) piece kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ball {
    Basketball,
    Football,
    Baseball,
    TennisBall,
}

impl Ball {
    pub const ALL: [Self; 4] = [
        Self::Basketball,
        Self::Football,
        Self::Baseball,
        Self::TennisBall,
    ];

    /// Single-letter token used by the text board form.
    pub fn symbol(&self) -> char {
        match self {
            Self::Basketball => 'B',
            Self::Football => 'F',
            Self::Baseball => 'A',
            Self::TennisBall => 'T',
        }
    }

    pub fn from_symbol(c: char) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.symbol() == c)
    }
}

/// Line-clear effect carried by a promoted piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Special {
    /// Clears the whole row of the piece.
    RowClear,
    /// Clears the whole column of the piece.
    ColumnClear,
}

impl Special {
    /// Suffix used by the text board form.
    pub fn marker(&self) -> char {
        match self {
            Self::RowClear => '-',
            Self::ColumnClear => '|',
        }
    }

    pub fn from_marker(c: char) -> Option<Self> {
        match c {
            '-' => Some(Self::RowClear),
            '|' => Some(Self::ColumnClear),
            _ => None,
        }
    }
}

/// What occupies a cell. A blocker has no `special` slot, so it can never carry one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    Ball { ball: Ball, special: Option<Special> },
    Blocker,
}

impl PieceKind {
    pub const BLOCKER_SYMBOL: char = '#';

    pub fn ball(ball: Ball) -> Self {
        Self::Ball {
            ball,
            special: None,
        }
    }

    /// The type used for run comparison. Blockers never take part in runs.
    #[inline]
    pub fn match_key(&self) -> Option<Ball> {
        match self {
            Self::Ball { ball, .. } => Some(*ball),
            Self::Blocker => None,
        }
    }

    #[inline]
    pub fn is_blocker(&self) -> bool {
        matches!(self, Self::Blocker)
    }

    #[inline]
    pub fn special(&self) -> Option<Special> {
        match self {
            Self::Ball { special, .. } => *special,
            Self::Blocker => None,
        }
    }
}

/// Opaque piece identity, unique for the lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PieceId(pub u64);

impl fmt::Display for PieceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A piece on the board; `row`/`col` always mirror its storage cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece {
    pub id: PieceId,
    pub kind: PieceKind,
    pub row: usize,
    pub col: usize,
}

impl Piece {
    pub fn new(id: PieceId, kind: PieceKind, row: usize, col: usize) -> Self {
        Self { id, kind, row, col }
    }

    #[inline]
    pub fn pos(&self) -> crate::grid::Pos {
        crate::grid::Pos::new(self.row, self.col)
    }

    #[inline]
    pub fn special(&self) -> Option<Special> {
        self.kind.special()
    }

    /// Marks the piece with a line-clear effect. Returns false for blockers,
    /// which cannot hold one.
    pub fn promote(&mut self, effect: Special) -> bool {
        match &mut self.kind {
            PieceKind::Ball { special, .. } => {
                *special = Some(effect);
                true
            }
            PieceKind::Blocker => false,
        }
    }
}

impl fmt::Display for PieceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ball { ball, special } => {
                write!(f, "{}", ball.symbol())?;
                match special {
                    Some(s) => write!(f, "{}", s.marker()),
                    None => Ok(()),
                }
            }
            Self::Blocker => write!(f, "{}", Self::BLOCKER_SYMBOL),
        }
    }
}
