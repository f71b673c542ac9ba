//! Piece types encoding.

use std::str::FromStr;

use crate::parsing::PartialFromStr;

use super::colour::Colour;

/// Total number of different piece kinds (6).
pub const NUM_PIECES: usize = 6;

const PIECE_SYMBOLS: [char; 12] = ['P', 'N', 'B', 'R', 'Q', 'K', 'p', 'n', 'b', 'r', 'q', 'k'];

/// Complete set of information for identifying a piece (colour and kind).
///
/// # Parsing
/// Pieces can be parsed from their symbol ('p', 'n', 'b', 'r', 'q', 'k' for
/// black, uppercase for white) using Rust's [`FromStr`] trait.
/// ```
/// # use polybook::chess::piece::*;
/// # use polybook::chess::colour::*;
/// assert_eq!("p".parse(), Ok(Piece::new(PieceKind::Pawn, Colour::Black)));
/// assert_eq!("Q".parse(), Ok(Piece::new(PieceKind::Queen, Colour::White)));
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Piece {
    pub kind: PieceKind,
    pub colour: Colour,
}
impl Piece {
    /// Creates a new `kind` piece of the given `colour`.
    pub const fn new(kind: PieceKind, colour: Colour) -> Self {
        Self { kind, colour }
    }

    /// Returns the piece's symbol.
    pub fn symbol(&self) -> char {
        PIECE_SYMBOLS[self.colour as usize * 6 + self.kind as usize]
    }
}
impl std::fmt::Display for Piece {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum PieceParseError {
    InvalidPieceSymbol(char),
    EmptyInput,
    InputTooLong,
}
impl std::fmt::Display for PieceParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPieceSymbol(c) => write!(f, "{c} is not a valid piece symbol"),
            Self::EmptyInput => write!(f, "Empty input"),
            Self::InputTooLong => write!(f, "A piece can only be one character long"),
        }
    }
}
impl std::error::Error for PieceParseError {}

impl PartialFromStr for Piece {
    type Err = PieceParseError;

    fn partial_from_str(s: &str) -> Result<(Self, &str), Self::Err> {
        let symbol = s.chars().next().ok_or(PieceParseError::EmptyInput)?;
        let colour = if symbol.is_ascii_lowercase() {
            Colour::Black
        } else {
            Colour::White
        };
        let kind = PieceKind::from_symbol(symbol)
            .ok_or(PieceParseError::InvalidPieceSymbol(symbol))?;

        Ok((Self::new(kind, colour), &s[symbol.len_utf8()..]))
    }
}
impl FromStr for Piece {
    type Err = PieceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::partial_from_str(s).and_then(|(result, rest)| {
            if rest.is_empty() {
                Ok(result)
            } else {
                Err(PieceParseError::InputTooLong)
            }
        })
    }
}

/// The kind of a piece, one of Pawn, Knight, Bishop, Rook, Queen or King.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, PartialOrd, Ord)]
pub enum PieceKind {
    Pawn = 0,
    Knight = 1,
    Bishop = 2,
    Rook = 3,
    Queen = 4,
    King = 5,
}
impl PieceKind {
    /// All piece kinds.
    pub const PIECE_KINDS: [Self; 6] = [
        PieceKind::Pawn,
        PieceKind::Knight,
        PieceKind::Bishop,
        PieceKind::Rook,
        PieceKind::Queen,
        PieceKind::King,
    ];

    /// Pieces that a pawn can promote to.
    pub const PROMOTION_TARGETS: [Self; 4] = [
        PieceKind::Knight,
        PieceKind::Bishop,
        PieceKind::Rook,
        PieceKind::Queen,
    ];

    /// A piece kind from its index.
    ///
    /// Fails if the index is more than 5.
    #[inline]
    pub const fn from_index(index: u8) -> Option<Self> {
        if index < 6 {
            Some(unsafe { std::mem::transmute::<u8, PieceKind>(index) })
        } else {
            None
        }
    }

    /// A piece kind from its SAN/FEN symbol, case-insensitive.
    pub const fn from_symbol(symbol: char) -> Option<Self> {
        Some(match symbol {
            'p' | 'P' => PieceKind::Pawn,
            'n' | 'N' => PieceKind::Knight,
            'b' | 'B' => PieceKind::Bishop,
            'r' | 'R' => PieceKind::Rook,
            'q' | 'Q' => PieceKind::Queen,
            'k' | 'K' => PieceKind::King,
            _ => return None,
        })
    }

    /// Checks if this piece kind is a diagonal slider (bishops and queens).
    #[inline(always)]
    pub const fn is_diagonal_slider(self) -> bool {
        matches!(self, PieceKind::Bishop | PieceKind::Queen)
    }
    /// Checks if this piece kind is an orthogonal slider (rooks and queens).
    #[inline(always)]
    pub const fn is_orthogonal_slider(self) -> bool {
        matches!(self, PieceKind::Rook | PieceKind::Queen)
    }

    /// Iterator over all piece kinds.
    pub fn iter() -> impl Iterator<Item = Self> {
        Self::PIECE_KINDS.into_iter()
    }

    /// Checks if this piece kind can be promoted to.
    ///
    /// Returns true for all pieces but pawns and kings.
    pub fn is_valid_promotion_target(&self) -> bool {
        !matches!(self, PieceKind::Pawn | PieceKind::King)
    }
}
impl std::fmt::Display for PieceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", PIECE_SYMBOLS[*self as usize + 6])
    }
}
