//! Enumerations of chessboard accessing constants, such as files, ranks and squares.

use crate::parsing::PartialFromStr;

use super::bitboard::Bitboard;

/// Files of a chessboard (A-H).
#[repr(u8)]
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, PartialOrd, Ord)]
pub enum File {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
}
impl File {
    /// Returns the set of all squares within a given file as a bitboard.
    #[inline]
    pub(crate) const fn bitboard(self) -> Bitboard {
        Bitboard(0x0101010101010101 << self as u8)
    }

    /// A file from a given index.
    ///
    /// Fails if the index is more than 7.
    #[inline]
    pub const fn from_index(index: u8) -> Option<Self> {
        if index < 8 {
            Some(unsafe { Self::from_index_unchecked(index) })
        } else {
            None
        }
    }

    /// A file from a given index.
    /// # Safety
    /// If the index is more than 7, results in undefined behavior.
    #[inline]
    pub const unsafe fn from_index_unchecked(index: u8) -> Self {
        unsafe { std::mem::transmute(index) }
    }

    /// A file from its lowercase letter.
    #[inline]
    pub const fn from_symbol(symbol: u8) -> Option<Self> {
        if symbol >= b'a' && symbol <= b'h' {
            Some(unsafe { Self::from_index_unchecked(symbol - b'a') })
        } else {
            None
        }
    }
}
impl std::fmt::Display for File {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", (b'a' + *self as u8) as char)
    }
}

/// Ranks of a chessboard (1-8).
#[repr(u8)]
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, PartialOrd, Ord)]
pub enum Rank {
    One,
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
}
impl Rank {
    /// Returns the set of all squares within a given rank as a bitboard.
    #[inline]
    pub(crate) const fn bitboard(self) -> Bitboard {
        Bitboard(0xFF << (8 * self as u8))
    }

    /// A rank from a given index.
    ///
    /// Fails if the index is more than 7.
    #[inline]
    pub const fn from_index(index: u8) -> Option<Self> {
        if index < 8 {
            Some(unsafe { Self::from_index_unchecked(index) })
        } else {
            None
        }
    }

    /// A rank from a given index.
    /// # Safety
    /// If the index is more than 7, results in undefined behavior.
    #[inline]
    pub const unsafe fn from_index_unchecked(index: u8) -> Self {
        unsafe { std::mem::transmute(index) }
    }

    /// A rank from its digit.
    #[inline]
    pub const fn from_symbol(symbol: u8) -> Option<Self> {
        if symbol >= b'1' && symbol <= b'8' {
            Some(unsafe { Self::from_index_unchecked(symbol - b'1') })
        } else {
            None
        }
    }

    /// An iterator over all ranks, from One to Eight.
    pub fn iter() -> impl DoubleEndedIterator<Item = Self> {
        (0..8).map(|i| unsafe { Self::from_index_unchecked(i) })
    }
}
impl std::fmt::Display for Rank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", 1 + *self as u8)
    }
}

/// General square indexing for 8x8 bitboards, with A1 = 0 and H8 = 63.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, PartialOrd, Ord)]
#[rustfmt::skip]
pub enum Square {
    A1, B1, C1, D1, E1, F1, G1, H1,
    A2, B2, C2, D2, E2, F2, G2, H2,
    A3, B3, C3, D3, E3, F3, G3, H3,
    A4, B4, C4, D4, E4, F4, G4, H4,
    A5, B5, C5, D5, E5, F5, G5, H5,
    A6, B6, C6, D6, E6, F6, G6, H6,
    A7, B7, C7, D7, E7, F7, G7, H7,
    A8, B8, C8, D8, E8, F8, G8, H8,
}
impl Square {
    /// Instantiates a new square based on file and rank.
    #[inline]
    pub const fn new(file: File, rank: Rank) -> Self {
        unsafe { Self::from_index_unchecked((rank as u8) << 3 | (file as u8)) }
    }

    /// Instantiates a new square from its index.
    ///
    /// Returns `None` if the index is more than 63.
    #[inline]
    pub const fn from_index(index: u8) -> Option<Self> {
        if index < 64 {
            Some(unsafe { Self::from_index_unchecked(index) })
        } else {
            None
        }
    }

    /// Instantiates a new square from its index.
    /// # Safety
    /// If the index is more than 63, causes undefined behavior.
    #[inline]
    pub const unsafe fn from_index_unchecked(index: u8) -> Self {
        unsafe { std::mem::transmute(index) }
    }

    /// Returns the rank of the square.
    #[inline]
    pub const fn rank(self) -> Rank {
        unsafe { Rank::from_index_unchecked((self as u8) >> 3) }
    }
    /// Returns the file of the square.
    #[inline]
    pub const fn file(self) -> File {
        unsafe { File::from_index_unchecked((self as u8) & 7) }
    }

    /// Translates this square by a given delta.
    ///
    /// Returns `None` if the translation would go out of the board.
    #[inline]
    pub const fn translate(self, delta: Delta) -> Option<Self> {
        let file = self.file() as i8 + delta.file_offset();
        let rank = self.rank() as i8 + delta.rank_offset();
        if file >= 0 && file < 8 && rank >= 0 && rank < 8 {
            Some(unsafe { self.translate_unchecked(delta) })
        } else {
            None
        }
    }

    /// Translates this square by a given delta.
    /// # Safety
    /// Doing a translation that would result in an out of board square is
    /// undefined behavior.
    #[inline]
    pub const unsafe fn translate_unchecked(self, delta: Delta) -> Self {
        unsafe { std::mem::transmute((self as u8).wrapping_add_signed(delta as i8)) }
    }

    /// An iterator over all squares, ordered from A1 to H8.
    pub fn squares_iter() -> impl Iterator<Item = Self> {
        (0..64).map(|i| unsafe { Square::from_index_unchecked(i) })
    }

    /// An iterator over the squares of one rank, from the A file to the H file.
    pub fn rank_squares_iter(rank: Rank) -> impl Iterator<Item = Self> {
        (0..8).map(move |file| unsafe {
            Square::new(File::from_index_unchecked(file), rank)
        })
    }

    /// Returns a bitboard containing only this square.
    #[inline]
    pub(crate) const fn bitboard(self) -> Bitboard {
        Bitboard(1 << (self as u8))
    }
}
impl std::ops::Add<Delta> for Square {
    type Output = Square;

    fn add(self, rhs: Delta) -> Self::Output {
        unsafe { std::mem::transmute((self as u8).wrapping_add_signed(rhs as i8)) }
    }
}
impl std::ops::Sub<Delta> for Square {
    type Output = Square;

    fn sub(self, rhs: Delta) -> Self::Output {
        unsafe { std::mem::transmute((self as u8).wrapping_add_signed(-(rhs as i8))) }
    }
}
impl std::fmt::Display for Square {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.file(), self.rank())
    }
}
impl PartialFromStr for Square {
    type Err = ();

    fn partial_from_str(s: &str) -> Result<(Self, &str), Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() < 2 {
            return Err(());
        }
        let file = File::from_symbol(bytes[0]).ok_or(())?;
        let rank = Rank::from_symbol(bytes[1]).ok_or(())?;
        Ok((Self::new(file, rank), &s[2..]))
    }
}
impl std::str::FromStr for Square {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::partial_from_str(s).and_then(|(sq, rest)| if rest.is_empty() { Ok(sq) } else { Err(()) })
    }
}

/// Deltas represent directions in which pieces can move.
///
/// They can be added or subtracted to [Square]s to obtain the target of the
/// translation following this delta.
#[repr(i8)]
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum Delta {
    North = 8,
    South = -8,
    East = 1,
    West = -1,

    NorthEast = 9,
    NorthWest = 7,
    SouthEast = -7,
    SouthWest = -9,

    KnightNorthEast = 17,
    KnightNorthWest = 15,
    KnightSouthEast = -15,
    KnightSouthWest = -17,
    KnightEastNorth = 10,
    KnightWestNorth = 6,
    KnightEastSouth = -6,
    KnightWestSouth = -10,
}
impl Delta {
    pub const KNIGHT_DELTAS: [Self; 8] = [
        Self::KnightNorthEast,
        Self::KnightNorthWest,
        Self::KnightSouthEast,
        Self::KnightSouthWest,
        Self::KnightEastNorth,
        Self::KnightWestNorth,
        Self::KnightEastSouth,
        Self::KnightWestSouth,
    ];
    pub const QUEEN_DELTAS: [Self; 8] = [
        Self::North,
        Self::South,
        Self::East,
        Self::West,
        Self::NorthEast,
        Self::NorthWest,
        Self::SouthEast,
        Self::SouthWest,
    ];
    pub const ORTHOGONAL_DELTAS: [Self; 4] = [Self::North, Self::South, Self::East, Self::West];
    pub const DIAGONAL_DELTAS: [Self; 4] = [
        Self::NorthEast,
        Self::NorthWest,
        Self::SouthEast,
        Self::SouthWest,
    ];

    /// File displacement of this delta.
    #[inline]
    pub const fn file_offset(self) -> i8 {
        match self {
            Self::North | Self::South => 0,
            Self::East | Self::NorthEast | Self::SouthEast => 1,
            Self::West | Self::NorthWest | Self::SouthWest => -1,
            Self::KnightNorthEast | Self::KnightSouthEast => 1,
            Self::KnightNorthWest | Self::KnightSouthWest => -1,
            Self::KnightEastNorth | Self::KnightEastSouth => 2,
            Self::KnightWestNorth | Self::KnightWestSouth => -2,
        }
    }

    /// Rank displacement of this delta.
    #[inline]
    pub const fn rank_offset(self) -> i8 {
        match self {
            Self::East | Self::West => 0,
            Self::North | Self::NorthEast | Self::NorthWest => 1,
            Self::South | Self::SouthEast | Self::SouthWest => -1,
            Self::KnightNorthEast | Self::KnightNorthWest => 2,
            Self::KnightSouthEast | Self::KnightSouthWest => -2,
            Self::KnightEastNorth | Self::KnightWestNorth => 1,
            Self::KnightEastSouth | Self::KnightWestSouth => -1,
        }
    }
}
