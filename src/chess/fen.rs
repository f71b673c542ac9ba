//! # Forsyth-Edwards Notation (FEN) utilities.
//!
//! Allows parsing, formatting and provides a clean API over FEN strings.

use thiserror::Error;

use crate::parsing::{PartialFromStr, parse_int, walk_whitespace};

use super::{
    bitboard::Bitboard,
    castling_rights::CastlingRights,
    colour::{Colour, NUM_COLOURS},
    piece::{NUM_PIECES, Piece, PieceKind},
    square::{Rank, Square},
};

/// FEN parsing errors with context.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Error)]
pub enum FenError {
    /// A section contained an unexpected character.
    #[error("Unexpected character: {0}")]
    UnexpectedToken(char),
    /// A necessary section of the FEN string was missing.
    #[error("FEN string missing the {0} section")]
    Incomplete(&'static str),
    /// The piece section of the FEN string did not define all squares.
    #[error("The piece section does not define every square")]
    IncompletePieceSection,
    /// Too many squares were defined in the FEN string.
    #[error("The piece section defines too many squares")]
    TooManySquares,
    /// Indicates a generic parse error (fallback case).
    #[error("Failed to parse")]
    ParseError,
}

/// FEN string representation.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Fen {
    pub(crate) bitboards: [Bitboard; NUM_COLOURS + NUM_PIECES],
    pub side_to_move: Colour,
    pub castling_rights: CastlingRights,
    pub en_passant: Option<Square>,
    pub halfmove_clock: u16,
    pub fullmove_counter: u16,
}
impl Fen {
    /// Parses a FEN string.
    /// # Example
    /// ```
    /// # use polybook::chess::fen::*;
    /// # use polybook::chess::castling_rights::*;
    /// # use polybook::chess::colour::*;
    /// let initial_position_fen = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
    /// let parsed_values = Fen::parse(initial_position_fen).unwrap();
    /// assert_eq!(parsed_values.side_to_move, Colour::White);
    /// assert_eq!(parsed_values.castling_rights, CastlingRights::full());
    /// ```
    pub fn parse(fen: &str) -> Result<Self, FenError> {
        fen.parse()
    }

    /// Returns the [`PieceKind`] and [`Colour`] of a piece on a given square if any.
    pub fn piece_on(&self, square: Square) -> Option<Piece> {
        let sq_bb = square.bitboard();

        for kind in PieceKind::iter() {
            if self.bitboards[kind as usize + NUM_COLOURS].intersects(sq_bb) {
                return Some(Piece {
                    kind,
                    colour: self.bitboards[Colour::Black as usize]
                        .intersects(sq_bb)
                        .into(),
                });
            }
        }

        None
    }
}
impl PartialFromStr for Fen {
    type Err = FenError;

    fn partial_from_str(s: &str) -> Result<(Self, &str), Self::Err> {
        fn parse_piece_section(mut s: &str) -> Result<([Bitboard; 8], &str), FenError> {
            let mut bitboards = [Bitboard::empty(); 8];
            let mut ranks = Rank::iter().rev();
            let mut squares: Vec<Square> = match ranks.next() {
                Some(rank) => Square::rank_squares_iter(rank).collect(),
                None => vec![],
            };
            let mut cursor = 0;
            while let Some(c) = s.chars().next() {
                if let Some(digit) = c.to_digit(10) {
                    cursor += digit as usize;
                    if cursor > squares.len() {
                        return Err(FenError::TooManySquares);
                    }
                    s = &s[1..];
                } else if c == '/' {
                    if cursor != squares.len() {
                        return Err(FenError::IncompletePieceSection);
                    }
                    squares = match ranks.next() {
                        Some(rank) => Square::rank_squares_iter(rank).collect(),
                        None => return Err(FenError::TooManySquares),
                    };
                    cursor = 0;
                    s = &s[1..];
                } else if c == ' ' {
                    break;
                } else {
                    let (piece, left) =
                        Piece::partial_from_str(s).map_err(|_| FenError::UnexpectedToken(c))?;
                    let square = *squares.get(cursor).ok_or(FenError::TooManySquares)?;
                    cursor += 1;
                    bitboards[NUM_COLOURS + piece.kind as usize].insert(square);
                    bitboards[piece.colour as usize].insert(square);
                    s = left
                }
            }

            if cursor != squares.len() || ranks.next().is_some() {
                Err(FenError::Incomplete("piece placement"))
            } else {
                Ok((bitboards, s))
            }
        }

        let (bitboards, s) = parse_piece_section(s)?;

        let s = walk_whitespace(s);
        let side_to_move = match s.chars().next() {
            Some('w') => Colour::White,
            Some('b') => Colour::Black,
            _ => Err(FenError::Incomplete("side to play"))?,
        };
        let s = &s[1..];

        let (castling_rights, s) = CastlingRights::partial_from_str(walk_whitespace(s))
            .map_err(|_| FenError::Incomplete("castling rights"))?;

        let s = walk_whitespace(s);
        let (en_passant, s) = match s.chars().next() {
            Some('-') => (None, &s[1..]),
            Some(c) => {
                let (sq, s) =
                    Square::partial_from_str(s).map_err(|_| FenError::UnexpectedToken(c))?;
                (Some(sq), s)
            }
            None => Err(FenError::Incomplete("en passant target"))?,
        };

        // Move counters are optional; bare board descriptions are accepted.
        let (halfmove_clock, s) = match parse_int(walk_whitespace(s)) {
            Ok((h, s)) => (h, s),
            Err(_) => (0, s),
        };
        let (fullmove_counter, s) = match parse_int(walk_whitespace(s)) {
            Ok((f, s)) => (f, s),
            Err(_) => (1, s),
        };

        Ok((
            Self {
                bitboards,
                side_to_move,
                en_passant,
                castling_rights,
                halfmove_clock,
                fullmove_counter,
            },
            s,
        ))
    }
}
impl std::str::FromStr for Fen {
    type Err = FenError;

    fn from_str(fen_str: &str) -> Result<Self, Self::Err> {
        Self::partial_from_str(fen_str).and_then(|(fen, s)| {
            if s.trim().is_empty() {
                Ok(fen)
            } else {
                Err(FenError::ParseError)
            }
        })
    }
}
impl std::fmt::Display for Fen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}
impl std::fmt::Debug for Fen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut skip = 0;
        for rank in Rank::iter().rev() {
            for sq in Square::rank_squares_iter(rank) {
                if let Some(p) = self.piece_on(sq) {
                    if skip != 0 {
                        write!(f, "{skip}")?;
                        skip = 0
                    }
                    write!(f, "{p}")?;
                } else {
                    skip += 1
                }
            }
            if skip != 0 {
                write!(f, "{skip}")?;
                skip = 0;
            }
            if rank != Rank::One {
                write!(f, "/")?
            }
        }

        write!(
            f,
            " {} {} {} {} {}",
            if self.side_to_move.is_black() { 'b' } else { 'w' },
            self.castling_rights,
            if let Some(ep) = self.en_passant {
                ep.to_string()
            } else {
                String::from("-")
            },
            self.halfmove_clock,
            self.fullmove_counter
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const INITIAL: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    #[test]
    fn parse_format_roundtrip() {
        for fen in [
            INITIAL,
            "rnbqkbnr/pp1ppppp/8/2p5/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq - 1 2",
            "8/8/8/8/8/4k3/8/4K2R w K - 4 40",
        ] {
            let parsed = Fen::parse(fen).unwrap();
            assert_eq!(parsed.to_string(), fen)
        }
    }

    #[test]
    fn counters_default_when_missing() {
        let fen = Fen::parse("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq -").unwrap();
        assert_eq!(fen.halfmove_clock, 0);
        assert_eq!(fen.fullmove_counter, 1);
    }

    #[test]
    fn rejects_malformed_board() {
        assert!(Fen::parse("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP w KQkq - 0 1").is_err());
        assert!(Fen::parse("rnbqkbnr/ppppppppp/8/8/8/8/8/PPPPPPPP w KQkq - 0 1").is_err());
        assert!(Fen::parse("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR x KQkq - 0 1").is_err());
    }

    #[test]
    fn piece_lookup() {
        let fen = Fen::parse(INITIAL).unwrap();
        assert_eq!(
            fen.piece_on(Square::E2),
            Some(Piece::new(PieceKind::Pawn, Colour::White))
        );
        assert_eq!(
            fen.piece_on(Square::D8),
            Some(Piece::new(PieceKind::Queen, Colour::Black))
        );
        assert_eq!(fen.piece_on(Square::E4), None);
    }
}
