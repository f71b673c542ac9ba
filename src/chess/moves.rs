//! # Representation, parsing and formatting of chess moves.
//! Contains the internal packed move representation along with the SAN and
//! UCI surface notations, complete with methods for formatting, converting
//! and parsing.

use super::{
    piece::PieceKind,
    square::{File, Rank, Square},
};

/// Upper bound on the number of legal moves in any reachable position.
pub const MAX_MOVES: usize = 256;

/// A bounded, stack-allocated list of moves filled by the generator.
pub type MoveList = heapless::Vec<Move, MAX_MOVES>;

/// The special-move discriminant of a packed [`Move`].
#[repr(u16)]
#[derive(Clone, Copy, Hash, PartialEq, Eq, Debug)]
pub enum MoveKind {
    Normal = 0,
    Promotion = 1,
    EnPassant = 2,
    Castling = 3,
}

/// Internal efficient representation of moves:
/// - bits 0-5: destination square
/// - bits 6-11: origin square
/// - bits 12-13: promotion piece code (knight = 0 ... queen = 3)
/// - bits 14-15: special flag (normal, promotion, en passant, castling)
///
/// Castling is encoded as the king capturing its own rook, which is also the
/// convention of the book format: for all non-promotion moves the low 14 bits
/// can be written out as-is.
#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct Move(u16);
impl Move {
    /// Reserved "no move" value.
    pub const NONE: Self = Self(0);
    /// The null move, a pass used by game records (`--`).
    pub const NULL: Self = Self(65);

    /// Creates a new normal move.
    #[inline(always)]
    pub(crate) const fn new(origin: Square, target: Square) -> Self {
        Self((origin as u16) << 6 | target as u16)
    }

    /// Creates a new promoting move.
    #[inline(always)]
    pub(crate) const fn new_promotion(
        origin: Square,
        target: Square,
        promoting_to: PieceKind,
    ) -> Self {
        Self(
            (MoveKind::Promotion as u16) << 14
                | (promoting_to as u16 - PieceKind::Knight as u16) << 12
                | (origin as u16) << 6
                | target as u16,
        )
    }

    /// Creates the set of promotions from one pawn move.
    #[inline(always)]
    pub(crate) const fn new_promotions(origin: Square, target: Square) -> [Self; 4] {
        [
            Self::new_promotion(origin, target, PieceKind::Knight),
            Self::new_promotion(origin, target, PieceKind::Bishop),
            Self::new_promotion(origin, target, PieceKind::Rook),
            Self::new_promotion(origin, target, PieceKind::Queen),
        ]
    }

    /// Creates an en passant capture.
    #[inline(always)]
    pub(crate) const fn new_en_passant(origin: Square, target: Square) -> Self {
        Self((MoveKind::EnPassant as u16) << 14 | (origin as u16) << 6 | target as u16)
    }

    /// Creates a castling move in king-captures-own-rook form.
    #[inline(always)]
    pub(crate) const fn new_castling(king: Square, rook: Square) -> Self {
        Self((MoveKind::Castling as u16) << 14 | (king as u16) << 6 | rook as u16)
    }

    /// Returns the square the move originates from.
    #[inline(always)]
    pub const fn origin(self) -> Square {
        unsafe { Square::from_index_unchecked((self.0 >> 6 & 0x3F) as u8) }
    }
    /// Returns the square the move targets.
    #[inline(always)]
    pub const fn target(self) -> Square {
        unsafe { Square::from_index_unchecked((self.0 & 0x3F) as u8) }
    }

    /// Returns the special-move discriminant.
    #[inline(always)]
    pub const fn kind(self) -> MoveKind {
        unsafe { std::mem::transmute(self.0 >> 14) }
    }

    /// Checks if this move is a promotion, and returns the promotion target if so.
    #[inline(always)]
    pub const fn promotion_target(self) -> Option<PieceKind> {
        if matches!(self.kind(), MoveKind::Promotion) {
            Some(unsafe {
                std::mem::transmute::<u8, PieceKind>(
                    (self.0 >> 12 & 0b11) as u8 + PieceKind::Knight as u8,
                )
            })
        } else {
            None
        }
    }

    /// Checks that this value encodes an actual move.
    #[inline(always)]
    pub const fn is_some(self) -> bool {
        self.0 != Self::NONE.0 && self.0 != Self::NULL.0
    }

    /// Raw bit pattern, exposed for book encoding.
    #[inline(always)]
    pub const fn bits(self) -> u16 {
        self.0
    }
}
impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.origin(), self.target())?;
        if let Some(kind) = self.promotion_target() {
            write!(f, "{kind}")?
        }
        Ok(())
    }
}

/// Pure coordinate notation move, used for query output.
#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct UciMove {
    pub origin: Square,
    pub target: Square,
    pub promoting_to: Option<PieceKind>,
}
impl std::fmt::Display for UciMove {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.origin, self.target)?;
        if let Some(kind) = self.promoting_to {
            write!(f, "{kind}")?
        }
        Ok(())
    }
}

/// Standard Algebraic Notation (SAN) move as found in game records.
///
/// This is a surface representation: resolving it against an actual position
/// is the job of [`Position::resolve_san`](super::position::Position::resolve_san).
/// Records in the wild omit capture markers, add redundant disambiguation and
/// tack on annotations, so this type keeps exactly the constraints the token
/// expressed and nothing more.
#[derive(Clone, Copy, Hash, PartialEq, Eq, Debug)]
pub enum SanMove {
    /// A pawn or piece move with optional constraints.
    Standard {
        moving_piece: PieceKind,
        origin_file: Option<File>,
        origin_rank: Option<Rank>,
        is_capture: bool,
        target: Square,
        promoting_to: Option<PieceKind>,
    },
    KingSideCastle,
    QueenSideCastle,
    /// The `--` pass move.
    Null,
}
impl SanMove {
    /// Parses a SAN token from raw bytes.
    ///
    /// Annotation suffixes (`!?+#`) are expected to have been stripped by the
    /// tokeniser; capture markers and `=`-less promotions are tolerated.
    /// Returns `None` when the bytes cannot encode a move.
    pub fn from_bytes(token: &[u8]) -> Option<Self> {
        if token == b"--" {
            return Some(Self::Null);
        }

        // Castling, with the `0-0` spelling seen in older records.
        if matches!(token.first(), Some(b'O' | b'o' | b'0')) {
            let normalised: Vec<u8> = token
                .iter()
                .map(|&b| if b == b'o' || b == b'0' { b'O' } else { b })
                .collect();
            return if normalised.starts_with(b"O-O-O") {
                Some(Self::QueenSideCastle)
            } else if normalised.starts_with(b"O-O") {
                Some(Self::KingSideCastle)
            } else {
                None
            };
        }

        // Everything else parses from the tail: promotion, then target
        // square, then capture marker, then piece letter and disambiguation.
        let mut s = token;
        let mut promoting_to = None;
        if let [head @ .., b'=', p] = s {
            let kind = PieceKind::from_symbol(*p as char)?;
            if !kind.is_valid_promotion_target() {
                return None;
            }
            promoting_to = Some(kind);
            s = head;
        } else if let [head @ .., p @ (b'N' | b'B' | b'R' | b'Q')] = s {
            if head.len() >= 2 {
                promoting_to = PieceKind::from_symbol(*p as char);
                s = head;
            }
        }

        let [head @ .., file, rank] = s else {
            return None;
        };
        let target = Square::new(File::from_symbol(*file)?, Rank::from_symbol(*rank)?);
        let mut s = head;

        let mut is_capture = false;
        if let [head @ .., b'x'] = s {
            is_capture = true;
            s = head;
        }

        let mut moving_piece = PieceKind::Pawn;
        if let Some(&head_byte) = s.first() {
            if head_byte.is_ascii_uppercase() {
                moving_piece = PieceKind::from_symbol(head_byte as char)?;
                if moving_piece == PieceKind::Pawn {
                    return None;
                }
                s = &s[1..];
            }
        }

        let mut origin_file = None;
        let mut origin_rank = None;
        for &b in s {
            if let Some(file) = File::from_symbol(b) {
                if origin_file.is_some() {
                    return None;
                }
                origin_file = Some(file)
            } else if let Some(rank) = Rank::from_symbol(b) {
                if origin_rank.is_some() {
                    return None;
                }
                origin_rank = Some(rank)
            } else {
                return None;
            }
        }
        if promoting_to.is_some() && moving_piece != PieceKind::Pawn {
            return None;
        }

        Some(Self::Standard {
            moving_piece,
            origin_file,
            origin_rank,
            is_capture,
            target,
            promoting_to,
        })
    }
}
impl std::fmt::Display for SanMove {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::Standard {
                moving_piece,
                origin_file,
                origin_rank,
                is_capture,
                target,
                promoting_to,
            } => {
                if moving_piece != PieceKind::Pawn {
                    write!(f, "{}", moving_piece.to_string().to_uppercase())?
                }
                if let Some(file) = origin_file {
                    write!(f, "{file}")?
                }
                if let Some(rank) = origin_rank {
                    write!(f, "{rank}")?
                }
                if is_capture {
                    write!(f, "x")?
                }
                write!(f, "{target}")?;
                if let Some(kind) = promoting_to {
                    write!(f, "={}", kind.to_string().to_uppercase())?
                }
                Ok(())
            }
            Self::KingSideCastle => write!(f, "O-O"),
            Self::QueenSideCastle => write!(f, "O-O-O"),
            Self::Null => write!(f, "--"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn san_parse_pawn_push() {
        assert_eq!(
            SanMove::from_bytes(b"e4"),
            Some(SanMove::Standard {
                moving_piece: PieceKind::Pawn,
                origin_file: None,
                origin_rank: None,
                is_capture: false,
                target: Square::E4,
                promoting_to: None
            })
        );
    }

    #[test]
    fn san_parse_pawn_capture() {
        assert_eq!(
            SanMove::from_bytes(b"exd5"),
            Some(SanMove::Standard {
                moving_piece: PieceKind::Pawn,
                origin_file: Some(File::E),
                origin_rank: None,
                is_capture: true,
                target: Square::D5,
                promoting_to: None
            })
        );
    }

    #[test]
    fn san_parse_piece_moves() {
        assert_eq!(
            SanMove::from_bytes(b"Nf3"),
            Some(SanMove::Standard {
                moving_piece: PieceKind::Knight,
                origin_file: None,
                origin_rank: None,
                is_capture: false,
                target: Square::F3,
                promoting_to: None
            })
        );
        assert_eq!(
            SanMove::from_bytes(b"Nbd2"),
            Some(SanMove::Standard {
                moving_piece: PieceKind::Knight,
                origin_file: Some(File::B),
                origin_rank: None,
                is_capture: false,
                target: Square::D2,
                promoting_to: None
            })
        );
        assert_eq!(
            SanMove::from_bytes(b"R1a3"),
            Some(SanMove::Standard {
                moving_piece: PieceKind::Rook,
                origin_file: None,
                origin_rank: Some(Rank::One),
                is_capture: false,
                target: Square::A3,
                promoting_to: None
            })
        );
        assert_eq!(
            SanMove::from_bytes(b"Qh4xe1"),
            Some(SanMove::Standard {
                moving_piece: PieceKind::Queen,
                origin_file: Some(File::H),
                origin_rank: Some(Rank::Four),
                is_capture: true,
                target: Square::E1,
                promoting_to: None
            })
        );
    }

    #[test]
    fn san_parse_promotions() {
        let expected = Some(SanMove::Standard {
            moving_piece: PieceKind::Pawn,
            origin_file: Some(File::G),
            origin_rank: None,
            is_capture: true,
            target: Square::H8,
            promoting_to: Some(PieceKind::Queen),
        });
        assert_eq!(SanMove::from_bytes(b"gxh8=Q"), expected);
        assert_eq!(SanMove::from_bytes(b"gxh8Q"), expected);
    }

    #[test]
    fn san_parse_castling() {
        assert_eq!(SanMove::from_bytes(b"O-O"), Some(SanMove::KingSideCastle));
        assert_eq!(SanMove::from_bytes(b"0-0-0"), Some(SanMove::QueenSideCastle));
        assert_eq!(SanMove::from_bytes(b"o-o"), Some(SanMove::KingSideCastle));
    }

    #[test]
    fn san_parse_null() {
        assert_eq!(SanMove::from_bytes(b"--"), Some(SanMove::Null));
    }

    #[test]
    fn san_parse_garbage() {
        assert_eq!(SanMove::from_bytes(b""), None);
        assert_eq!(SanMove::from_bytes(b"xx"), None);
        assert_eq!(SanMove::from_bytes(b"e9"), None);
        assert_eq!(SanMove::from_bytes(b"Pe4"), None);
    }

    #[test]
    fn move_packing_roundtrip() {
        let m = Move::new(Square::E2, Square::E4);
        assert_eq!(m.origin(), Square::E2);
        assert_eq!(m.target(), Square::E4);
        assert_eq!(m.kind(), MoveKind::Normal);
        assert_eq!(m.promotion_target(), None);

        let p = Move::new_promotion(Square::G7, Square::H8, PieceKind::Rook);
        assert_eq!(p.kind(), MoveKind::Promotion);
        assert_eq!(p.promotion_target(), Some(PieceKind::Rook));

        let c = Move::new_castling(Square::E1, Square::H1);
        assert_eq!(c.kind(), MoveKind::Castling);
        assert_eq!(c.origin(), Square::E1);
        assert_eq!(c.target(), Square::H1);
    }
}
