//! # Book lookup.
//!
//! Answers "which moves does the book know from this position" for a FEN
//! input, by binary search over the sorted entry file. Results aggregate the
//! entries of each move: in full-provenance books every source game has its
//! own entry, in collapsed books one entry carries the whole weight.

use serde::Serialize;
use thiserror::Error;

use crate::chess::{
    fen::{Fen, FenError},
    moves::{Move, MoveKind, UciMove},
    piece::PieceKind,
    position::{Position, PositionError},
    square::{File, Rank, Square},
    tables,
};
use crate::pgn::GameResult;

use super::{BookError, ENTRY_SIZE, PolyEntry, entry_count, find_first, to_polyglot};

/// Errors answering a lookup.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum QueryError {
    #[error("malformed FEN: {0}")]
    Fen(#[from] FenError),
    #[error("unplayable position: {0}")]
    Position(#[from] PositionError),
    #[error(transparent)]
    Book(#[from] BookError),
}

/// Aggregated statistics of one book move.
#[derive(Serialize, PartialEq, Eq, Debug)]
pub struct MoveReport {
    #[serde(rename = "move")]
    pub uci: String,
    pub weight: u32,
    pub games: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    #[serde(rename = "pgn offsets")]
    pub pgn_offsets: Vec<u64>,
}

/// The JSON object printed for a lookup.
#[derive(Serialize, Debug)]
pub struct QueryReport {
    pub fen: String,
    pub key: String,
    pub moves: Vec<MoveReport>,
}

/// Looks up a position in a raw book byte range.
///
/// `max_game_offsets` truncates each move's source-offset list; `None` keeps
/// all of them.
pub fn find(
    book: &[u8],
    fen_str: &str,
    max_game_offsets: Option<usize>,
) -> Result<QueryReport, QueryError> {
    tables::init();

    if book.len() % ENTRY_SIZE != 0 {
        return Err(BookError::Misaligned(book.len()).into());
    }

    let fen: Fen = fen_str.trim().parse()?;
    let position = Position::from_fen(&fen)?;
    let key = position.key();
    let legal = position.legal_moves();

    let mut moves: Vec<MoveReport> = vec![];
    let total = entry_count(book);
    let mut index = find_first(book, key);
    while index < total {
        // The slice bounds are aligned, from_bytes cannot fail here.
        let entry = PolyEntry::from_bytes(&book[index * ENTRY_SIZE..])?;
        if entry.key != key {
            break;
        }

        // Entries of one move are adjacent in both book flavours.
        let uci = uci_string(&legal, entry.mv);
        if moves.last().map(|m| m.uci.as_str()) != Some(uci.as_str()) {
            moves.push(MoveReport {
                uci,
                weight: 0,
                games: 0,
                wins: 0,
                losses: 0,
                draws: 0,
                pgn_offsets: vec![],
            });
        }
        // The first branch guarantees a last element.
        let report = moves.last_mut().unwrap();
        report.weight += entry.weight as u32;
        report.games += entry.weight as u32;
        match GameResult::from_code(entry.learn >> 30) {
            GameResult::WhiteWin => report.wins += 1,
            GameResult::BlackWin => report.losses += 1,
            GameResult::Draw => report.draws += 1,
            GameResult::Unknown => (),
        }
        report.pgn_offsets.push(((entry.learn & 0x3FFF_FFFF) as u64) << 3);

        index += 1;
    }

    if let Some(limit) = max_game_offsets {
        for report in &mut moves {
            report.pgn_offsets.truncate(limit)
        }
    }

    Ok(QueryReport {
        fen: fen.to_string(),
        key: format!("{key:#018x}"),
        moves,
    })
}

/// Renders a packed book move as coordinate notation, matching it back to a
/// legal move of the queried position so castling prints its king target
/// rather than the stored rook square. Entries no legal move accounts for
/// print their raw squares.
fn uci_string(legal: &[Move], packed: u16) -> String {
    let uci = if let Some(m) = legal.iter().find(|m| to_polyglot(**m) == packed) {
        let target = if m.kind() == MoveKind::Castling {
            let file = if (m.target() as u8) > (m.origin() as u8) {
                File::G
            } else {
                File::C
            };
            Square::new(file, m.origin().rank())
        } else {
            m.target()
        };
        UciMove {
            origin: m.origin(),
            target,
            promoting_to: m.promotion_target(),
        }
    } else {
        // Raw fallback for entries that do not match the position.
        let square = |bits: u16| {
            Square::new(
                File::from_index((bits & 0b111) as u8).unwrap_or(File::A),
                Rank::from_index((bits >> 3 & 0b111) as u8).unwrap_or(Rank::One),
            )
        };
        UciMove {
            origin: square(packed >> 6),
            target: square(packed),
            promoting_to: PieceKind::from_index((packed >> 12 & 0b111) as u8)
                .filter(|piece| piece.is_valid_promotion_target()),
        }
    };
    uci.to_string()
}
