//! # Book building pipeline.
//!
//! Drives the scanner over a PGN byte range, replays every game through the
//! board state to collect `(key, move, weight, learn)` records, then sorts,
//! frequency-ranks and streams the records out in wire order.

use std::io::{self, BufWriter, Write};

use log::{info, warn};

use crate::chess::{
    fen::Fen,
    moves::SanMove,
    position::{MAX_GAME_PLIES, Position},
    tables,
};
use crate::pgn::{self, RawGame};

use super::{ENTRY_SIZE, PolyEntry, to_polyglot};

/// Book building options.
#[derive(Clone, Copy, Default, Debug)]
pub struct BuildOptions {
    /// Keep every `(position, move)` occurrence instead of collapsing
    /// duplicates, preserving per-game provenance in the `learn` field.
    pub full: bool,
}

/// Counters reported at the end of a build.
#[derive(Clone, Copy, Default, Debug)]
pub struct BuildReport {
    /// Games flushed by the scanner.
    pub games: u64,
    /// SAN tokens seen across all games.
    pub moves: u64,
    /// Games the scanner had to drop or terminate early.
    pub dropped: u64,
    /// Games abandoned during replay: unresolvable or ambiguous notation,
    /// malformed header positions, over-long games.
    pub fixed: u64,
    /// Distinct position keys among the collected records.
    pub unique_keys: u64,
    /// Entries written to the output.
    pub entries: u64,
    /// Bytes written to the output.
    pub bytes_written: u64,
}

/// Builds a book from a PGN byte range into `out`.
///
/// The record vector, the scanner buffers and the replay position all live
/// within this call.
pub fn build_book<W: Write>(
    data: &[u8],
    out: W,
    options: BuildOptions,
) -> io::Result<BuildReport> {
    tables::init();

    let root = Position::initial();
    let mut scratch = root.clone();

    // Crude capacity estimate: records tend to outnumber file bytes divided
    // by entry size by a factor of two.
    let mut records: Vec<PolyEntry> = Vec::with_capacity(2 * data.len() / ENTRY_SIZE);
    let mut fixed = 0u64;

    let scan_stats = pgn::scan(data, |game| {
        replay_game(&root, &mut scratch, &game, &mut records, &mut fixed)
    });
    info!(
        "scanned {} games, {} moves, collected {} records",
        scan_stats.games,
        scan_stats.moves,
        records.len()
    );

    records.sort_unstable_by_key(|e| (e.key, e.mv, e.learn));

    // Frequency pass: inside every run of at least three records sharing a
    // key, weights become per-move occurrence counts and the run is ordered
    // most-played first. In full mode weights stay at one.
    let mut unique_keys = 0u64;
    let mut start = 0;
    while start < records.len() {
        let key = records[start].key;
        let mut end = start + 1;
        while end < records.len() && records[end].key == key {
            end += 1
        }
        unique_keys += 1;
        if !options.full && end - start > 2 {
            sort_by_frequency(&mut records[start..end]);
        }
        start = end;
    }

    let mut writer = BufWriter::new(out);
    let mut entries = 0u64;
    let mut previous: Option<(u64, u16)> = None;
    for entry in &records {
        if !options.full && previous == Some((entry.key, entry.mv)) {
            continue;
        }
        debug_assert!(entry.weight >= 1);
        writer.write_all(&entry.to_bytes())?;
        previous = Some((entry.key, entry.mv));
        entries += 1;
    }
    writer.flush()?;

    Ok(BuildReport {
        games: scan_stats.games,
        moves: scan_stats.moves,
        dropped: scan_stats.dropped,
        fixed,
        unique_keys,
        entries,
        bytes_written: entries * ENTRY_SIZE as u64,
    })
}

/// Replays one scanned game, appending a record per position/move reached.
///
/// A SAN token that cannot be resolved abandons the rest of the game but
/// keeps the records emitted so far, as does exceeding the ply bound.
fn replay_game(
    root: &Position,
    position: &mut Position,
    game: &RawGame,
    records: &mut Vec<PolyEntry>,
    fixed: &mut u64,
) {
    match game.fen {
        Some(bytes) => {
            let parsed = std::str::from_utf8(bytes)
                .ok()
                .and_then(|s| s.trim().parse::<Fen>().ok())
                .and_then(|fen| Position::from_fen(&fen).ok());
            match parsed {
                Some(start) => *position = start,
                None => {
                    warn!(
                        "abandoning game at offset {}: malformed FEN header {:?}",
                        game.result_offset,
                        String::from_utf8_lossy(bytes)
                    );
                    *fixed += 1;
                    return;
                }
            }
        }
        None => position.copy_from(root),
    }

    let learn =
        (game.result.code() << 30) | ((game.result_offset >> 3) as u32 & 0x3FFF_FFFF);

    for token in game.sans.split(|&b| b == 0).filter(|t| !t.is_empty()) {
        if position.ply() >= MAX_GAME_PLIES {
            *fixed += 1;
            return;
        }
        let Some(san) = SanMove::from_bytes(token) else {
            *fixed += 1;
            return;
        };
        if san == SanMove::Null {
            position.make_null();
            continue;
        }
        let Some(m) = position.resolve_san(&san) else {
            *fixed += 1;
            return;
        };
        records.push(PolyEntry {
            key: position.key(),
            mv: to_polyglot(m),
            weight: 1,
            learn,
        });
        // SAFETY: the move comes straight out of the legal move list.
        unsafe { position.make_unchecked(m) };
    }
}

/// Recomputes the weights of one equal-key run as per-move counts and orders
/// it by descending weight, then descending move. The records arrive sorted
/// by `(move, learn)`, so occurrences of one move are adjacent, and the learn
/// tiebreak keeps the ordering total even before duplicates collapse.
fn sort_by_frequency(run: &mut [PolyEntry]) {
    let mut i = 0;
    while i < run.len() {
        let mut j = i + 1;
        while j < run.len() && run[j].mv == run[i].mv {
            j += 1
        }
        let weight = (j - i).min(u16::MAX as usize) as u16;
        for entry in &mut run[i..j] {
            entry.weight = weight
        }
        i = j;
    }

    run.sort_unstable_by(|a, b| {
        b.weight
            .cmp(&a.weight)
            .then(b.mv.cmp(&a.mv))
            .then(a.learn.cmp(&b.learn))
    });
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn frequency_ranks_most_played_first() {
        let entry = |mv: u16, learn: u32| PolyEntry {
            key: 1,
            mv,
            weight: 1,
            learn,
        };
        let mut run = [entry(10, 0), entry(10, 1), entry(20, 2), entry(10, 3)];
        run.sort_unstable_by_key(|e| (e.mv, e.learn));
        sort_by_frequency(&mut run);
        assert_eq!(run[0].mv, 10);
        assert_eq!(run[0].weight, 3);
        assert_eq!(run[3].mv, 20);
        assert_eq!(run[3].weight, 1);
        // Provenance order within one move stays deterministic.
        assert_eq!([run[0].learn, run[1].learn, run[2].learn], [0, 1, 3]);
    }
}
