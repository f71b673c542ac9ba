/*
Polybook, a PGN corpus indexer producing Polyglot opening books.
Copyright (C) 2026 the polybook authors

This program is free software: you can redistribute it and/or modify
it under the terms of the GNU Affero General Public License as published
by the Free Software Foundation, either version 3 of the License, or
(at your option) any later version.

This program is distributed in the hope that it will be useful,
but WITHOUT ANY WARRANTY; without even the implied warranty of
MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
GNU Affero General Public License for more details.

You should have received a copy of the GNU Affero General Public License
along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

use std::fs::File;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use memmap2::Mmap;

use polybook::book::{
    index::{BuildOptions, build_book},
    query,
};

#[derive(Parser)]
#[command(name = "polybook", version, about = "PGN corpus indexer producing Polyglot books")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Build `<pgn stem>.bin` out of a PGN file.
    Book {
        /// Path of the PGN file to index.
        pgn: PathBuf,
        /// Keep every (position, move) occurrence instead of collapsing
        /// duplicates, preserving per-game provenance.
        #[arg(long)]
        full: bool,
    },
    /// Look up a position in a built book and print the known moves as JSON.
    Find {
        /// Path of the book file.
        book: PathBuf,
        /// Truncate each move's game-offset list to this many entries.
        #[arg(long)]
        max_game_offsets: Option<usize>,
        /// The position, as FEN fields (quoting the whole string works too).
        #[arg(required = true, num_args = 1..)]
        fen: Vec<String>,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    match Cli::parse().command {
        Command::Book { pgn, full } => book(&pgn, full),
        Command::Find {
            book,
            max_game_offsets,
            fen,
        } => find(&book, max_game_offsets, &fen.join(" ")),
    }
}

fn book(pgn: &PathBuf, full: bool) -> Result<()> {
    let file = File::open(pgn).with_context(|| format!("cannot open {}", pgn.display()))?;
    // SAFETY: the map is read-only and dropped before this function returns;
    // concurrent truncation of the input is not defended against.
    let map = unsafe { Mmap::map(&file) }
        .with_context(|| format!("cannot map {}", pgn.display()))?;

    let book_path = pgn.with_extension("bin");
    let out = File::create(&book_path)
        .with_context(|| format!("cannot create {}", book_path.display()))?;

    eprintln!("Processing {}...", pgn.display());
    let started = Instant::now();
    let report = build_book(&map, out, BuildOptions { full })
        .with_context(|| format!("cannot write {}", book_path.display()))?;
    let elapsed = started.elapsed().as_millis().max(1) as u64;

    let unique = if report.moves != 0 {
        100 * report.unique_keys / report.moves
    } else {
        0
    };
    eprintln!(
        "\nGames: {}\nMoves: {}\nIncomplete games: {}\nUnique positions: {}%\n\
         Games/second: {}\nMoves/second: {}\nMBytes/second: {:.3}\n\
         Size of index file (MB): {:.3}\nBook file: {}\nProcessing time (ms): {}",
        report.games,
        report.moves,
        report.dropped + report.fixed,
        unique,
        1000 * report.games / elapsed,
        1000 * report.moves / elapsed,
        map.len() as f64 / elapsed as f64 / 1000.0,
        report.bytes_written as f64 / 1_000_000.0,
        book_path.display(),
        elapsed
    );

    Ok(())
}

fn find(book: &PathBuf, max_game_offsets: Option<usize>, fen: &str) -> Result<()> {
    let file = File::open(book).with_context(|| format!("cannot open {}", book.display()))?;
    // SAFETY: read-only map, dropped on return.
    let map = unsafe { Mmap::map(&file) }
        .with_context(|| format!("cannot map {}", book.display()))?;

    let report = query::find(&map, fen, max_game_offsets)
        .with_context(|| format!("lookup failed in {}", book.display()))?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
