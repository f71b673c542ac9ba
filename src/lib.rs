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

//! # Polybook
//! Turns large PGN game collections into Polyglot opening books: a sorted
//! binary index mapping every position reached during play to the moves
//! played from it, with frequency weights and pointers back into the source
//! file. The companion lookup answers, for a FEN position, which moves the
//! book knows with which statistics.
//!
//! The interesting parts live in three modules:
//! - [`pgn`], a byte-driven scanner that structures possibly malformed PGN
//!   into per-game SAN token sequences without ever failing fatally;
//! - [`chess`], a board representation with the book format's fixed hashing
//!   scheme, full legal move generation and notation resolution;
//! - [`book`], the record accumulation, sorting, frequency ranking and
//!   serialisation pipeline, plus the binary-search lookup.

pub mod book;
pub mod chess;
pub mod parsing;
pub mod pgn;
