//! A concurrent, sharded position-counting pipeline for chess game corpora.
//!
//! Given a directory tree of game records (optionally gzip/zstd-compressed),
//! this crate replays every game through a small chess engine ([`chess`]),
//! counts how often each position is reached across the whole corpus, and
//! emits the positions that cross a configurable threshold as FEN-like text.
//!
//! The pipeline itself lives in [`corpus`]; [`pgn`] is the game-record
//! parser that drives it. There is no search or evaluation anywhere in this
//! crate -- see [`chess::position`] for what it does do.

pub mod chess;
pub mod corpus;
pub mod pgn;
