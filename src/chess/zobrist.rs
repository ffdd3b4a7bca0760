//! The Zobrist key type used to hash chess positions for fast equality and
//! hash-map lookups.
//!
//! [Zobrist hashing]: https://www.chessprogramming.org/Zobrist_Hashing

/// A Zobrist key is a 64-bit integer computed by XORing together one
/// pseudo-random value per "feature" of a position (piece placement,
/// castling rights, en passant file, side to move).
pub type Key = u64;

