//! Tracks the ability to [castle] each side (kingside is often referred to as
//! O-O or OO, queenside -- O-O-O or OOO). When the king moves, the player
//! loses the ability to castle both sides; when a rook moves, the player
//! loses the ability to castle its corresponding side.
//!
//! [castle]: https://www.chessprogramming.org/Castling

use std::fmt;

use anyhow::bail;
use bitflags::bitflags;

use crate::chess::core::{File, Player};

bitflags! {
    /// Which sides each player may still castle to. Does not by itself know
    /// which file the castling rook starts on -- see [`CastleRookFiles`] for
    /// the Chess960 (Fischer Random) generalization of that.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct CastleRights: u8 {
        const WHITE_SHORT = 0b0001;
        const WHITE_LONG  = 0b0010;
        const BLACK_SHORT = 0b0100;
        const BLACK_LONG  = 0b1000;
    }
}

impl CastleRights {
    /// Convenience alias matching [`bitflags::Flags::all`] so call sites
    /// read naturally as "every right granted".
    pub const ALL: Self = Self::all();

    #[must_use]
    pub(in crate::chess) const fn short(player: Player) -> Self {
        match player {
            Player::White => Self::WHITE_SHORT,
            Player::Black => Self::BLACK_SHORT,
        }
    }

    #[must_use]
    pub(in crate::chess) const fn long(player: Player) -> Self {
        match player {
            Player::White => Self::WHITE_LONG,
            Player::Black => Self::BLACK_LONG,
        }
    }
}

impl TryFrom<&str> for CastleRights {
    type Error = anyhow::Error;

    /// Parses the combined four-letter FEN castling field, e.g. `"KQkq"`,
    /// `"Kq"` or `"-"`. Shredder-FEN (rook-file-letter) castling fields are
    /// handled separately by [`crate::chess::position::Position::set_fen`],
    /// which has the board context needed to map a rook file to a side.
    fn try_from(fen: &str) -> anyhow::Result<Self> {
        if fen == "-" {
            return Ok(Self::empty());
        }
        let mut rights = Self::empty();
        for ch in fen.chars() {
            rights |= match ch {
                'K' => Self::WHITE_SHORT,
                'Q' => Self::WHITE_LONG,
                'k' => Self::BLACK_SHORT,
                'q' => Self::BLACK_LONG,
                _ => bail!("unknown castling rights symbol '{ch}' in '{fen}'"),
            };
        }
        Ok(rights)
    }
}

impl fmt::Display for CastleRights {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "-");
        }
        if self.contains(Self::WHITE_SHORT) {
            write!(f, "K")?;
        }
        if self.contains(Self::WHITE_LONG) {
            write!(f, "Q")?;
        }
        if self.contains(Self::BLACK_SHORT) {
            write!(f, "k")?;
        }
        if self.contains(Self::BLACK_LONG) {
            write!(f, "q")?;
        }
        Ok(())
    }
}

/// The file the castling rook starts on for each player/side, so that
/// Chess960 positions (where the rook is not necessarily on the `a`/`h`
/// file) can be castled correctly. Standard chess always uses
/// `Default::default()`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CastleRookFiles {
    pub white_short: File,
    pub white_long: File,
    pub black_short: File,
    pub black_long: File,
}

impl Default for CastleRookFiles {
    fn default() -> Self {
        Self {
            white_short: File::H,
            white_long: File::A,
            black_short: File::H,
            black_long: File::A,
        }
    }
}

impl CastleRookFiles {
    #[must_use]
    pub(in crate::chess) const fn get(self, player: Player, short: bool) -> File {
        match (player, short) {
            (Player::White, true) => self.white_short,
            (Player::White, false) => self.white_long,
            (Player::Black, true) => self.black_short,
            (Player::Black, false) => self.black_long,
        }
    }

    pub(in crate::chess) fn set(&mut self, player: Player, short: bool, file: File) {
        match (player, short) {
            (Player::White, true) => self.white_short = file,
            (Player::White, false) => self.white_long = file,
            (Player::Black, true) => self.black_short = file,
            (Player::Black, false) => self.black_long = file,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parses_and_renders() {
        assert_eq!(CastleRights::try_from("KQkq").unwrap(), CastleRights::ALL);
        assert_eq!(CastleRights::try_from("-").unwrap(), CastleRights::empty());
        assert_eq!(CastleRights::ALL.to_string(), "KQkq");
        assert_eq!(CastleRights::empty().to_string(), "-");
    }

    #[test]
    fn partial_rights_roundtrip() {
        let rights = CastleRights::try_from("Kq").unwrap();
        assert_eq!(rights.to_string(), "Kq");
    }

    #[test]
    fn rejects_unknown_symbol() {
        assert!(CastleRights::try_from("x").is_err());
    }
}
