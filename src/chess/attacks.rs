//! Attack tables and check/pin detection.
//!
//! Unlike a magic-bitboard/PEXT move generator, sliding-piece attacks here are
//! computed by ray-scanning the occupancy at call time rather than through
//! build-time generated lookup tables. This trades some raw move-generation
//! throughput for an implementation whose correctness does not depend on
//! generated code, which matters more for a corpus-mining tool that spends
//! most of its time in parsing and hashing, not search.

use crate::chess::bitboard::{Bitboard, Pieces};
use crate::chess::core::{Direction, Player, Square};

// Castling-path bitboards are computed dynamically in
// `crate::chess::position::generate_castle_moves` from the position's
// `CastleRookFiles`, rather than hardcoded here, so that Chess960 rook
// starting files are handled without a separate code path.

const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];

const KING_OFFSETS: [(i8, i8); 8] = [
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
];

fn offset_attacks(square: Square, offsets: &[(i8, i8)]) -> Bitboard {
    let file = square.file() as i8;
    let rank = square.rank() as i8;
    let mut result = Bitboard::empty();
    for (df, dr) in offsets {
        let (nf, nr) = (file + df, rank + dr);
        if !(0..8).contains(&nf) || !(0..8).contains(&nr) {
            continue;
        }
        let target = Square::new(
            (nf as u8).try_into().expect("nf is within 0..8"),
            (nr as u8).try_into().expect("nr is within 0..8"),
        );
        result.extend(target);
    }
    result
}

/// Squares a knight on `square` attacks.
#[must_use]
pub fn knight_attacks(square: Square) -> Bitboard {
    offset_attacks(square, &KNIGHT_OFFSETS)
}

/// Squares a king on `square` attacks (ignoring castling).
#[must_use]
pub fn king_attacks(square: Square) -> Bitboard {
    offset_attacks(square, &KING_OFFSETS)
}

/// Squares a pawn of `player`'s color on `square` attacks (diagonal captures
/// only, not the forward push).
#[must_use]
pub fn pawn_attacks(square: Square, player: Player) -> Bitboard {
    let directions: [Direction; 2] = match player {
        Player::White => [Direction::UpLeft, Direction::UpRight],
        Player::Black => [Direction::DownLeft, Direction::DownRight],
    };
    let mut result = Bitboard::empty();
    for direction in directions {
        if let Some(target) = square.shift(direction) {
            result.extend(target);
        }
    }
    result
}

const ROOK_DIRECTIONS: [Direction; 4] = [
    Direction::Up,
    Direction::Down,
    Direction::Left,
    Direction::Right,
];

const BISHOP_DIRECTIONS: [Direction; 4] = [
    Direction::UpLeft,
    Direction::UpRight,
    Direction::DownLeft,
    Direction::DownRight,
];

fn slide(square: Square, occupancy: Bitboard, directions: &[Direction]) -> Bitboard {
    let mut result = Bitboard::empty();
    for &direction in directions {
        let mut current = square;
        while let Some(next) = current.shift(direction) {
            result.extend(next);
            if occupancy.contains(next) {
                break;
            }
            current = next;
        }
    }
    result
}

/// Squares a rook attacks given the board's occupancy (blockers stop the
/// ray but are themselves included, since they may be captures).
#[must_use]
pub fn rook_attacks(square: Square, occupancy: Bitboard) -> Bitboard {
    slide(square, occupancy, &ROOK_DIRECTIONS)
}

/// Squares a bishop attacks given the board's occupancy.
#[must_use]
pub fn bishop_attacks(square: Square, occupancy: Bitboard) -> Bitboard {
    slide(square, occupancy, &BISHOP_DIRECTIONS)
}

/// Squares a queen attacks given the board's occupancy.
#[must_use]
pub fn queen_attacks(square: Square, occupancy: Bitboard) -> Bitboard {
    rook_attacks(square, occupancy) | bishop_attacks(square, occupancy)
}

fn walk_exclusive(from: Square, to: Square, direction: Direction) -> Bitboard {
    let mut result = Bitboard::empty();
    let mut current = from;
    loop {
        if current == to {
            break;
        }
        result.extend(current);
        match current.shift(direction) {
            Some(next) => current = next,
            None => break,
        }
    }
    result
}

fn direction_between(from: Square, to: Square) -> Option<Direction> {
    let file_diff = to.file() as i8 - from.file() as i8;
    let rank_diff = to.rank() as i8 - from.rank() as i8;
    match (file_diff.signum(), rank_diff.signum()) {
        (0, 1) => Some(Direction::Up),
        (0, -1) => Some(Direction::Down),
        (1, 0) => Some(Direction::Right),
        (-1, 0) => Some(Direction::Left),
        (1, 1) if file_diff.abs() == rank_diff.abs() => Some(Direction::UpLeft),
        (-1, 1) if file_diff.abs() == rank_diff.abs() => Some(Direction::UpRight),
        (1, -1) if file_diff.abs() == rank_diff.abs() => Some(Direction::DownLeft),
        (-1, -1) if file_diff.abs() == rank_diff.abs() => Some(Direction::DownRight),
        _ => None,
    }
}

/// Squares strictly on the rook-line between `from` (inclusive) and `to`
/// (exclusive), or an empty bitboard if the two squares do not share a rank
/// or file.
#[must_use]
pub fn rook_ray(from: Square, to: Square) -> Bitboard {
    match direction_between(from, to) {
        Some(direction @ (Direction::Up | Direction::Down | Direction::Left | Direction::Right)) => {
            walk_exclusive(from, to, direction)
        }
        _ => Bitboard::empty(),
    }
}

/// Squares strictly on the diagonal between `from` (inclusive) and `to`
/// (exclusive), or an empty bitboard if the two squares are not on a shared
/// diagonal.
#[must_use]
pub fn bishop_ray(from: Square, to: Square) -> Bitboard {
    match direction_between(from, to) {
        Some(
            direction @ (Direction::UpLeft
            | Direction::UpRight
            | Direction::DownLeft
            | Direction::DownRight),
        ) => walk_exclusive(from, to, direction),
        _ => Bitboard::empty(),
    }
}

/// Squares between `from` (inclusive) and `to` (exclusive) along whichever
/// line (rank, file or diagonal) connects them, or empty if they share
/// none.
#[must_use]
pub fn ray(from: Square, to: Square) -> Bitboard {
    let rook_like = rook_ray(from, to);
    if rook_like.has_any() {
        return rook_like;
    }
    bishop_ray(from, to)
}

/// Checkers, pins and attacked squares for the side to move, computed from
/// the perspective of `them` attacking `king`.
#[derive(Clone, Copy, Debug)]
pub struct AttackInfo {
    /// Enemy pieces currently giving check.
    pub checkers: Bitboard,
    /// Our pieces that may not move off the line between them and our king
    /// without exposing it to check.
    pub pins: Bitboard,
    /// Every square `them` attacks, computed with our king removed from the
    /// occupancy so that sliding pieces correctly "see through" it.
    pub attacks: Bitboard,
    /// Squares the king may safely step to.
    pub safe_king_squares: Bitboard,
}

impl AttackInfo {
    /// Computes attack information. `occupancy` must include every piece on
    /// the board (both sides); `our_occupancy` only the side to move's own
    /// pieces.
    #[must_use]
    pub fn new(
        them: Player,
        their_pieces: &Pieces,
        king: Square,
        our_occupancy: Bitboard,
        occupancy: Bitboard,
    ) -> Self {
        let mut occupancy_without_king = occupancy;
        occupancy_without_king.clear(king);

        let mut attacks = king_attacks(their_pieces.king.as_square());
        let mut checkers = Bitboard::empty();
        let mut pins = Bitboard::empty();

        for from in their_pieces.knights.iter() {
            let targets = knight_attacks(from);
            attacks |= targets;
            if targets.contains(king) {
                checkers.extend(from);
            }
        }
        for from in their_pieces.pawns.iter() {
            let targets = pawn_attacks(from, them);
            attacks |= targets;
            if targets.contains(king) {
                checkers.extend(from);
            }
        }

        let sliders = their_pieces
            .rooks
            .iter()
            .map(|from| (from, true, false))
            .chain(their_pieces.bishops.iter().map(|from| (from, false, true)))
            .chain(their_pieces.queens.iter().map(|from| (from, true, true)));
        for (from, orthogonal, diagonal) in sliders {
            let xray = match (orthogonal, diagonal) {
                (true, false) => rook_attacks(from, occupancy_without_king),
                (false, true) => bishop_attacks(from, occupancy_without_king),
                (true, true) => queen_attacks(from, occupancy_without_king),
                (false, false) => unreachable!("every slider is either a rook, bishop or queen"),
            };
            attacks |= xray;

            let line = if orthogonal {
                let candidate = rook_ray(from, king);
                if candidate.has_any() {
                    candidate
                } else if diagonal {
                    bishop_ray(from, king)
                } else {
                    Bitboard::empty()
                }
            } else {
                bishop_ray(from, king)
            };
            if line.is_empty() {
                continue;
            }
            let between = (line - Bitboard::from(from)) & occupancy;
            match between.count() {
                0 => checkers.extend(from),
                1 if (between & our_occupancy).has_any() => pins |= between,
                _ => {}
            }
        }

        let safe_king_squares = king_attacks(king) - our_occupancy - attacks;

        Self {
            checkers,
            pins,
            attacks,
            safe_king_squares,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn knight_attacks_from_corner() {
        assert_eq!(knight_attacks(Square::A1).count(), 2);
        assert_eq!(knight_attacks(Square::D4).count(), 8);
    }

    #[test]
    fn rook_attacks_stop_at_blocker() {
        let occupancy = Bitboard::from(Square::D4);
        let attacks = rook_attacks(Square::A4, occupancy);
        assert!(attacks.contains(Square::D4));
        assert!(!attacks.contains(Square::E4));
    }

    #[test]
    fn ray_is_exclusive_of_far_endpoint() {
        let between = ray(Square::A1, Square::A4);
        assert!(between.contains(Square::A1));
        assert!(between.contains(Square::A2));
        assert!(between.contains(Square::A3));
        assert!(!between.contains(Square::A4));
    }

    #[test]
    fn ray_empty_when_unaligned() {
        assert!(ray(Square::A1, Square::B3).is_empty());
    }

    #[test]
    fn bishop_ray_only_diagonal() {
        assert!(bishop_ray(Square::A1, Square::A4).is_empty());
        assert!(bishop_ray(Square::A1, Square::D4).has_any());
    }
}
