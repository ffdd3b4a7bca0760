//! Zobrist keys generated at build time; see `build.rs`. Every build gets its
//! own set of keys, so hashes are stable within a process but must never be
//! persisted across builds.

use crate::chess::core::{Piece, PieceKind, Player, Square};
use crate::chess::zobrist::Key;

macro_rules! piece_keys {
    ($name:ident, $file:literal) => {
        const $name: [Key; 64] = include!(concat!(env!("OUT_DIR"), "/", $file));
    };
}

piece_keys!(WHITE_KING_KEYS, "white_king_zobrist_keys");
piece_keys!(WHITE_QUEEN_KEYS, "white_queen_zobrist_keys");
piece_keys!(WHITE_ROOK_KEYS, "white_rook_zobrist_keys");
piece_keys!(WHITE_BISHOP_KEYS, "white_bishop_zobrist_keys");
piece_keys!(WHITE_KNIGHT_KEYS, "white_knight_zobrist_keys");
piece_keys!(WHITE_PAWN_KEYS, "white_pawn_zobrist_keys");
piece_keys!(BLACK_KING_KEYS, "black_king_zobrist_keys");
piece_keys!(BLACK_QUEEN_KEYS, "black_queen_zobrist_keys");
piece_keys!(BLACK_ROOK_KEYS, "black_rook_zobrist_keys");
piece_keys!(BLACK_BISHOP_KEYS, "black_bishop_zobrist_keys");
piece_keys!(BLACK_KNIGHT_KEYS, "black_knight_zobrist_keys");
piece_keys!(BLACK_PAWN_KEYS, "black_pawn_zobrist_keys");

pub(super) fn get_piece_key(piece: Piece, square: Square) -> Key {
    let table: &[Key; 64] = match (piece.player, piece.kind) {
        (Player::White, PieceKind::King) => &WHITE_KING_KEYS,
        (Player::White, PieceKind::Queen) => &WHITE_QUEEN_KEYS,
        (Player::White, PieceKind::Rook) => &WHITE_ROOK_KEYS,
        (Player::White, PieceKind::Bishop) => &WHITE_BISHOP_KEYS,
        (Player::White, PieceKind::Knight) => &WHITE_KNIGHT_KEYS,
        (Player::White, PieceKind::Pawn) => &WHITE_PAWN_KEYS,
        (Player::Black, PieceKind::King) => &BLACK_KING_KEYS,
        (Player::Black, PieceKind::Queen) => &BLACK_QUEEN_KEYS,
        (Player::Black, PieceKind::Rook) => &BLACK_ROOK_KEYS,
        (Player::Black, PieceKind::Bishop) => &BLACK_BISHOP_KEYS,
        (Player::Black, PieceKind::Knight) => &BLACK_KNIGHT_KEYS,
        (Player::Black, PieceKind::Pawn) => &BLACK_PAWN_KEYS,
    };
    table[square as usize]
}

// NOTE: the following keys are randomly generated in build.rs and are not
// stable even between different builds of the same version.
pub(super) const EN_PASSANT_FILES: [Key; 8] =
    include!(concat!(env!("OUT_DIR"), "/en_passant_zobrist_keys"));

const CASTLING_KEYS: [Key; 4] = include!(concat!(env!("OUT_DIR"), "/castling_zobrist_keys"));
pub(super) const WHITE_CAN_CASTLE_SHORT: Key = CASTLING_KEYS[0];
pub(super) const WHITE_CAN_CASTLE_LONG: Key = CASTLING_KEYS[1];
pub(super) const BLACK_CAN_CASTLE_SHORT: Key = CASTLING_KEYS[2];
pub(super) const BLACK_CAN_CASTLE_LONG: Key = CASTLING_KEYS[3];

pub(super) const BLACK_TO_MOVE: Key = include!(concat!(env!("OUT_DIR"), "/side_to_move_zobrist_key"));
