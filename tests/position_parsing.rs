//! Cross-module FEN/Chess960 parsing scenarios, exercising [`Position`]
//! through its public API rather than its in-file unit tests.

use pgncensus::chess::position::Position;
use pretty_assertions::assert_eq;

fn legal(fen: &str) -> Position {
    let mut position = Position::starting();
    position.set_fen(fen).unwrap_or_else(|error| panic!("expected '{fen}' to be legal: {error:#}"));
    position
}

#[test]
fn middlegame_fen_roundtrips() {
    let fen = "r2qkb1r/1pp1pp1p/p1np1np1/1B6/3PP1b1/2N1BN2/PPP2PPP/R2QK2R w KQkq - 0 7";
    assert_eq!(legal(fen).get_fen(true), fen);
}

#[test]
fn en_passant_square_is_preserved() {
    let fen = "rnbqk1nr/p3bppp/1p2p3/2ppP3/3P4/P7/1PP1NPPP/R1BQKBNR w KQkq c6 0 7";
    assert_eq!(legal(fen).get_fen(true), fen);
}

#[test]
fn malformed_fen_is_rejected() {
    let mut position = Position::starting();
    assert!(position.set_fen("not a fen").is_err());
    assert!(position.set_fen("8/8/8/8/8/8/8/8 w - - 0 1").is_err());
}

#[test]
fn chess960_shredder_fen_roundtrips_through_every_right() {
    let mut position = Position::starting();
    position.set_chess960(true);
    let fen = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w HAha - 0 1";
    position.set_fen(fen).unwrap();
    assert_eq!(position.get_fen(true), fen);
}

#[test]
fn hash_is_independent_of_move_counters() {
    let mut with_high_counters = Position::starting();
    with_high_counters
        .set_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 40 99")
        .unwrap();
    assert_eq!(with_high_counters.hash(), Position::starting().hash());
}
