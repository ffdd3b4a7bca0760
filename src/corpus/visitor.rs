//! The per-game traversal policy (C5): one [`GameVisitor`] per file, reused
//! across every game in that file via [`pgn::Visitor::end_pgn`] resetting
//! its board and bookkeeping between games.

use std::io::Write as _;
use std::path::Path;

use crate::chess::core::Player;
use crate::chess::position::Position;
use crate::corpus::pipeline::{Config, Shared};
use crate::pgn;

/// `Visitor` state for the game currently in progress (§3's "Visitor
/// state"), plus the handles (config, shared tables, current file path,
/// this test's `book_depth`) that do not change across games in a file.
pub struct GameVisitor<'a> {
    config: &'a Config,
    shared: &'a Shared,
    file_path: &'a Path,
    book_depth: Option<i64>,

    position: Position,
    has_result: bool,
    filter_side: Option<Player>,
    white_elo: Option<i64>,
    black_elo: Option<i64>,
    white_name: String,
    black_name: String,
    retained_plies: u32,
    new_entry_count: u32,
    skip: bool,
}

impl<'a> GameVisitor<'a> {
    #[must_use]
    pub fn new(config: &'a Config, shared: &'a Shared, file_path: &'a Path, book_depth: Option<i64>) -> Self {
        Self {
            config,
            shared,
            file_path,
            book_depth,
            position: Position::starting(),
            has_result: false,
            filter_side: None,
            white_elo: None,
            black_elo: None,
            white_name: String::new(),
            black_name: String::new(),
            retained_plies: 0,
            new_entry_count: 0,
            skip: false,
        }
    }

    fn log_error(&self, message: &str) {
        eprintln!("{}: {message}", self.file_path.display());
    }

    fn skip_game(&mut self, reason: &str) {
        self.log_error(reason);
        self.skip = true;
    }

    fn rewrite_fen_if_needed(&self, value: &str) -> String {
        const TRUNCATED_SUFFIX: &str = " 0 1";
        if self.config.fix_fen && value.ends_with(TRUNCATED_SUFFIX) {
            let depth = self.book_depth.unwrap_or(0) + 1;
            let prefix = &value[..value.len() - TRUNCATED_SUFFIX.len()];
            format!("{prefix} 0 {depth}")
        } else {
            value.to_string()
        }
    }
}

/// `"1-0"`, `"0-1"` and `"1/2-1/2"` are the results the visitor treats as
/// "the game has a result"; `"*"` (ongoing/unknown) is not recognized.
fn is_recognized_result(value: &str) -> bool {
    matches!(value, "1-0" | "0-1" | "1/2-1/2")
}

impl pgn::Visitor for GameVisitor<'_> {
    fn header(&mut self, key: &str, value: &str) {
        if self.skip {
            return;
        }
        match key {
            "FEN" => {
                let fen = self.rewrite_fen_if_needed(value);
                if let Err(error) = self.position.set_fen(&fen) {
                    self.skip_game(&format!("malformed FEN tag '{value}': {error:#}"));
                }
            }
            "Variant" => {
                if value.eq_ignore_ascii_case("fischerandom") {
                    self.position.set_chess960(true);
                }
            }
            "Result" => {
                if is_recognized_result(value) {
                    self.has_result = true;
                }
            }
            "White" => value.clone_into(&mut self.white_name),
            "Black" => value.clone_into(&mut self.black_name),
            "WhiteElo" => self.white_elo = value.trim().parse().ok(),
            "BlackElo" => self.black_elo = value.trim().parse().ok(),
            _ => {}
        }
    }

    fn start_moves(&mut self) {
        if self.skip {
            return;
        }
        let elo_too_low = |elo: Option<i64>| elo.is_some_and(|elo| elo < i64::from(self.config.min_elo));
        if !self.has_result || elo_too_low(self.white_elo) || elo_too_low(self.black_elo) {
            self.skip = true;
            return;
        }

        if let Some(regex) = &self.config.match_engine {
            let matches = |name: &str| !name.is_empty() && regex.is_match(name);
            self.filter_side = match (matches(&self.white_name), matches(&self.black_name)) {
                (true, false) => Some(Player::White),
                (false, true) => Some(Player::Black),
                (true, true) | (false, false) => None,
            };
        }

        if self.config.no_frc && self.position.is_chess960() {
            self.skip = true;
            return;
        }

        self.shared.total_games.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
    }

    fn san_move(&mut self, text: &str, comment: Option<&str>) {
        if self.skip {
            return;
        }

        // 1. Ply budget.
        if self.retained_plies == self.config.max_plies {
            self.skip = true;
            return;
        }

        // 2. Resolve and apply the move.
        let Some(resolved) = self.position.parse_san(text) else {
            self.skip_game(&format!("no legal move matches SAN '{text}'"));
            return;
        };
        // 3.
        self.position.make_move(&resolved);

        // 4. Tablebase cutoff.
        if self.config.tb_limit > 1 && self.position.piece_count() <= self.config.tb_limit {
            self.skip = true;
            return;
        }

        // 5. Mate exclusion.
        if self.config.omit_mates && !self.position.legal_moves_nonempty() {
            self.skip = true;
            return;
        }

        // 6. Engine-side filter: does not count against the ply budget.
        if let Some(filter_side) = self.filter_side {
            if self.position.side_to_move() != filter_side {
                return;
            }
        }

        // 7. Book moves never contribute, and don't count against the ply budget.
        if comment == Some("book") {
            return;
        }

        // 8.
        let key = self.position.hash();
        let (is_new, value_after) = self.shared.counts.increment_or_insert(key);

        // 9. Strict equality: a position is reported at most once.
        if value_after == u64::from(self.config.min_count) {
            self.shared.total_positions.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            if self.config.save_count {
                self.shared.canonical.try_insert(key, self.position.encode());
            } else {
                let line = self.position.get_fen(!self.config.omit_move_counter);
                let mut writer = self.shared.writer.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
                if writeln!(writer, "{line}").is_err() {
                    drop(writer);
                    self.skip_game("failed to write to output stream");
                    return;
                }
            }
        }

        // 10.
        if is_new {
            self.new_entry_count += 1;
            if self.config.stop_early && self.new_entry_count == self.config.count_stop_early {
                self.skip = true;
                return;
            }
        }

        // 11.
        self.retained_plies += 1;
    }

    fn end_pgn(&mut self) {
        self.position.reset();
        self.has_result = false;
        self.filter_side = None;
        self.white_elo = None;
        self.black_elo = None;
        self.white_name.clear();
        self.black_name.clear();
        self.retained_plies = 0;
        self.new_entry_count = 0;
        self.skip = false;
    }

    fn skip_current_game(&self) -> bool {
        self.skip
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::path::PathBuf;
    use std::sync::Mutex;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::corpus::table::{CanonicalTable, CountTable};
    use crate::pgn::Visitor as _;

    fn shared_with_min_count(min_count: u32) -> (Config, Shared) {
        let mut config = Config::default_for_tests();
        config.min_count = min_count;
        let shared = Shared {
            counts: CountTable::new(),
            canonical: CanonicalTable::new(),
            writer: Mutex::new(Box::new(Cursor::new(Vec::new()))),
            total_files: std::sync::atomic::AtomicU64::new(0),
            total_games: std::sync::atomic::AtomicU64::new(0),
            total_positions: std::sync::atomic::AtomicU64::new(0),
        };
        (config, shared)
    }

    fn play_canonical_game(visitor: &mut GameVisitor<'_>) {
        visitor.start_pgn();
        visitor.header("Event", "Test");
        visitor.header("Result", "1-0");
        visitor.start_moves();
        for mv in ["e4", "e5", "Nf3", "Nc6"] {
            visitor.san_move(mv, None);
        }
        visitor.end_pgn();
    }

    #[test]
    fn canonical_game_emits_four_positions_with_max_plies() {
        let (mut config, shared) = shared_with_min_count(1);
        config.max_plies = 4;
        let path = PathBuf::from("game.pgn");
        let mut visitor = GameVisitor::new(&config, &shared, &path, None);
        play_canonical_game(&mut visitor);
        assert_eq!(shared.total_positions.load(std::sync::atomic::Ordering::Relaxed), 4);
    }

    #[test]
    fn duplicate_game_emits_at_second_occurrence() {
        let (config, shared) = shared_with_min_count(2);
        let path = PathBuf::from("game.pgn");
        for _ in 0..3 {
            let mut visitor = GameVisitor::new(&config, &shared, &path, None);
            play_canonical_game(&mut visitor);
        }
        assert_eq!(shared.total_positions.load(std::sync::atomic::Ordering::Relaxed), 4);
    }

    #[test]
    fn book_moves_do_not_consume_ply_budget() {
        let (mut config, shared) = shared_with_min_count(1);
        config.max_plies = 2;
        let path = PathBuf::from("game.pgn");
        let mut visitor = GameVisitor::new(&config, &shared, &path, None);
        visitor.start_pgn();
        visitor.header("Result", "1-0");
        visitor.start_moves();
        visitor.san_move("e4", Some("book"));
        visitor.san_move("e5", Some("book"));
        visitor.san_move("Nf3", None);
        visitor.san_move("Nc6", None);
        visitor.end_pgn();
        assert_eq!(shared.total_positions.load(std::sync::atomic::Ordering::Relaxed), 2);
    }

    #[test]
    fn stop_early_halts_after_count_stop_early_new_positions() {
        let (mut config, shared) = shared_with_min_count(1);
        config.max_plies = 10;
        config.stop_early = true;
        config.count_stop_early = 3;
        let path = PathBuf::from("game.pgn");
        let mut visitor = GameVisitor::new(&config, &shared, &path, None);
        visitor.start_pgn();
        visitor.header("Result", "1-0");
        visitor.start_moves();
        for mv in ["e4", "e5", "Nf3", "Nc6", "Bb5"] {
            visitor.san_move(mv, None);
        }
        visitor.end_pgn();
        assert_eq!(shared.total_positions.load(std::sync::atomic::Ordering::Relaxed), 3);
    }

    #[test]
    fn games_without_a_result_are_skipped() {
        let (config, shared) = shared_with_min_count(1);
        let path = PathBuf::from("game.pgn");
        let mut visitor = GameVisitor::new(&config, &shared, &path, None);
        visitor.start_pgn();
        visitor.start_moves();
        visitor.san_move("e4", None);
        visitor.end_pgn();
        assert_eq!(shared.total_positions.load(std::sync::atomic::Ordering::Relaxed), 0);
    }

    #[test]
    fn no_frc_skips_chess960_games() {
        let (mut config, shared) = shared_with_min_count(1);
        config.no_frc = true;
        let path = PathBuf::from("game.pgn");
        let mut visitor = GameVisitor::new(&config, &shared, &path, None);
        visitor.start_pgn();
        visitor.header("Result", "1-0");
        visitor.header("Variant", "fischerandom");
        visitor.start_moves();
        visitor.san_move("e4", None);
        visitor.end_pgn();
        assert_eq!(shared.total_positions.load(std::sync::atomic::Ordering::Relaxed), 0);
    }

    #[test]
    fn fix_fen_rewrites_truncated_book_depth_suffix() {
        let (mut config, shared) = shared_with_min_count(1);
        config.fix_fen = true;
        let path = PathBuf::from("game.pgn");
        let mut visitor = GameVisitor::new(&config, &shared, &path, Some(7));
        visitor.start_pgn();
        visitor.header(
            "FEN",
            "rnbqkbnr/pppp1ppp/8/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq - 0 1",
        );
        assert!(!visitor.skip);
        assert_eq!(visitor.position.get_fen(true).split(' ').last().unwrap(), "8");
    }
}
