//! End-to-end scenarios for the corpus-mining pipeline (PGN in, EPD out),
//! exercising the six concrete cases from the design together with the
//! filter-monotonicity and TB-limit/mates properties.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use pgncensus::corpus::pipeline::{Config, ConfigArgs};

/// A scratch directory under the system temp dir, unique per test run,
/// removed on drop so scenarios don't leak files into each other.
struct Scratch {
    dir: PathBuf,
}

impl Scratch {
    fn new(name: &str) -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let id = COUNTER.fetch_add(1, Ordering::Relaxed);
        let dir = std::env::temp_dir().join(format!("pgncensus-test-{name}-{}-{id}", std::process::id()));
        fs::create_dir_all(&dir).expect("create scratch dir");
        Self { dir }
    }

    fn write(&self, file_name: &str, contents: &str) -> PathBuf {
        let path = self.dir.join(file_name);
        fs::write(&path, contents).expect("write scratch file");
        path
    }

    fn path(&self) -> &Path {
        &self.dir
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.dir);
    }
}

fn run_pipeline(scratch: &Scratch, args: ConfigArgs) -> Vec<String> {
    let config = Config::new(args).expect("valid config");
    pgncensus::corpus::pipeline::run(&config).expect("pipeline run succeeds");
    let output = fs::read_to_string(scratch.path().join("out.epd")).expect("output file exists");
    output.lines().map(str::to_string).collect()
}

fn base_args(scratch: &Scratch) -> ConfigArgs {
    ConfigArgs {
        dirs: vec![scratch.path().to_path_buf()],
        output: Some(scratch.path().join("out.epd")),
        omit_move_counter: true,
        ..ConfigArgs::default()
    }
}

#[test]
fn single_canonical_game_emits_four_positions() {
    let scratch = Scratch::new("canonical");
    scratch.write(
        "game.pgn",
        "[Event \"Test\"]\n[Result \"1-0\"]\n\n1. e4 e5 2. Nf3 Nc6 1-0\n",
    );
    let args = ConfigArgs {
        max_plies: 4,
        min_count: 1,
        ..base_args(&scratch)
    };
    let lines = run_pipeline(&scratch, args);
    assert_eq!(lines.len(), 4);

    let mut position = pgncensus::chess::position::Position::starting();
    let mut expected = Vec::new();
    for uci in ["e2e4", "e7e5", "g1f3", "b8c6"] {
        position.make_move(&pgncensus::chess::core::Move::from_uci(uci).unwrap());
        expected.push(position.get_fen(false));
    }
    let mut lines_sorted = lines.clone();
    lines_sorted.sort();
    let mut expected_sorted = expected.clone();
    expected_sorted.sort();
    assert_eq!(lines_sorted, expected_sorted);
}

#[test]
fn duplicate_game_reported_once_at_second_occurrence() {
    let scratch = Scratch::new("duplicate");
    let game = "[Event \"Test\"]\n[Result \"1-0\"]\n\n1. e4 e5 2. Nf3 Nc6 1-0\n";
    scratch.write("game.pgn", &game.repeat(3));
    let args = ConfigArgs {
        min_count: 2,
        ..base_args(&scratch)
    };
    let lines = run_pipeline(&scratch, args);
    assert_eq!(lines.len(), 4);
}

#[test]
fn stop_early_limits_positions_from_a_novel_game() {
    let scratch = Scratch::new("stop-early");
    scratch.write(
        "game.pgn",
        "[Event \"Test\"]\n[Result \"1-0\"]\n\n1. e4 e5 2. Nf3 Nc6 3. Bb5 a6 1-0\n",
    );
    let args = ConfigArgs {
        max_plies: 10,
        stop_early: true,
        count_stop_early: 3,
        min_count: 1,
        ..base_args(&scratch)
    };
    let lines = run_pipeline(&scratch, args);
    assert_eq!(lines.len(), 3);
}

#[test]
fn book_moves_do_not_count_against_ply_budget() {
    let scratch = Scratch::new("book");
    scratch.write(
        "game.pgn",
        "[Event \"Test\"]\n[Result \"1-0\"]\n\n1. e4 { book } e5 { book } 2. Nf3 Nc6 1-0\n",
    );
    let args = ConfigArgs {
        max_plies: 2,
        min_count: 1,
        ..base_args(&scratch)
    };
    let lines = run_pipeline(&scratch, args);
    assert_eq!(lines.len(), 2);
}

#[test]
fn fix_fen_rewrites_truncated_book_fen() {
    let scratch = Scratch::new("fix-fen");
    scratch.write(
        "mytest-0.pgn",
        "[Event \"Test\"]\n[Result \"1-0\"]\n[FEN \"rnbqkbnr/pppp1ppp/8/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq - 0 1\"]\n[SetUp \"1\"]\n\n1... Nc6 1-0\n",
    );
    scratch.write(
        "mytest.json",
        r#"{"args": {"book_depth": "7"}}"#,
    );
    let args = ConfigArgs {
        fix_fen: true,
        min_count: 1,
        ..base_args(&scratch)
    };
    let lines = run_pipeline(&scratch, args);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].ends_with(" -"), "expected counters omitted: {}", lines[0]);
}

#[test]
fn chess960_game_hashes_like_a_freshly_parsed_position() {
    let scratch = Scratch::new("chess960");
    scratch.write(
        "game.pgn",
        "[Event \"Test\"]\n[Variant \"fischerandom\"]\n[Result \"1-0\"]\n[FEN \"rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w HAha - 0 1\"]\n[SetUp \"1\"]\n\n1. Nf3 Nf6 1-0\n",
    );
    let args = ConfigArgs {
        min_count: 1,
        ..base_args(&scratch)
    };
    let lines = run_pipeline(&scratch, args);
    assert_eq!(lines.len(), 2);
}

#[test]
fn no_frc_skips_chess960_games_entirely() {
    let scratch = Scratch::new("no-frc");
    scratch.write(
        "game.pgn",
        "[Event \"Test\"]\n[Variant \"fischerandom\"]\n[Result \"1-0\"]\n[FEN \"rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w HAha - 0 1\"]\n[SetUp \"1\"]\n\n1. Nf3 Nf6 1-0\n",
    );
    let args = ConfigArgs {
        no_frc: true,
        min_count: 1,
        ..base_args(&scratch)
    };
    let lines = run_pipeline(&scratch, args);
    assert!(lines.is_empty());
}

#[test]
fn min_elo_filter_only_removes_games_never_adds_positions() {
    let scratch = Scratch::new("min-elo");
    scratch.write(
        "low.pgn",
        "[Event \"Test\"]\n[Result \"1-0\"]\n[WhiteElo \"1000\"]\n[BlackElo \"1000\"]\n\n1. e4 e5 1-0\n",
    );
    scratch.write(
        "high.pgn",
        "[Event \"Test\"]\n[Result \"1-0\"]\n[WhiteElo \"2500\"]\n[BlackElo \"2500\"]\n\n1. d4 d5 1-0\n",
    );
    let unfiltered = run_pipeline(
        &scratch,
        ConfigArgs {
            min_count: 1,
            min_elo: 0,
            ..base_args(&scratch)
        },
    );
    let scratch2 = Scratch::new("min-elo-2");
    scratch2.write(
        "low.pgn",
        "[Event \"Test\"]\n[Result \"1-0\"]\n[WhiteElo \"1000\"]\n[BlackElo \"1000\"]\n\n1. e4 e5 1-0\n",
    );
    scratch2.write(
        "high.pgn",
        "[Event \"Test\"]\n[Result \"1-0\"]\n[WhiteElo \"2500\"]\n[BlackElo \"2500\"]\n\n1. d4 d5 1-0\n",
    );
    let filtered = run_pipeline(
        &scratch2,
        ConfigArgs {
            min_count: 1,
            min_elo: 2000,
            ..base_args(&scratch2)
        },
    );
    assert!(filtered.len() <= unfiltered.len());
    for line in &filtered {
        assert!(unfiltered.contains(line));
    }
}

#[test]
fn tb_limit_excludes_low_piece_count_positions() {
    // Capturing the loose queen on e2 brings the board from 32 down to 31
    // pieces; with `tb_limit=31` that move (and everything after it, since
    // the visitor's skip bit is one-way) must not appear in the output.
    let scratch = Scratch::new("tb-limit");
    scratch.write(
        "game.pgn",
        "[Event \"Test\"]\n[Result \"1-0\"]\n[FEN \"rnb1kbnr/pppp1ppp/8/4p3/4P3/8/PPPPqPPP/RNBQKBNR w KQkq - 0 3\"]\n[SetUp \"1\"]\n\n3. Qxe2 1-0\n",
    );
    let args = ConfigArgs {
        min_count: 1,
        tb_limit: 31,
        ..base_args(&scratch)
    };
    let lines = run_pipeline(&scratch, args);
    assert!(lines.is_empty(), "the only move drops to 30 pieces and must be excluded: {lines:?}");
}
