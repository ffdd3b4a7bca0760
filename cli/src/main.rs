//! Command-line front-end for the position-mining pipeline.
//!
//! This binary owns flag parsing and the `--help` banner only: it turns
//! parsed arguments into a [`pgncensus::corpus::pipeline::Config`] and hands
//! off to [`pgncensus::corpus::pipeline::run`]. All of the interesting work
//! (C1-C7 in the design) lives in the `pgncensus` library crate.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use pgncensus::corpus::pipeline::{Config, ConfigArgs};

/// Mines a corpus of PGN game records for frequently-occurring positions.
///
/// Reads every `.pgn`/`.pgn.gz`/`.pgn.zst` file named by `--file` or found
/// under `--dir`, replays each game through a small chess engine, and counts
/// how often each position is reached. Positions whose count crosses
/// `--minCount` are written to the output file as FEN-like text.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// A single PGN file to process. May be repeated.
    #[arg(long = "file")]
    file: Vec<PathBuf>,

    /// A directory of PGN files to process. May be repeated.
    #[arg(long = "dir")]
    dir: Vec<PathBuf>,

    /// Recurse into subdirectories of `--dir`.
    #[arg(short = 'r')]
    recursive: bool,

    /// Exclude games whose `Variant` tag is `fischerandom`.
    #[arg(long = "noFRC")]
    no_frc: bool,

    /// Permit the same test id to appear under more than one directory.
    #[arg(long = "allowDuplicates")]
    allow_duplicates: bool,

    /// Number of worker threads. Defaults to the available parallelism.
    #[arg(long = "concurrency")]
    concurrency: Option<usize>,

    /// Only count moves made by the side whose player name matches this
    /// regex (applied independently to `White`/`Black`; if both or neither
    /// name matches, no filtering is applied for that game).
    #[arg(long = "matchEngine")]
    match_engine: Option<String>,

    /// Only process files whose test metadata has a `book` value matching
    /// this regex.
    #[arg(long = "matchBook")]
    match_book: Option<String>,

    /// Invert `--matchBook`'s match sense.
    #[arg(long = "matchBookInvert")]
    match_book_invert: bool,

    /// Only process files whose test metadata has a truthy `sprt` field.
    #[arg(long = "SPRTonly")]
    sprt_only: bool,

    /// Rewrite a `FEN` tag's truncated ` 0 1` suffix to the test's
    /// `book_depth + 1`, working around tools that strip move counters from
    /// opening-book FENs.
    #[arg(long = "fixFEN")]
    fix_fen: bool,

    /// Maximum number of plies counted per game (0 = unbounded).
    #[arg(long = "maxPlies", default_value_t = 0)]
    max_plies: u32,

    /// Stop processing a game early once `--countStopEarly` new positions
    /// have been seen.
    #[arg(long = "stopEarly")]
    stop_early: bool,

    /// Active only with `--stopEarly`; otherwise treated as unbounded.
    #[arg(long = "countStopEarly", default_value_t = 0)]
    count_stop_early: u32,

    /// Minimum occurrence count for a position to be reported (0 = never
    /// emit; useful for timing runs).
    #[arg(long = "minCount", default_value_t = 1)]
    min_count: u32,

    /// Defer output until the run completes, emitting final counts instead
    /// of streaming positions as they cross `--minCount`. Requires
    /// `--omitMoveCounter`.
    #[arg(long = "saveCount")]
    save_count: bool,

    /// Omit the halfmove clock and fullmove counter from emitted FENs.
    #[arg(long = "omitMoveCounter")]
    omit_move_counter: bool,

    /// Skip games once the position reaches at most this many pieces
    /// (0 or 1 disables the filter).
    #[arg(long = "TBlimit", default_value_t = 0)]
    tb_limit: u32,

    /// Skip games once a position with no legal moves is reached.
    #[arg(long = "omitMates")]
    omit_mates: bool,

    /// Skip games where either player's Elo is below this value.
    #[arg(long = "minElo", default_value_t = 0)]
    min_elo: u32,

    /// Shorthand for `--TBlimit 7 --omitMates`.
    #[arg(long = "cdb")]
    cdb: bool,

    /// Output file path.
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,
}

impl From<Args> for ConfigArgs {
    fn from(args: Args) -> Self {
        let (tb_limit, omit_mates) = if args.cdb {
            (7, true)
        } else {
            (args.tb_limit, args.omit_mates)
        };
        Self {
            files: args.file,
            dirs: args.dir,
            recursive: args.recursive,
            no_frc: args.no_frc,
            allow_duplicates: args.allow_duplicates,
            concurrency: args.concurrency,
            match_engine: args.match_engine,
            match_book: args.match_book,
            match_book_invert: args.match_book_invert,
            sprt_only: args.sprt_only,
            fix_fen: args.fix_fen,
            max_plies: args.max_plies,
            stop_early: args.stop_early,
            count_stop_early: args.count_stop_early,
            min_count: args.min_count,
            save_count: args.save_count,
            omit_move_counter: args.omit_move_counter,
            tb_limit,
            omit_mates,
            min_elo: args.min_elo,
            output: args.output,
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    let config = match Config::new(args.into()) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("error: {error}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(error) = pgncensus::corpus::pipeline::run(&config) {
        eprintln!("error: {error:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
