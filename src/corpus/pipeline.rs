//! Configuration (`Config`), the process-global state every worker shares
//! (`Shared`), and the worker pool & planner (C6) that drives them.

use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use regex::Regex;
use walkdir::WalkDir;

use crate::chess::position::Position;
use crate::corpus::metadata::{self, CorpusError, Metadata};
use crate::corpus::table::{CanonicalTable, CountTable};
use crate::corpus::visitor::GameVisitor;
use crate::pgn;

/// Configuration errors (kind 1 in the error model): reported and mapped to
/// exit code 1 by the `cli` binary before any work starts.
#[derive(Debug)]
pub enum ConfigError {
    /// `--saveCount` was given without `--omitMoveCounter`.
    SaveCountRequiresOmitMoveCounter,
    /// Neither `--file` nor `--dir` named anything to read.
    NoInputTarget,
    /// `--concurrency 0` was requested.
    ZeroConcurrency,
    /// A `--file` path does not exist.
    MissingFile { path: PathBuf },
    /// `--matchEngine` or `--matchBook` failed to compile.
    InvalidRegex { flag: &'static str, source: regex::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SaveCountRequiresOmitMoveCounter => {
                write!(f, "--saveCount requires --omitMoveCounter")
            }
            Self::NoInputTarget => write!(f, "no input given: pass --file or --dir"),
            Self::ZeroConcurrency => write!(f, "--concurrency must be at least 1"),
            Self::MissingFile { path } => write!(f, "--file target {} does not exist", path.display()),
            Self::InvalidRegex { flag, source } => write!(f, "invalid {flag} pattern: {source}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidRegex { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Plain, `clap`-independent data carrying one field per CLI flag (§6). The
/// `cli` binary builds one of these from its parsed arguments and hands it
/// to [`Config::new`] for validation.
#[derive(Debug, Default)]
pub struct ConfigArgs {
    pub files: Vec<PathBuf>,
    pub dirs: Vec<PathBuf>,
    pub recursive: bool,
    pub no_frc: bool,
    pub allow_duplicates: bool,
    pub concurrency: Option<usize>,
    pub match_engine: Option<String>,
    pub match_book: Option<String>,
    pub match_book_invert: bool,
    pub sprt_only: bool,
    pub fix_fen: bool,
    pub max_plies: u32,
    pub stop_early: bool,
    pub count_stop_early: u32,
    pub min_count: u32,
    pub save_count: bool,
    pub omit_move_counter: bool,
    pub tb_limit: u32,
    pub omit_mates: bool,
    pub min_elo: u32,
    pub output: Option<PathBuf>,
}

/// The parsed, validated representation of every CLI flag. Built once at
/// startup and shared (read-only) by every worker.
#[derive(Debug)]
pub struct Config {
    pub(crate) files: Vec<PathBuf>,
    pub(crate) dirs: Vec<PathBuf>,
    pub(crate) recursive: bool,
    pub(crate) no_frc: bool,
    pub(crate) allow_duplicates: bool,
    pub(crate) concurrency: usize,
    pub(crate) match_engine: Option<Regex>,
    pub(crate) match_book: Option<Regex>,
    pub(crate) match_book_invert: bool,
    pub(crate) sprt_only: bool,
    pub(crate) fix_fen: bool,
    pub(crate) max_plies: u32,
    pub(crate) stop_early: bool,
    pub(crate) count_stop_early: u32,
    pub(crate) min_count: u32,
    pub(crate) save_count: bool,
    pub(crate) omit_move_counter: bool,
    pub(crate) tb_limit: u32,
    pub(crate) omit_mates: bool,
    pub(crate) min_elo: u32,
    pub(crate) output: PathBuf,
}

const DEFAULT_OUTPUT: &str = "popular.epd";

impl Config {
    /// Validates `args`, compiling its regex flags and resolving
    /// `--countStopEarly`'s "only active with `--stopEarly`" rule.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] on an invalid flag combination, an
    /// unreadable `--file` target, or a malformed regex.
    pub fn new(args: ConfigArgs) -> Result<Self, ConfigError> {
        if args.save_count && !args.omit_move_counter {
            return Err(ConfigError::SaveCountRequiresOmitMoveCounter);
        }
        if args.files.is_empty() && args.dirs.is_empty() {
            return Err(ConfigError::NoInputTarget);
        }
        for file in &args.files {
            if !file.is_file() {
                return Err(ConfigError::MissingFile { path: file.clone() });
            }
        }
        let concurrency = args.concurrency.unwrap_or_else(|| std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get));
        if concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        let match_engine = args
            .match_engine
            .map(|pattern| Regex::new(&pattern).map_err(|source| ConfigError::InvalidRegex { flag: "--matchEngine", source }))
            .transpose()?;
        let match_book = args
            .match_book
            .map(|pattern| Regex::new(&pattern).map_err(|source| ConfigError::InvalidRegex { flag: "--matchBook", source }))
            .transpose()?;
        // `--countStopEarly` is only meaningful with `--stopEarly`; treated
        // as +infinity otherwise (u32::MAX is close enough: no real game has
        // that many distinct positions).
        let count_stop_early = if args.stop_early { args.count_stop_early } else { u32::MAX };

        Ok(Self {
            files: args.files,
            dirs: args.dirs,
            recursive: args.recursive,
            no_frc: args.no_frc,
            allow_duplicates: args.allow_duplicates,
            concurrency,
            match_engine,
            match_book,
            match_book_invert: args.match_book_invert,
            sprt_only: args.sprt_only,
            fix_fen: args.fix_fen,
            max_plies: if args.max_plies == 0 { u32::MAX } else { args.max_plies },
            stop_early: args.stop_early,
            count_stop_early,
            min_count: args.min_count,
            save_count: args.save_count,
            omit_move_counter: args.omit_move_counter,
            tb_limit: args.tb_limit,
            omit_mates: args.omit_mates,
            min_elo: args.min_elo,
            output: args.output.unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT)),
        })
    }
}

/// State shared (read-only except for its internal synchronization) by
/// every worker: the two tables (C3/C4), the output stream, and the run's
/// totals.
pub struct Shared {
    pub(crate) counts: CountTable,
    pub(crate) canonical: CanonicalTable,
    pub(crate) writer: Mutex<Box<dyn Write + Send>>,
    pub(crate) progress: Mutex<()>,
    pub(crate) total_files: AtomicU64,
    pub(crate) total_games: AtomicU64,
    pub(crate) total_positions: AtomicU64,
}

impl Shared {
    fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            counts: CountTable::new(),
            canonical: CanonicalTable::new(),
            writer: Mutex::new(writer),
            progress: Mutex::new(()),
            total_files: AtomicU64::new(0),
            total_games: AtomicU64::new(0),
            total_positions: AtomicU64::new(0),
        }
    }
}

/// Recognized input extensions, in the order their decompressor is tried.
const PGN_EXTENSIONS: [&str; 3] = [".pgn", ".pgn.gz", ".pgn.zst"];

fn has_pgn_extension(path: &Path) -> bool {
    let name = path.to_string_lossy();
    PGN_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
}

/// Collects the file list from `--file`/`--dir`, sorts it, and rejects
/// adjacent pairs where one path is a prefix of the next (the plain/gzip
/// sibling-file hazard).
fn collect_files(config: &Config) -> Result<Vec<PathBuf>, CorpusError> {
    let mut files: Vec<PathBuf> = config.files.clone();
    for dir in &config.dirs {
        let walker = if config.recursive {
            WalkDir::new(dir)
        } else {
            WalkDir::new(dir).max_depth(1)
        };
        for entry in walker.into_iter().filter_map(std::result::Result::ok) {
            if entry.file_type().is_file() && has_pgn_extension(entry.path()) {
                files.push(entry.into_path());
            }
        }
    }
    files.sort();

    for window in files.windows(2) {
        let [first, second] = window else { unreachable!() };
        if second.to_string_lossy().starts_with(first.to_string_lossy().as_ref()) {
            return Err(CorpusError::DuplicateFileForm {
                first: first.clone(),
                second: second.clone(),
            });
        }
    }
    Ok(files)
}

fn open_reader(path: &Path) -> io::Result<Box<dyn Read + Send>> {
    let file = File::open(path)?;
    let name = path.to_string_lossy();
    if name.ends_with(".pgn.gz") {
        Ok(Box::new(flate2::read::GzDecoder::new(file)))
    } else if name.ends_with(".pgn.zst") {
        Ok(Box::new(zstd::stream::read::Decoder::new(file)?))
    } else {
        Ok(Box::new(file))
    }
}

fn process_file(path: &Path, config: &Config, shared: &Shared, metadata: &Metadata) {
    let reader = match open_reader(path) {
        Ok(reader) => reader,
        Err(error) => {
            eprintln!("{}: {error}", path.display());
            return;
        }
    };
    let book_depth = metadata.lookup(path).and_then(|meta| meta.book_depth);
    let mut visitor = GameVisitor::new(config, shared, path, book_depth);
    if let Err(error) = pgn::read_games(reader, &mut visitor) {
        eprintln!("{}: {error}", path.display());
    }
}

fn process_chunk(chunk: &[PathBuf], config: &Config, shared: &Shared, metadata: &Metadata, total: u64) {
    for path in chunk {
        process_file(path, config, shared, metadata);
        let done = shared.total_files.fetch_add(1, Ordering::Relaxed) + 1;
        let _progress_guard = shared.progress.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        eprintln!("[{done}/{total}] {}", path.display());
    }
}

/// Splits `files` into `ceil(4 * concurrency)` roughly-equal contiguous
/// chunks, so that a pool of `concurrency` workers stays busy even once a
/// few chunks finish early.
fn chunk_files(files: &[PathBuf], concurrency: usize) -> Vec<&[PathBuf]> {
    if files.is_empty() {
        return Vec::new();
    }
    let chunk_count = (4 * concurrency).min(files.len()).max(1);
    let chunk_size = files.len().div_ceil(chunk_count);
    files.chunks(chunk_size).collect()
}

fn open_output(config: &Config) -> io::Result<Box<dyn Write + Send>> {
    let file = File::create(&config.output)?;
    Ok(Box::new(BufWriter::new(file)))
}

/// Runs the pipeline end to end: collects and filters the file list,
/// processes every file across a `concurrency`-sized worker pool, and (in
/// `--saveCount` mode) writes the deferred canonical-form output.
///
/// # Errors
///
/// Returns an error on a corpus-integrity failure (duplicate test, missing
/// `book_depth` under `--fixFEN`, duplicate plain/compressed file pair) or
/// an I/O failure opening the output file.
pub fn run(config: &Config) -> anyhow::Result<()> {
    let mut files = collect_files(config)?;
    let meta = Metadata::get_metadata(&files, config.allow_duplicates)?;
    if config.fix_fen {
        meta.check_fix_fen(&files)?;
    }
    if config.sprt_only {
        files = metadata::filter_files_sprt(files, &meta);
    }
    if let Some(regex) = &config.match_book {
        files = metadata::filter_files_book(files, &meta, regex, config.match_book_invert);
    }

    let shared = Shared::new(open_output(config)?);
    let total = files.len() as u64;
    let chunks = chunk_files(&files, config.concurrency);

    let pool = rayon::ThreadPoolBuilder::new().num_threads(config.concurrency).build()?;
    pool.scope(|scope| {
        for chunk in &chunks {
            let config = &*config;
            let shared = &shared;
            let meta = &meta;
            scope.spawn(move |_| process_chunk(chunk, config, shared, meta, total));
        }
    });

    if config.save_count {
        let mut writer = shared.writer.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        for (key, encoding) in shared.canonical.entries() {
            let count = shared.counts.get(key).unwrap_or_default();
            let fen = Position::decode(&encoding).get_fen(false);
            writeln!(writer, "{fen} ; c0 {count}")?;
        }
    }

    eprintln!(
        "{} files, {} games, {} positions reported",
        shared.total_files.load(Ordering::Relaxed),
        shared.total_games.load(Ordering::Relaxed),
        shared.total_positions.load(Ordering::Relaxed)
    );
    Ok(())
}

#[cfg(test)]
impl Config {
    /// A permissive `Config` for unit tests that exercise [`GameVisitor`]
    /// directly, bypassing `--file`/`--dir` validation.
    pub(crate) fn default_for_tests() -> Self {
        Self {
            files: Vec::new(),
            dirs: Vec::new(),
            recursive: false,
            no_frc: false,
            allow_duplicates: false,
            concurrency: 1,
            match_engine: None,
            match_book: None,
            match_book_invert: false,
            sprt_only: false,
            fix_fen: false,
            max_plies: u32::MAX,
            stop_early: false,
            count_stop_early: u32::MAX,
            min_count: 1,
            save_count: false,
            omit_move_counter: true,
            tb_limit: 0,
            omit_mates: false,
            min_elo: 0,
            output: PathBuf::from(DEFAULT_OUTPUT),
        }
    }
}
