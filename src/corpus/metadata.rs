//! Per-test sidecar metadata (C7): loading `<test>.json` files and the
//! file-list filters that key off them (`--SPRTonly`, `--matchBook`).
//!
//! A "test" is a group of game files that share everything up to a trailing
//! `-<index>` in their base name (e.g. `mytest-0.pgn`, `mytest-1.pgn.gz` are
//! both part of test `mytest`). Its metadata, if any, lives in a JSON file
//! named `<directory>/mytest.json`.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Corpus-integrity errors (kind 2 in the error model): always fatal,
/// reported and mapped to exit code 1 by the `cli` binary.
#[derive(Debug)]
pub enum CorpusError {
    /// The same test id was found under two different directories.
    DuplicateTest {
        test_id: String,
        first: PathBuf,
        second: PathBuf,
    },
    /// A sidecar JSON file exists but could not be parsed.
    MalformedMetadata { path: PathBuf, source: anyhow::Error },
    /// Both `name.pgn` and a compressed sibling like `name.pgn.gz` were
    /// found adjacent in the sorted file list -- almost certainly the same
    /// games present twice.
    DuplicateFileForm { first: PathBuf, second: PathBuf },
    /// `--fixFEN` is active but the test has no `book_depth` to rewrite with.
    MissingBookDepth { file: PathBuf },
    /// The sidecar file could not be read (permissions, I/O error, etc).
    Io { path: PathBuf, source: std::io::Error },
}

impl fmt::Display for CorpusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateTest {
                test_id,
                first,
                second,
            } => write!(
                f,
                "duplicate test id '{test_id}' found under both {} and {} (pass --allowDuplicates to permit this)",
                first.display(),
                second.display()
            ),
            Self::MalformedMetadata { path, source } => {
                write!(f, "malformed metadata in {}: {source:#}", path.display())
            }
            Self::DuplicateFileForm { first, second } => write!(
                f,
                "{} and {} appear to be the same game archive in two forms",
                first.display(),
                second.display()
            ),
            Self::MissingBookDepth { file } => write!(
                f,
                "--fixFEN is active but {} has no book_depth in its test metadata",
                file.display()
            ),
            Self::Io { path, source } => {
                write!(f, "failed to read {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for CorpusError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::MalformedMetadata { source, .. } => Some(source.as_ref()),
            Self::Io { source, .. } => Some(source),
            Self::DuplicateTest { .. } | Self::MissingBookDepth { .. } | Self::DuplicateFileForm { .. } => None,
        }
    }
}

/// The fields of a test's sidecar JSON file that the pipeline cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestMetadata {
    pub book: Option<String>,
    pub sprt: bool,
    pub book_depth: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct SidecarFile {
    #[serde(default)]
    args: SidecarArgs,
}

#[derive(Debug, Default, Deserialize)]
struct SidecarArgs {
    book: Option<String>,
    sprt: Option<serde_json::Value>,
    book_depth: Option<String>,
}

/// Strips a trailing `-<index>` from a file's base name (extension already
/// removed), e.g. `"mytest-12"` -> `"mytest"`. A base name with no `-` is
/// returned unchanged.
fn strip_index_suffix(stem: &str) -> &str {
    match stem.rfind('-') {
        Some(dash) if stem[dash + 1..].chars().all(|c| c.is_ascii_digit()) && dash + 1 < stem.len() => {
            &stem[..dash]
        }
        _ => stem,
    }
}

/// Strips the corpus-recognized PGN extensions (`.pgn`, `.pgn.gz`,
/// `.pgn.zst`) from a file name.
fn strip_pgn_extension(name: &str) -> &str {
    for suffix in [".pgn.gz", ".pgn.zst", ".pgn"] {
        if let Some(stripped) = name.strip_suffix(suffix) {
            return stripped;
        }
    }
    name
}

/// The `<directory>/<test id>` path identifying a test, used both as the
/// metadata map's key and (with `.json` appended) as the sidecar's path.
fn test_path(file: &Path) -> PathBuf {
    let file_name = file.file_name().map_or_else(|| file.to_string_lossy(), |n| n.to_string_lossy());
    let test_id = strip_index_suffix(strip_pgn_extension(&file_name));
    match file.parent() {
        Some(dir) => dir.join(test_id),
        None => PathBuf::from(test_id),
    }
}

fn parse_sidecar(text: &str) -> anyhow::Result<TestMetadata> {
    let sidecar: SidecarFile = serde_json::from_str(text)?;
    let book_depth = sidecar
        .args
        .book_depth
        .as_deref()
        .map(str::trim)
        .map(str::parse::<i64>)
        .transpose()?;
    Ok(TestMetadata {
        book: sidecar.args.book,
        sprt: sidecar.args.sprt.is_some(),
        book_depth,
    })
}

/// The loaded metadata for every test referenced by a file list, keyed by
/// each file's [`test_path`]. Read-only once constructed.
#[derive(Debug, Default)]
pub struct Metadata {
    by_test_path: HashMap<PathBuf, TestMetadata>,
}

impl Metadata {
    /// Loads `<test>.json` once per distinct test referenced by `files`,
    /// rejecting (unless `allow_duplicates`) a test id that appears under
    /// more than one directory.
    ///
    /// # Errors
    ///
    /// Returns [`CorpusError`] on a duplicate test id, an unreadable sidecar
    /// file, or a sidecar file that fails to parse.
    pub fn get_metadata(files: &[PathBuf], allow_duplicates: bool) -> Result<Self, CorpusError> {
        let mut first_seen: HashMap<String, PathBuf> = HashMap::new();
        let mut by_test_path = HashMap::new();

        for file in files {
            let test_path = test_path(file);
            let test_id = test_path
                .file_name()
                .map_or_else(|| test_path.to_string_lossy(), |n| n.to_string_lossy())
                .into_owned();

            if !allow_duplicates {
                match first_seen.get(&test_id) {
                    Some(first) if *first != test_path => {
                        return Err(CorpusError::DuplicateTest {
                            test_id,
                            first: first.clone(),
                            second: test_path,
                        });
                    }
                    _ => {
                        let _ = first_seen.entry(test_id).or_insert_with(|| test_path.clone());
                    }
                }
            }

            if by_test_path.contains_key(&test_path) {
                continue;
            }

            let sidecar_path = test_path.with_extension("json");
            let metadata = if sidecar_path.is_file() {
                let text = fs::read_to_string(&sidecar_path).map_err(|source| CorpusError::Io {
                    path: sidecar_path.clone(),
                    source,
                })?;
                parse_sidecar(&text).map_err(|source| CorpusError::MalformedMetadata {
                    path: sidecar_path.clone(),
                    source,
                })?
            } else {
                TestMetadata::default()
            };
            let _ = by_test_path.insert(test_path, metadata);
        }

        Ok(Self { by_test_path })
    }

    #[must_use]
    pub fn lookup(&self, file: &Path) -> Option<&TestMetadata> {
        self.by_test_path.get(&test_path(file))
    }

    /// Verifies that every file has a `book_depth` to rewrite a truncated
    /// FEN tag with, as `--fixFEN` requires.
    ///
    /// # Errors
    ///
    /// Returns [`CorpusError::MissingBookDepth`] for the first file (in
    /// list order) whose test has no `book_depth`.
    pub fn check_fix_fen(&self, files: &[PathBuf]) -> Result<(), CorpusError> {
        for file in files {
            let has_depth = self.lookup(file).is_some_and(|meta| meta.book_depth.is_some());
            if !has_depth {
                return Err(CorpusError::MissingBookDepth { file: file.clone() });
            }
        }
        Ok(())
    }
}

/// Drops files whose test has no `book` value, or whose `book` value does
/// not match `regex` (does match, if `invert` is set).
#[must_use]
pub fn filter_files_book(
    files: Vec<PathBuf>,
    metadata: &Metadata,
    regex: &regex::Regex,
    invert: bool,
) -> Vec<PathBuf> {
    files
        .into_iter()
        .filter(|file| {
            metadata
                .lookup(file)
                .and_then(|meta| meta.book.as_deref())
                .is_some_and(|book| regex.is_match(book) != invert)
        })
        .collect()
}

/// Keeps only files whose test metadata carries a (present, hence truthy)
/// `sprt` field.
#[must_use]
pub fn filter_files_sprt(files: Vec<PathBuf>, metadata: &Metadata) -> Vec<PathBuf> {
    files
        .into_iter()
        .filter(|file| metadata.lookup(file).is_some_and(|meta| meta.sprt))
        .collect()
}
