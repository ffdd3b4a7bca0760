//! A push parser for the PGN (Portable Game Notation) game-record format.
//!
//! [`read_games`] drives a [`Visitor`] over a byte stream: one `start_pgn`,
//! one `header` call per tag pair, one `start_moves`, one `san_move` call per
//! ply (together with its trailing `{...}` comment, if any), and one
//! `end_pgn` per game. A visitor may request that the remainder of the
//! current game be skipped; the parser honours that by suppressing further
//! callbacks (except `end_pgn`, which always fires so the visitor can reset)
//! rather than by erroring.
//!
//! This is a hand-written recursive-descent tokenizer rather than a wrapper
//! around an external PGN crate: the callback contract above (one visitor,
//! comments delivered alongside their move, an explicit one-way
//! skip-this-game signal) does not line up with the `Visitor`-plus-
//! associated-types shape modern PGN crates expose, and adapting one would
//! cost more than writing the tokenizer directly.

use std::io::{self, Read};

/// Callbacks driven by [`read_games`] as it walks a stream of games.
///
/// Default method bodies do nothing, so a visitor only needs to implement
/// the callbacks it cares about. [`Visitor::skip_current_game`] is polled
/// after every callback; once it returns `true`, the parser stops invoking
/// anything but `end_pgn` for the rest of the current game.
pub trait Visitor {
    /// Called once, before the first header of a new game.
    fn start_pgn(&mut self) {}

    /// Called once per `[Key "Value"]` tag pair in the header block.
    fn header(&mut self, _key: &str, _value: &str) {}

    /// Called once, after the header block and before the first move.
    fn start_moves(&mut self) {}

    /// Called once per ply, with the move's trailing brace comment (if any
    /// immediately follows it) attached.
    fn san_move(&mut self, _text: &str, _comment: Option<&str>) {}

    /// Called once per game, including skipped ones, so the visitor can
    /// reset its state.
    fn end_pgn(&mut self) {}

    /// Polled by the parser after every other callback. Once this returns
    /// `true`, no further callbacks fire for the current game until
    /// `end_pgn`.
    #[must_use]
    fn skip_current_game(&self) -> bool {
        false
    }
}

/// Reads every game from `reader`, driving `visitor`.
///
/// The whole stream is buffered in memory before parsing begins; this keeps
/// the tokenizer simple at the cost of not processing a single file in
/// constant space. A corpus run keeps memory bounded by working one file
/// (not one run) at a time.
///
/// # Errors
///
/// Returns an error only if `reader` itself fails; malformed PGN text is
/// handled leniently (tokens that cannot be classified are dropped) rather
/// than surfaced as an error, per the push-parser's tolerance contract.
pub fn read_games(mut reader: impl Read, visitor: &mut impl Visitor) -> io::Result<()> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    let mut scanner = Scanner::new(&text);
    loop {
        scanner.skip_whitespace();
        if !scanner.has_more() {
            return Ok(());
        }
        parse_one_game(&mut scanner, visitor);
    }
}

struct Scanner<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            bytes: text.as_bytes(),
            pos: 0,
        }
    }

    fn has_more(&self) -> bool {
        self.pos < self.bytes.len()
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    /// Advances one byte and returns it. Safe to call mid-codepoint: callers
    /// never slice `text` at a position this leaves misaligned, since every
    /// slice boundary used below sits on an ASCII delimiter byte (multi-byte
    /// UTF-8 continuation bytes are always `>= 0x80` and never match one).
    fn advance(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Some(byte)
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(byte) if byte.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }
}

fn parse_one_game(scanner: &mut Scanner, visitor: &mut impl Visitor) {
    visitor.start_pgn();
    parse_headers(scanner, visitor);
    scanner.skip_whitespace();
    if !visitor.skip_current_game() {
        visitor.start_moves();
    }
    parse_movetext(scanner, visitor);
    visitor.end_pgn();
}

fn parse_headers(scanner: &mut Scanner, visitor: &mut impl Visitor) {
    loop {
        scanner.skip_whitespace();
        if scanner.peek() != Some(b'[') {
            return;
        }
        scanner.advance();
        let key_start = scanner.pos;
        while matches!(scanner.peek(), Some(byte) if byte != b' ' && byte != b']' && byte != b'"')
        {
            scanner.advance();
        }
        let key = &scanner.text[key_start..scanner.pos];
        scanner.skip_whitespace();

        if scanner.peek() != Some(b'"') {
            // Malformed tag pair (no quoted value): skip to the closing
            // bracket and move on rather than aborting the whole stream.
            while matches!(scanner.peek(), Some(byte) if byte != b']') {
                scanner.advance();
            }
            scanner.advance();
            continue;
        }
        scanner.advance();
        let value = parse_quoted(scanner);
        if scanner.peek() == Some(b'"') {
            scanner.advance();
        }
        scanner.skip_whitespace();
        if scanner.peek() == Some(b']') {
            scanner.advance();
        }

        if !key.is_empty() && !visitor.skip_current_game() {
            visitor.header(key, &value);
        }
    }
}

/// Reads the body of a `"..."` tag value (opening quote already consumed),
/// unescaping `\"` and `\\`, leaving the scanner positioned at the closing
/// quote.
fn parse_quoted(scanner: &mut Scanner) -> String {
    let mut value = String::new();
    let mut run_start = scanner.pos;
    loop {
        match scanner.peek() {
            None | Some(b'"') => {
                value.push_str(&scanner.text[run_start..scanner.pos]);
                break;
            }
            Some(b'\\') => {
                value.push_str(&scanner.text[run_start..scanner.pos]);
                scanner.advance();
                if let Some(escaped) = scanner.advance() {
                    value.push(escaped as char);
                }
                run_start = scanner.pos;
            }
            Some(_) => {
                scanner.advance();
            }
        }
    }
    value
}

fn is_token_boundary(byte: u8) -> bool {
    byte.is_ascii_whitespace() || matches!(byte, b'{' | b'(' | b')' | b'}' | b';' | b'$')
}

fn read_token<'a>(scanner: &mut Scanner<'a>) -> &'a str {
    let start = scanner.pos;
    while matches!(scanner.peek(), Some(byte) if !is_token_boundary(byte)) {
        scanner.advance();
    }
    &scanner.text[start..scanner.pos]
}

fn is_termination_marker(token: &str) -> bool {
    matches!(token, "1-0" | "0-1" | "1/2-1/2" | "*")
}

/// Strips a leading move-number indicator (`"12."`, `"12..."`) from `token`,
/// so that `"1.e4"` (no space after the period, a common PGN style) and
/// `"1. e4"` both resolve to the same SAN text.
fn strip_move_number(token: &str) -> &str {
    let bytes = token.as_bytes();
    let mut idx = 0;
    while idx < bytes.len() && (bytes[idx].is_ascii_digit() || bytes[idx] == b'.') {
        idx += 1;
    }
    &token[idx..]
}

fn flush_pending(pending: &mut Option<String>, visitor: &mut impl Visitor, comment: Option<&str>) {
    if let Some(san) = pending.take() {
        if !visitor.skip_current_game() {
            visitor.san_move(&san, comment);
        }
    }
}

fn read_brace_comment<'a>(scanner: &mut Scanner<'a>) -> &'a str {
    let start = scanner.pos;
    while matches!(scanner.peek(), Some(byte) if byte != b'}') {
        scanner.advance();
    }
    let text = &scanner.text[start..scanner.pos];
    if scanner.peek() == Some(b'}') {
        scanner.advance();
    }
    text
}

fn skip_balanced_parens(scanner: &mut Scanner) {
    scanner.advance();
    let mut depth = 1usize;
    while depth > 0 {
        match scanner.peek() {
            Some(b'(') => {
                depth += 1;
                scanner.advance();
            }
            Some(b')') => {
                depth -= 1;
                scanner.advance();
            }
            Some(_) => {
                scanner.advance();
            }
            None => break,
        }
    }
}

fn skip_to_eol(scanner: &mut Scanner) {
    while matches!(scanner.peek(), Some(byte) if byte != b'\n') {
        scanner.advance();
    }
}

fn parse_movetext(scanner: &mut Scanner, visitor: &mut impl Visitor) {
    let mut pending: Option<String> = None;
    loop {
        scanner.skip_whitespace();
        let Some(byte) = scanner.peek() else {
            flush_pending(&mut pending, visitor, None);
            return;
        };
        match byte {
            b'[' => {
                // No terminator was seen; the next header block starts
                // here. Treat it as the (implicit) end of this game.
                flush_pending(&mut pending, visitor, None);
                return;
            }
            b'{' => {
                scanner.advance();
                let comment = read_brace_comment(scanner).trim();
                let comment = if comment.is_empty() { None } else { Some(comment) };
                flush_pending(&mut pending, visitor, comment);
            }
            b';' => skip_to_eol(scanner),
            b'(' => skip_balanced_parens(scanner),
            b'$' => {
                scanner.advance();
                read_token(scanner);
            }
            _ => {
                let token = read_token(scanner);
                if token.is_empty() {
                    // Unexpected lone delimiter byte (e.g. a stray `)`); skip
                    // it so the loop always makes progress.
                    scanner.advance();
                    continue;
                }
                if is_termination_marker(token) {
                    flush_pending(&mut pending, visitor, None);
                    return;
                }
                let remainder = strip_move_number(token);
                if !remainder.is_empty() {
                    flush_pending(&mut pending, visitor, None);
                    pending = Some(remainder.to_string());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        headers: Vec<(String, String)>,
        moves: Vec<(String, Option<String>)>,
        games: u32,
    }

    impl Visitor for Recorder {
        fn header(&mut self, key: &str, value: &str) {
            self.headers.push((key.to_string(), value.to_string()));
        }

        fn san_move(&mut self, text: &str, comment: Option<&str>) {
            self.moves.push((text.to_string(), comment.map(str::to_string)));
        }

        fn end_pgn(&mut self) {
            self.games += 1;
        }
    }

    #[test]
    fn parses_headers_and_moves() {
        let pgn = r#"[Event "Test"]
[White "Alice"]
[Black "Bob"]

1. e4 e5 2. Nf3 Nc6 1-0
"#;
        let mut recorder = Recorder::default();
        read_games(pgn.as_bytes(), &mut recorder).unwrap();
        assert_eq!(
            recorder.headers,
            vec![
                ("Event".to_string(), "Test".to_string()),
                ("White".to_string(), "Alice".to_string()),
                ("Black".to_string(), "Bob".to_string()),
            ]
        );
        assert_eq!(
            recorder.moves,
            vec![
                ("e4".to_string(), None),
                ("e5".to_string(), None),
                ("Nf3".to_string(), None),
                ("Nc6".to_string(), None),
            ]
        );
        assert_eq!(recorder.games, 1);
    }

    #[test]
    fn handles_compact_move_numbers() {
        let pgn = "[Event \"x\"]\n\n1.e4 e5 2.Nf3 *\n";
        let mut recorder = Recorder::default();
        read_games(pgn.as_bytes(), &mut recorder).unwrap();
        assert_eq!(recorder.moves.len(), 3);
    }

    #[test]
    fn attaches_comment_to_preceding_move() {
        let pgn = "[Event \"x\"]\n\n1. e4 { book } e5 2. Nf3 *\n";
        let mut recorder = Recorder::default();
        read_games(pgn.as_bytes(), &mut recorder).unwrap();
        assert_eq!(
            recorder.moves,
            vec![
                ("e4".to_string(), Some("book".to_string())),
                ("e5".to_string(), None),
                ("Nf3".to_string(), None),
            ]
        );
    }

    #[test]
    fn skips_variations_and_nags() {
        let pgn = "[Event \"x\"]\n\n1. e4 $1 (1. d4 d5) e5 *\n";
        let mut recorder = Recorder::default();
        read_games(pgn.as_bytes(), &mut recorder).unwrap();
        assert_eq!(
            recorder.moves,
            vec![("e4".to_string(), None), ("e5".to_string(), None)]
        );
    }

    #[test]
    fn reads_multiple_games() {
        let pgn = "[Event \"a\"]\n\n1. e4 *\n[Event \"b\"]\n\n1. d4 *\n";
        let mut recorder = Recorder::default();
        read_games(pgn.as_bytes(), &mut recorder).unwrap();
        assert_eq!(recorder.games, 2);
        assert_eq!(recorder.moves.len(), 2);
    }

    #[test]
    fn unescapes_quoted_values() {
        let pgn = "[Event \"Say \\\"hi\\\"\"]\n\n*\n";
        let mut recorder = Recorder::default();
        read_games(pgn.as_bytes(), &mut recorder).unwrap();
        assert_eq!(recorder.headers, vec![("Event".to_string(), "Say \"hi\"".to_string())]);
    }

    #[test]
    fn skip_current_game_suppresses_remaining_callbacks() {
        struct SkipAfterFirstMove {
            moves: Vec<String>,
            skip: bool,
        }
        impl Visitor for SkipAfterFirstMove {
            fn san_move(&mut self, text: &str, _comment: Option<&str>) {
                self.moves.push(text.to_string());
                self.skip = true;
            }
            fn skip_current_game(&self) -> bool {
                self.skip
            }
        }
        let pgn = "[Event \"x\"]\n\n1. e4 e5 2. Nf3 Nc6 *\n";
        let mut visitor = SkipAfterFirstMove {
            moves: Vec::new(),
            skip: false,
        };
        read_games(pgn.as_bytes(), &mut visitor).unwrap();
        assert_eq!(visitor.moves, vec!["e4".to_string()]);
    }
}
