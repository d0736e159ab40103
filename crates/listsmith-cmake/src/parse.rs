//! Reading existing lists files back into documents.
//!
//! The text is split into command blocks (identifier, `(`, balanced
//! parentheses) and the runs of whitespace and comments between them.
//! Blocks whose keyword the registry knows, and whose arguments can be
//! re-emitted without loss, become [`CommandNode`]s; everything else is
//! kept verbatim so that serializing the document reproduces the file.

use crate::codec::decode;
use crate::command::{CommandNode, UnknownCommand};
use crate::document::{ListsDocument, ListsElement};
use crate::error::ParseError;
use crate::registry::CommandRegistry;
use listsmith_common::{LineIndex, Span};
use tracing::{debug, warn};

/// Result of reading a lists file: whatever was reconstructed, plus the
/// problems found along the way.
#[derive(Debug, Clone)]
pub struct Parsed {
    pub document: ListsDocument,
    pub errors: Vec<ParseError>,
}

impl Parsed {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// The document, or the errors if there were any.
    pub fn into_result(self) -> Result<ListsDocument, Vec<ParseError>> {
        if self.errors.is_empty() {
            Ok(self.document)
        } else {
            Err(self.errors)
        }
    }
}

pub(crate) fn parse(registry: &CommandRegistry, text: &str) -> Parsed {
    let mut parser = Parser {
        registry,
        lines: LineIndex::new(text),
        src: text,
        bytes: text.as_bytes(),
        pos: 0,
        text_start: 0,
        document: ListsDocument::new(),
        errors: Vec::new(),
    };
    parser.run();

    debug!(
        elements = parser.document.len(),
        commands = parser.document.commands().count(),
        errors = parser.errors.len(),
        "parsed lists document"
    );

    Parsed {
        document: parser.document,
        errors: parser.errors,
    }
}

/// How a scanned block ended.
enum Block {
    Closed { opaque: bool },
    Malformed(ParseError),
}

struct Parser<'a> {
    registry: &'a CommandRegistry,
    lines: LineIndex,
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    /// Start of the pending verbatim text run.
    text_start: usize,
    document: ListsDocument,
    errors: Vec<ParseError>,
}

impl<'a> Parser<'a> {
    fn run(&mut self) {
        while let Some(&b) = self.bytes.get(self.pos) {
            match b {
                b' ' | b'\t' | b'\r' | b'\n' => self.pos += 1,
                b'#' => self.skip_comment(),
                b if is_ident_start(b) => self.command(),
                _ => {
                    let found = self.src[self.pos..].chars().next().unwrap_or('\u{fffd}');
                    let span = Span::from_range(self.pos..self.pos + found.len_utf8());
                    let (line, column) = self.line_col(self.pos);
                    self.errors.push(ParseError::UnexpectedCharacter {
                        found,
                        span: span.into(),
                        line,
                        column,
                    });
                    self.pos = span.end as usize;
                }
            }
        }
        self.flush_text(self.bytes.len());
    }

    fn command(&mut self) {
        let src = self.src;
        let start = self.pos;
        while self.bytes.get(self.pos).copied().is_some_and(is_ident_continue) {
            self.pos += 1;
        }
        let keyword = &src[start..self.pos];
        let keyword_end = self.pos;

        while matches!(self.bytes.get(self.pos), Some(b' ' | b'\t')) {
            self.pos += 1;
        }

        if self.bytes.get(self.pos) != Some(&b'(') {
            // left in the pending text run
            let (line, column) = self.line_col(start);
            self.errors.push(ParseError::ExpectedOpenParen {
                keyword: keyword.to_string(),
                span: Span::from_range(start..keyword_end).into(),
                line,
                column,
            });
            return;
        }

        self.flush_text(start);
        let open = self.pos;
        self.pos += 1;

        let opaque = match self.scan_arguments(keyword, start, open) {
            Block::Closed { opaque } => opaque,
            Block::Malformed(err) => {
                warn!(keyword, offset = start, "malformed command block kept as text");
                self.errors.push(err);
                self.pos = self.bytes.len();
                // the block runs to the end of the file; keep it as written
                self.text_start = start;
                return;
            }
        };

        let close = self.pos - 1;
        // a `\r` before the newline stays in the source text so CRLF files round-trip
        let mut end = close + 1;
        if self.bytes.get(end) == Some(&b'\r') && self.bytes.get(end + 1) == Some(&b'\n') {
            end += 1;
        }
        let add_eol = self.bytes.get(end) == Some(&b'\n');
        if add_eol {
            self.pos = end + 1;
        }
        self.text_start = self.pos;

        let raw = if add_eol { &src[start..end] } else { &src[start..=close] };
        let inner = &src[open + 1..close];
        let resolved = if opaque {
            None
        } else {
            // unterminated quotes were reported by the scan, so decoding succeeds here
            decode(inner).ok().and_then(|args| {
                let (ty, fixed) = self.registry.resolve(keyword, &args)?;
                Some(CommandNode::from_parsed(ty, args[fixed..].to_vec(), raw, add_eol))
            })
        };
        let element: ListsElement = match resolved {
            Some(node) => node.into(),
            None => UnknownCommand::new(keyword, raw, add_eol).into(),
        };
        self.document.push(element);
    }

    /// Advance past the argument list starting after `(` at `open`.
    ///
    /// Marks the block opaque when its arguments hold constructs that the
    /// codec would not re-emit faithfully.
    fn scan_arguments(&mut self, keyword: &str, start: usize, open: usize) -> Block {
        let mut depth = 1usize;
        let mut opaque = false;

        loop {
            let Some(&b) = self.bytes.get(self.pos) else {
                let (line, column) = self.line_col(open);
                return Block::Malformed(ParseError::UnterminatedCommand {
                    keyword: keyword.to_string(),
                    span: Span::from_range(open..open + 1).into(),
                    line,
                    column,
                    text: self.src[start..].to_string(),
                });
            };

            match b {
                b'"' => {
                    if !self.at_token_start() {
                        opaque = true;
                    }
                    let quote = self.pos;
                    self.pos += 1;
                    // CMake expands variable references inside quotes without splitting
                    // on `;`; such arguments must keep their quotes
                    loop {
                        match self.bytes.get(self.pos) {
                            None => {
                                let (line, column) = self.line_col(quote);
                                return Block::Malformed(ParseError::MalformedQuoting {
                                    span: Span::from_range(quote..quote + 1).into(),
                                    line,
                                    column,
                                    text: self.src[start..].to_string(),
                                });
                            }
                            Some(b'\\') => {
                                if !matches!(self.bytes.get(self.pos + 1), Some(b'"' | b'\\')) {
                                    opaque = true;
                                }
                                self.pos = (self.pos + 2).min(self.bytes.len());
                            }
                            Some(b'"') => {
                                if has_variable_reference(&self.src[quote + 1..self.pos]) {
                                    opaque = true;
                                }
                                self.pos += 1;
                                break;
                            }
                            Some(_) => self.pos += 1,
                        }
                    }
                    let after = self.bytes.get(self.pos);
                    if !matches!(after, None | Some(b' ' | b'\t' | b'\r' | b'\n' | b')')) {
                        opaque = true;
                    }
                }
                b'\\' => {
                    opaque = true;
                    self.pos = (self.pos + 2).min(self.bytes.len());
                }
                b'(' => {
                    opaque = true;
                    depth += 1;
                    self.pos += 1;
                }
                b')' => {
                    self.pos += 1;
                    depth -= 1;
                    if depth == 0 {
                        return Block::Closed { opaque };
                    }
                }
                b'#' if self.at_token_start() => {
                    opaque = true;
                    self.skip_comment();
                }
                b'[' if self.at_token_start() && self.bracket_open_len(self.pos).is_some() => {
                    opaque = true;
                    self.skip_bracket(self.pos);
                }
                _ => self.pos += 1,
            }
        }
    }

    fn at_token_start(&self) -> bool {
        match self.pos.checked_sub(1).map(|i| self.bytes[i]) {
            None => true,
            Some(prev) => matches!(prev, b' ' | b'\t' | b'\r' | b'\n' | b'('),
        }
    }

    /// Skip a `#` comment; the position is left on the terminating newline.
    fn skip_comment(&mut self) {
        let bracket = self.pos + 1;
        if self.bracket_open_len(bracket).is_some() {
            self.skip_bracket(bracket);
            return;
        }
        while self.bytes.get(self.pos).is_some_and(|&b| b != b'\n') {
            self.pos += 1;
        }
    }

    /// Number of `=` in a bracket opener `[==[` at `at`.
    fn bracket_open_len(&self, at: usize) -> Option<usize> {
        if self.bytes.get(at) != Some(&b'[') {
            return None;
        }
        let equals = self.bytes[at + 1..].iter().take_while(|&&b| b == b'=').count();
        (self.bytes.get(at + 1 + equals) == Some(&b'[')).then_some(equals)
    }

    /// Skip a bracket construct opening at `at`, up to and including its
    /// matching closer (or to the end of input).
    fn skip_bracket(&mut self, at: usize) {
        let equals = self.bracket_open_len(at).unwrap_or(0);
        let closer = format!("]{}]", "=".repeat(equals));
        let body = at + equals + 2;
        self.pos = match self.src[body..].find(&closer) {
            Some(i) => body + i + closer.len(),
            None => self.bytes.len(),
        };
    }

    fn flush_text(&mut self, end: usize) {
        if end > self.text_start {
            self.document.push_text(&self.src[self.text_start..end]);
        }
        self.text_start = end;
    }

    /// 1-based line and column.
    fn line_col(&self, offset: usize) -> (u32, u32) {
        let (line, col) = self.lines.line_col(offset as u32);
        (line + 1, col + 1)
    }
}

/// `${..}`, `$ENV{..}`, `$CACHE{..}` or `@name@`.
fn has_variable_reference(text: &str) -> bool {
    if ["${", "$ENV{", "$CACHE{"].iter().any(|open| text.contains(open)) {
        return true;
    }
    let mut parts = text.split('@');
    parts.next();
    let mut parts = parts.peekable();
    while let Some(name) = parts.next() {
        if parts.peek().is_some() && !name.is_empty() && name.bytes().all(is_ident_continue) {
            return true;
        }
    }
    false
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}
