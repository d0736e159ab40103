//! Error types for listsmith-cmake.

use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

/// Result type for command argument operations.
pub type Result<T> = std::result::Result<T, CommandError>;

/// Errors raised by direct argument mutation on a command node.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Argument index outside the valid range for the operation.
    #[error("argument index {index} out of range for {len} argument(s)")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Errors from decoding CMake argument text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// A quoted argument was opened but never closed.
    #[error("unterminated quoted argument at offset {offset}: {text}")]
    MalformedQuoting { offset: usize, text: String },
}

/// Errors from building a command registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Two command types registered under the same name.
    #[error("command type `{0}` is already registered")]
    DuplicateName(String),

    /// Keyword is not a valid CMake command identifier.
    #[error("`{0}` is not a valid command keyword")]
    InvalidKeyword(String),
}

/// A recoverable problem found while reading a lists file.
///
/// Lines and columns are 1-based. `text` holds the source text of the
/// offending block.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unterminated quoted argument at {line}:{column}")]
    #[diagnostic(
        code(listsmith::malformed_quoting),
        help("close the argument with a matching `\"`")
    )]
    MalformedQuoting {
        #[label("quote opened here")]
        span: SourceSpan,
        line: u32,
        column: u32,
        text: String,
    },

    #[error("command `{keyword}` at {line}:{column} is missing its closing `)`")]
    #[diagnostic(code(listsmith::unterminated_command))]
    UnterminatedCommand {
        keyword: String,
        #[label("argument list opened here")]
        span: SourceSpan,
        line: u32,
        column: u32,
        text: String,
    },

    #[error("expected `(` after `{keyword}` at {line}:{column}")]
    #[diagnostic(code(listsmith::expected_open_paren))]
    ExpectedOpenParen {
        keyword: String,
        #[label("not followed by an argument list")]
        span: SourceSpan,
        line: u32,
        column: u32,
    },

    #[error("unexpected character `{found}` at {line}:{column}")]
    #[diagnostic(code(listsmith::unexpected_character))]
    UnexpectedCharacter {
        found: char,
        #[label]
        span: SourceSpan,
        line: u32,
        column: u32,
    },
}

impl ParseError {
    pub fn span(&self) -> SourceSpan {
        match self {
            ParseError::MalformedQuoting { span, .. }
            | ParseError::UnterminatedCommand { span, .. }
            | ParseError::ExpectedOpenParen { span, .. }
            | ParseError::UnexpectedCharacter { span, .. } => *span,
        }
    }

    /// 1-based line of the error.
    pub fn line(&self) -> u32 {
        match self {
            ParseError::MalformedQuoting { line, .. }
            | ParseError::UnterminatedCommand { line, .. }
            | ParseError::ExpectedOpenParen { line, .. }
            | ParseError::UnexpectedCharacter { line, .. } => *line,
        }
    }
}
