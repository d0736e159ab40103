//! Leveled diagnostics for findings that are not hard errors.
//!
//! Parse failures carry their own typed errors; this struct is for
//! everything that only needs a message, an optional span, and a hint.

use crate::span::Span;
use miette::{Diagnostic as MietteDiagnostic, SourceSpan};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticLevel {
    Error,
    Warning,
    Info,
    Hint,
}

impl fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DiagnosticLevel::Error => "error",
            DiagnosticLevel::Warning => "warning",
            DiagnosticLevel::Info => "info",
            DiagnosticLevel::Hint => "hint",
        };
        f.write_str(s)
    }
}

impl From<DiagnosticLevel> for miette::Severity {
    fn from(level: DiagnosticLevel) -> Self {
        match level {
            DiagnosticLevel::Error => miette::Severity::Error,
            DiagnosticLevel::Warning => miette::Severity::Warning,
            DiagnosticLevel::Info | DiagnosticLevel::Hint => miette::Severity::Advice,
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub message: String,
    pub span: Option<SourceSpan>,
    pub label: String,
    pub help: Option<String>,
}

impl MietteDiagnostic for Diagnostic {
    fn severity(&self) -> Option<miette::Severity> {
        Some(self.level.into())
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.help
            .as_ref()
            .map(|h| Box::new(h) as Box<dyn fmt::Display + 'a>)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = miette::LabeledSpan> + '_>> {
        let span = self.span?;
        let label = (!self.label.is_empty()).then(|| self.label.clone());
        Some(Box::new(std::iter::once(miette::LabeledSpan::new_with_span(
            label, span,
        ))))
    }
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Self::with_level(DiagnosticLevel::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::with_level(DiagnosticLevel::Warning, message)
    }

    fn with_level(level: DiagnosticLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            span: None,
            label: String::new(),
            help: None,
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.level == DiagnosticLevel::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let diag = Diagnostic::warning("board is empty")
            .with_span(Span::new(3, 7))
            .with_label("here")
            .with_help("set [board].id");

        assert!(!diag.is_error());
        assert_eq!(diag.to_string(), "board is empty");
        assert_eq!(MietteDiagnostic::severity(&diag), Some(miette::Severity::Warning));
        assert_eq!(diag.labels().map(|l| l.count()), Some(1));
        assert!(MietteDiagnostic::help(&diag).is_some());
    }

    #[test]
    fn test_no_span_no_labels() {
        let diag = Diagnostic::error("broken");
        assert!(diag.is_error());
        assert!(diag.labels().is_none());
    }
}
