mod span;
mod source;
mod diagnostic;

pub use span::Span;
pub use source::LineIndex;
pub use diagnostic::{Diagnostic, DiagnosticLevel};
