//! Diagnostic sink.
//!
//! Entry points never abort on user errors. When a failure affects the final
//! choice, the caller pushes a [`Diagnostic`] here (plus one note per
//! remaining candidate for ambiguity reports) and continues with a sentinel.

use std::collections::VecDeque;
use std::fmt;

use crate::{CompilationError, Span};

/// Severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Makes the current construct ill-formed.
    Error,
    /// Suspicious but accepted.
    Warning,
    /// Attached context, e.g. one candidate of an ambiguous call.
    Note,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Note => "note",
        })
    }
}

/// A single structured report.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub span: Span,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>, span: Span) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            span,
        }
    }

    pub fn note(message: impl Into<String>, span: Span) -> Self {
        Self {
            severity: Severity::Note,
            message: message.into(),
            span,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.span, self.severity, self.message)
    }
}

/// Ordered collection of diagnostics.
///
/// The error state is tracked as diagnostics are added, so `has_errors` does
/// not need to scan.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    entries: VecDeque<Diagnostic>,
    has_errors: bool,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a diagnostic to the collection.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        if diagnostic.severity == Severity::Error {
            self.has_errors = true;
        }
        self.entries.push_back(diagnostic);
    }

    /// Report a compilation error, followed by notes.
    pub fn report(&mut self, error: &CompilationError, notes: &[String]) {
        let span = error.span();
        self.push(Diagnostic::error(error.to_string(), span));
        for note in notes {
            self.push(Diagnostic::note(note.clone(), span));
        }
    }

    pub fn has_errors(&self) -> bool {
        self.has_errors
    }

    pub fn error_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries
            .iter()
            .filter(|d| d.severity == Severity::Error)
    }

    /// Removes all diagnostics and resets the error flag.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.has_errors = false;
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for d in &self.entries {
            writeln!(f, "{d}")?;
        }
        Ok(())
    }
}
