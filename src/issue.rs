//! Diagnostics produced by the assembler.

use std::fmt;

use crate::error::M68kError;

/// Severity of an [`Issue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Assembly cannot be trusted to be correct for this line.
    Error,
    /// Assembly succeeded but something is worth flagging.
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "ERROR"),
            Self::Warning => write!(f, "WARNING"),
        }
    }
}

/// A single diagnostic emitted while assembling or simulating.
///
/// `(message, severity)` is the tuple shape spec.md §6.2 describes; `line` is
/// additive (see SPEC_FULL.md §4.3) and is `None` when an issue isn't tied to
/// a specific source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    /// Human-readable description.
    pub message: String,
    /// Error or warning.
    pub severity: Severity,
    /// The taxonomy entry this issue corresponds to.
    pub kind: M68kError,
    /// 1-based source line number, when known.
    pub line: Option<usize>,
}

impl Issue {
    /// Build an issue with no associated line.
    #[must_use]
    pub fn new(kind: M68kError, severity: Severity) -> Self {
        let message = kind.to_string();
        Self {
            message,
            severity,
            kind,
            line: None,
        }
    }

    /// Build an error-severity issue.
    #[must_use]
    pub fn error(kind: M68kError) -> Self {
        Self::new(kind, Severity::Error)
    }

    /// Build a warning-severity issue.
    #[must_use]
    pub fn warning(kind: M68kError) -> Self {
        Self::new(kind, Severity::Warning)
    }

    /// Attach a source line number.
    #[must_use]
    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    /// True if this issue is fatal to the affected line's emission.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "line {}: {} [{}]", line, self.message, self.severity),
            None => write!(f, "{} [{}]", self.message, self.severity),
        }
    }
}
