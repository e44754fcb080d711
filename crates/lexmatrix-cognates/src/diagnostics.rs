//! Non-fatal findings collected during a run.
//!
//! Hand-edited sheets are expected to be noisy, so a stale link or an unknown
//! language never aborts an import. Each problem is logged once through
//! `tracing` and recorded here, and the list travels back to the caller next
//! to whatever could be assembled.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A parsed value does not match an existing form, language or cognateset.
    ReferenceMismatch,
    /// The input can be read more than one way; a fallback was applied.
    ParseAmbiguity,
    /// The dataset has no status column, so nothing was status-tagged.
    MissingStatusColumn,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DiagnosticKind::ReferenceMismatch => "reference mismatch",
            DiagnosticKind::ParseAmbiguity => "parse ambiguity",
            DiagnosticKind::MissingStatusColumn => "missing status column",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// Cell coordinate, row or entity the finding is about.
    pub location: Option<String>,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(loc) => write!(f, "{} at {}: {}", self.kind, loc, self.message),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finding and log it.
    pub fn report(
        &mut self,
        kind: DiagnosticKind,
        location: Option<&str>,
        message: impl Into<String>,
    ) {
        let message = message.into();
        let loc = location.unwrap_or("-");
        match kind {
            DiagnosticKind::MissingStatusColumn => {
                tracing::info!(kind = %kind, location = %loc, "{message}")
            }
            _ => tracing::warn!(kind = %kind, location = %loc, "{message}"),
        }
        self.0.push(Diagnostic {
            kind,
            location: location.map(str::to_string),
            message,
        });
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter()
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.0.iter().filter(|d| d.kind == kind).count()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
