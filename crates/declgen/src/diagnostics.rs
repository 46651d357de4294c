//! Recoverable problems collected across a run.
//!
//! Stages push into a shared [`Diagnostics`] instead of printing, so the
//! caller can report everything once at the end and decide whether partial
//! output is acceptable.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Note,
    Warning,
}

/// What went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticKind {
    /// A type expression the model builder does not translate.
    UnsupportedType,
    /// A union matched the wire values of more than one enum.
    AmbiguousMatch,
    /// A type reference that no declaration in scope answers to.
    UnresolvedReference,
    /// `T[][]` collapsed to a single array level.
    FlattenedArray,
    /// A declaration form the model builder ignores.
    SkippedDeclaration,
}

impl DiagnosticKind {
    pub fn severity(self) -> Severity {
        match self {
            DiagnosticKind::UnsupportedType
            | DiagnosticKind::AmbiguousMatch
            | DiagnosticKind::FlattenedArray => Severity::Warning,
            DiagnosticKind::UnresolvedReference | DiagnosticKind::SkippedDeclaration => {
                Severity::Note
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticKind::UnsupportedType => "unsupported-type",
            DiagnosticKind::AmbiguousMatch => "ambiguous-match",
            DiagnosticKind::UnresolvedReference => "unresolved-reference",
            DiagnosticKind::FlattenedArray => "flattened-array",
            DiagnosticKind::SkippedDeclaration => "skipped-declaration",
        }
    }
}

/// A single diagnostic, located by the dotted path of the declaration it
/// concerns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub path: String,
    pub message: String,
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "[{}] {}", self.kind.as_str(), self.message)
        } else {
            write!(f, "[{}] {}: {}", self.kind.as_str(), self.path, self.message)
        }
    }
}

/// Accumulator threaded through the pipeline.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(
        &mut self,
        kind: DiagnosticKind,
        path: impl Into<String>,
        message: impl Into<String>,
    ) {
        let diagnostic = Diagnostic {
            kind,
            path: path.into(),
            message: message.into(),
        };
        tracing::trace!(%diagnostic, "diagnostic recorded");
        self.items.push(diagnostic);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.items.iter().filter(|d| d.kind == kind).count()
    }

    pub fn warnings(&self) -> usize {
        self.items
            .iter()
            .filter(|d| d.severity() == Severity::Warning)
            .count()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_by_kind_and_severity() {
        let mut diags = Diagnostics::new();
        diags.push(DiagnosticKind::UnsupportedType, "net.Ping.cb", "function_type");
        diags.push(DiagnosticKind::UnresolvedReference, "net.Ping.at", "Date");
        assert_eq!(diags.len(), 2);
        assert_eq!(diags.count(DiagnosticKind::UnsupportedType), 1);
        assert_eq!(diags.warnings(), 1);
    }

    #[test]
    fn display_includes_kind_and_path() {
        let d = Diagnostic {
            kind: DiagnosticKind::AmbiguousMatch,
            path: "net.Ping.kind".into(),
            message: "also matches net.Other".into(),
        };
        assert_eq!(
            d.to_string(),
            "[ambiguous-match] net.Ping.kind: also matches net.Other"
        );
    }
}
