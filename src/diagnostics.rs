//! Collected, non-fatal build diagnostics.
//!
//! Every failure scoped to a document or root lands here instead of aborting
//! the build. The sink is shared by all workers; each entry is also emitted
//! through `tracing` as it arrives.

use std::fmt;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

/// Severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Warning,
    Error,
}

/// What went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticKind {
    /// The document has no rendered markup; its subtree is left out.
    MissingRenderedMarkup,
    /// A relative link does not point at a known document; left unrewritten.
    UnresolvableLink,
    /// The landmark element is absent (no id stamped) or repeated (first wins).
    MissingOrDuplicateLandmark,
    /// The document's public URL cannot be turned into a page token.
    UrlEncodingFailure,
    /// The merged artifact for a root could not be written.
    OutputWriteFailure,
    /// The rendered markup could not be scanned.
    MalformedMarkup,
    /// The navigation tree for a root could not be loaded.
    TocLoadFailure,
}

impl DiagnosticKind {
    /// Default severity for this kind.
    pub fn level(self) -> Level {
        match self {
            DiagnosticKind::MissingRenderedMarkup
            | DiagnosticKind::UnresolvableLink
            | DiagnosticKind::MissingOrDuplicateLandmark => Level::Warning,
            DiagnosticKind::UrlEncodingFailure
            | DiagnosticKind::OutputWriteFailure
            | DiagnosticKind::MalformedMarkup
            | DiagnosticKind::TocLoadFailure => Level::Error,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            DiagnosticKind::MissingRenderedMarkup => "missing-rendered-markup",
            DiagnosticKind::UnresolvableLink => "unresolvable-link",
            DiagnosticKind::MissingOrDuplicateLandmark => "landmark",
            DiagnosticKind::UrlEncodingFailure => "url-encoding-failure",
            DiagnosticKind::OutputWriteFailure => "output-write-failure",
            DiagnosticKind::MalformedMarkup => "malformed-markup",
            DiagnosticKind::TocLoadFailure => "toc-load-failure",
        }
    }
}

/// A single reported issue with enough context to locate its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: Level,
    pub kind: DiagnosticKind,
    /// Root (TOC) being built, when the issue is root-scoped.
    pub root: Option<String>,
    /// Document the issue was found in.
    pub document: Option<String>,
    /// Offending link value, for link issues.
    pub link: Option<String>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            level: kind.level(),
            kind,
            root: None,
            document: None,
            link: None,
            message: message.into(),
        }
    }

    pub fn with_root(mut self, root: impl fmt::Display) -> Self {
        self.root = Some(root.to_string());
        self
    }

    pub fn with_document(mut self, document: impl fmt::Display) -> Self {
        self.document = Some(document.to_string());
        self
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    fn sort_key(&self) -> (&Option<String>, &Option<String>, DiagnosticKind, &Option<String>, &str) {
        (&self.root, &self.document, self.kind, &self.link, &self.message)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.level {
            Level::Warning => "warning",
            Level::Error => "error",
        };
        write!(f, "{level}[{}]", self.kind.code())?;
        if let Some(root) = &self.root {
            write!(f, " root={root}")?;
        }
        if let Some(document) = &self.document {
            write!(f, " document={document}")?;
        }
        if let Some(link) = &self.link {
            write!(f, " link={link:?}")?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Thread-safe, append-only diagnostics sink.
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Mutex<Vec<Diagnostic>>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic and log it at the matching level.
    pub fn push(&self, diagnostic: Diagnostic) {
        match diagnostic.level {
            Level::Warning => tracing::warn!(
                kind = diagnostic.kind.code(),
                root = diagnostic.root.as_deref(),
                document = diagnostic.document.as_deref(),
                link = diagnostic.link.as_deref(),
                "{}",
                diagnostic.message
            ),
            Level::Error => tracing::error!(
                kind = diagnostic.kind.code(),
                root = diagnostic.root.as_deref(),
                document = diagnostic.document.as_deref(),
                link = diagnostic.link.as_deref(),
                "{}",
                diagnostic.message
            ),
        }
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(diagnostic);
    }

    pub fn extend(&self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        for diagnostic in diagnostics {
            self.push(diagnostic);
        }
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Consume the sink, returning diagnostics in a deterministic order.
    pub fn into_sorted(self) -> Vec<Diagnostic> {
        let mut entries = self
            .entries
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        entries.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        entries
    }
}

/// Outcome of a build: artifacts written plus every collected diagnostic.
#[derive(Debug, Default)]
pub struct BuildReport {
    pub artifacts: Vec<PathBuf>,
    pub diagnostics: Vec<Diagnostic>,
}

impl BuildReport {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.level == Level::Error)
    }

    /// Diagnostics of one kind.
    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_levels() {
        assert_eq!(DiagnosticKind::UnresolvableLink.level(), Level::Warning);
        assert_eq!(DiagnosticKind::OutputWriteFailure.level(), Level::Error);
    }

    #[test]
    fn test_display_includes_context() {
        let diag = Diagnostic::new(DiagnosticKind::UnresolvableLink, "no such document")
            .with_root("toc.json")
            .with_document("a.html")
            .with_link("missing.html");
        assert_eq!(
            diag.to_string(),
            "warning[unresolvable-link] root=toc.json document=a.html link=\"missing.html\": no such document"
        );
    }

    #[test]
    fn test_sink_sorts_deterministically() {
        let sink = Diagnostics::new();
        sink.push(Diagnostic::new(DiagnosticKind::UnresolvableLink, "x").with_document("b.html"));
        sink.push(Diagnostic::new(DiagnosticKind::UnresolvableLink, "x").with_document("a.html"));
        assert_eq!(sink.len(), 2);

        let sorted = sink.into_sorted();
        assert_eq!(sorted[0].document.as_deref(), Some("a.html"));
        assert_eq!(sorted[1].document.as_deref(), Some("b.html"));
    }

    #[test]
    fn test_sink_is_shared_across_threads() {
        let sink = Diagnostics::new();
        std::thread::scope(|s| {
            for i in 0..8 {
                let sink = &sink;
                s.spawn(move || {
                    sink.push(Diagnostic::new(DiagnosticKind::MalformedMarkup, format!("{i}")));
                });
            }
        });
        assert_eq!(sink.len(), 8);
    }

    #[test]
    fn test_report_has_errors() {
        let mut report = BuildReport::default();
        report
            .diagnostics
            .push(Diagnostic::new(DiagnosticKind::UnresolvableLink, "warn only"));
        assert!(!report.has_errors());
        report
            .diagnostics
            .push(Diagnostic::new(DiagnosticKind::OutputWriteFailure, "disk full"));
        assert!(report.has_errors());
        assert_eq!(report.of_kind(DiagnosticKind::OutputWriteFailure).count(), 1);
    }
}
