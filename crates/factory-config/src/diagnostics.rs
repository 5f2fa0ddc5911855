//! Structured decode diagnostics.
//!
//! Decoders never stop at the first problem. Each one returns the value it
//! managed to build together with a [`Diagnostics`] collection, and callers
//! concatenate those collections in the order blocks were visited.

use serde::Serialize;
use std::fmt;
use std::ops::Deref;
use std::path::{Path, PathBuf};

use crate::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("Error"),
            Severity::Warning => f.write_str("Warning"),
        }
    }
}

/// Path to the block or attribute a diagnostic is about, e.g.
/// `stage "build" > run "test" > command`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subject(Vec<String>);

impl Subject {
    /// The top level of a file.
    pub fn root() -> Self {
        Self::default()
    }

    /// Extend the path with a plain segment such as an attribute name.
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    /// Extend the path with a block header, quoting its labels.
    pub fn block(&self, block: &hcl::Block) -> Self {
        let mut segment = block.identifier().to_string();
        for label in block.labels() {
            segment.push_str(&format!(" {:?}", label.as_str()));
        }
        self.child(segment)
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(" > "))
    }
}

impl Serialize for Subject {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A single error or warning produced while loading configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub summary: String,
    pub detail: String,
    /// Block/attribute path inside the file. `None` for file-level problems.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<Subject>,
    /// Originating file, set by the parser once the file is known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<PathBuf>,
}

impl Diagnostic {
    pub fn error(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            summary: summary.into(),
            detail: detail.into(),
            subject: None,
            filename: None,
        }
    }

    pub fn warning(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(summary, detail)
        }
    }

    /// Build an error diagnostic whose detail is the rendered error.
    pub fn from_error(summary: impl Into<String>, err: &ConfigError) -> Self {
        Self::error(summary, err.to_string())
    }

    pub fn with_subject(mut self, subject: &Subject) -> Self {
        if !subject.is_root() {
            self.subject = Some(subject.clone());
        }
        self
    }

    pub fn with_filename(mut self, filename: impl Into<PathBuf>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.summary)?;
        match (&self.filename, &self.subject) {
            (Some(filename), Some(subject)) => {
                write!(f, "\n  on {} ({})", filename.display(), subject)?
            }
            (Some(filename), None) => write!(f, "\n  on {}", filename.display())?,
            (None, Some(subject)) => write!(f, "\n  in {}", subject)?,
            (None, None) => {}
        }
        if !self.detail.is_empty() {
            write!(f, "\n\n  {}", self.detail)?;
        }
        Ok(())
    }
}

/// Ordered collection of diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.0.push(diagnostic);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.0.extend(other.0);
    }

    pub fn has_errors(&self) -> bool {
        self.0.iter().any(Diagnostic::is_error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter().filter(|d| d.is_error())
    }

    /// Attach `filename` to every diagnostic that does not name a file yet.
    pub fn with_filename(self, filename: &Path) -> Self {
        Self(
            self.0
                .into_iter()
                .map(|d| {
                    if d.filename.is_some() {
                        d
                    } else {
                        d.with_filename(filename)
                    }
                })
                .collect(),
        )
    }

    pub fn into_inner(self) -> Vec<Diagnostic> {
        self.0
    }
}

impl Deref for Diagnostics {
    type Target = [Diagnostic];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Diagnostic> for Diagnostics {
    fn from(diagnostic: Diagnostic) -> Self {
        Self(vec![diagnostic])
    }
}

impl FromIterator<Diagnostic> for Diagnostics {
    fn from_iter<I: IntoIterator<Item = Diagnostic>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, diagnostic) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("\n\n")?;
            }
            write!(f, "{}", diagnostic)?;
        }
        Ok(())
    }
}
