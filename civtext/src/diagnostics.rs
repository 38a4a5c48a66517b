//! Out-of-band reporting for recoverable problems.
//!
//! Parsing and document-wide operations never abort because of one bad entry.
//! Instead they hand a [`Diagnostic`] to the sink the caller passed in and
//! carry on with a degraded result.

use std::fmt::Display;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// How a diagnostic should be surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    #[default]
    Normal,
    Warning,
    Error,
    Success,
}

impl Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Severity::Normal => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Success => "OK",
        };
        f.write_str(label)
    }
}

/// A single time-stamped message produced by a document operation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Diagnostic {
    pub timestamp: DateTime<Local>,
    pub text: String,
    pub severity: Severity,
}

impl Diagnostic {
    pub fn new(text: impl Into<String>, severity: Severity) -> Self {
        Diagnostic {
            timestamp: Local::now(),
            text: text.into(),
            severity,
        }
    }

    pub fn normal(text: impl Into<String>) -> Self {
        Self::new(text, Severity::Normal)
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self::new(text, Severity::Warning)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(text, Severity::Error)
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self::new(text, Severity::Success)
    }

    /// Local wall-clock time as `HH:MM:SS`.
    pub fn timestamp_label(&self) -> String {
        self.timestamp.format("%H:%M:%S").to_string()
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {} {}",
            self.timestamp_label(),
            self.severity,
            self.text
        )
    }
}

/// Receiver for diagnostics.
///
/// Implementations must not panic; a sink is a plain synchronous callback and
/// has no say in the control flow of the operation reporting to it.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

impl<F> DiagnosticSink for F
where
    F: FnMut(&Diagnostic),
{
    fn report(&mut self, diagnostic: Diagnostic) {
        self(&diagnostic);
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn report(&mut self, _diagnostic: Diagnostic) {}
}

/// Forwards diagnostics to `tracing`, mapping severities to levels.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Error => tracing::error!(target: "civtext", "{}", diagnostic.text),
            Severity::Warning => tracing::warn!(target: "civtext", "{}", diagnostic.text),
            Severity::Normal | Severity::Success => {
                tracing::info!(target: "civtext", "{}", diagnostic.text)
            }
        }
    }
}

/// Returns `true` if any collected diagnostic has [`Severity::Error`].
pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(|d| d.severity == Severity::Error)
}
