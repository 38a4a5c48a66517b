//! Shared plumbing for the subcommands: a diagnostic printer and document
//! load/write helpers.

use std::io::Write;

use civtext::{Diagnostic, DiagnosticSink, Document, ReadOptions, Severity, WriteOptions};

use crate::validation::{validate_file_path, validate_output_path};

/// Prints every diagnostic to stderr as `[HH:MM:SS] SEVERITY text` and keeps
/// them for later inspection.
#[derive(Debug, Default)]
pub struct StderrSink {
    pub diagnostics: Vec<Diagnostic>,
    pub quiet: bool,
}

impl StderrSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects without printing; used when the report goes out as JSON.
    pub fn quiet() -> Self {
        Self {
            diagnostics: Vec::new(),
            quiet: true,
        }
    }

    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

impl DiagnosticSink for StderrSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        if !self.quiet {
            eprintln!("{}", diagnostic);
        }
        self.diagnostics.push(diagnostic);
    }
}

/// Reads and parses a game text file, reporting to `sink`.
pub fn load_document(
    path: &str,
    options: &ReadOptions,
    sink: &mut dyn DiagnosticSink,
) -> Result<Document, String> {
    validate_file_path(path)?;
    tracing::debug!(path, "loading game text");
    Document::read_from(path, options, sink).map_err(|e| format!("Failed to read {}: {}", path, e))
}

/// Writes `text` to `output`, or to stdout when no output path is given.
pub fn write_output(text: &str, output: &Option<String>) -> Result<(), String> {
    match output {
        Some(path) => {
            validate_output_path(path)?;
            std::fs::write(path, text).map_err(|e| format!("Error writing output {}: {}", path, e))
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", text).map_err(|e| format!("Error writing to stdout: {}", e))
        }
    }
}

/// Serializes `document` with the default layout and writes it out.
pub fn write_document(document: &Document, output: &Option<String>) -> Result<(), String> {
    let text = document
        .serialize_with(&WriteOptions::default())
        .map_err(|e| format!("Error serializing document: {}", e))?;
    write_output(&text, output)
}
