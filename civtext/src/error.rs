//! All error types for the civtext crate.
//!
//! Only structural problems are errors. Duplicate keys, language scheme
//! mismatches and similar anomalies are reported through a
//! [`DiagnosticSink`](crate::diagnostics::DiagnosticSink) instead.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("XML parse error: {0}")]
    XmlParse(#[from] quick_xml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid document: {0}")]
    InvalidDocument(String),

    #[error("invalid entry: {0}")]
    InvalidEntry(String),

    #[error("unsupported encoding: {0}")]
    UnsupportedEncoding(String),
}

impl Error {
    /// Creates a new invalid document error
    pub fn invalid_document(message: impl Into<String>) -> Self {
        Error::InvalidDocument(message.into())
    }

    /// Creates a new invalid entry error
    pub fn invalid_entry(message: impl Into<String>) -> Self {
        Error::InvalidEntry(message.into())
    }
}
