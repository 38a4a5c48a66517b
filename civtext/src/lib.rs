#![forbid(unsafe_code)]
//! Toolkit for Civilization IV game-text XML files.
//!
//! A game-text file is a `Civ4GameText` root holding many `<TEXT>` entries,
//! each with a `<Tag>` key and one child per language. Russian text in these
//! files is traditionally stored in a legacy Latin-1 substitution encoding.
//!
//! # Quick Start
//!
//! ```rust
//! use civtext::{Diagnostic, Document};
//!
//! let xml = r#"<Civ4GameText xmlns="http://www.firaxis.com">
//!     <TEXT><Tag>TXT_KEY_CITY</Tag><English>City</English></TEXT>
//! </Civ4GameText>"#;
//!
//! let mut diagnostics: Vec<Diagnostic> = Vec::new();
//! let mut document = Document::parse(xml, &mut diagnostics)?;
//! document.add_language_to_all_entries("Russian", "English", &mut diagnostics);
//! document
//!     .entry_mut("TXT_KEY_CITY")
//!     .expect("entry exists")
//!     .set_content("Russian", "Город");
//!
//! let output = document.serialize()?;
//! assert!(output.contains("<Russian>&#195;&#238;&#240;&#238;&#228;</Russian>"));
//! # Ok::<(), civtext::Error>(())
//! ```
//!
//! # Features
//!
//! - Ordered, duplicate-aware parsing with language scheme validation
//! - Transparent decoding/encoding of legacy Russian text
//! - Entry creation, language cloning, language order unification
//! - Importing translations between documents
//! - Stable, line-per-tag serialization

pub mod codec;
pub mod diagnostics;
pub mod document;
pub mod encoding;
pub mod entry;
pub mod error;
pub mod options;
pub mod xml;

// Re-export most used types for easy consumption
pub use crate::{
    diagnostics::{Diagnostic, DiagnosticSink, NullSink, Severity, TracingSink},
    document::{Document, Duplicate, ImportReport},
    entry::{Entry, LanguageValue},
    error::Error,
    options::{ReadOptions, WriteOptions},
};
