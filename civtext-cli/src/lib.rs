//! CLI library for testing purposes

pub mod report;
pub mod validation;

pub use report::{StderrSink, load_document, write_document, write_output};
pub use validation::{parse_language_order, validate_file_path, validate_output_path};
