//! Options for reading documents from bytes and writing them back out.

/// Read behavior options for [`crate::Document`] byte/file loading APIs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOptions {
    /// Encoding label used when the input has neither a BOM nor an encoding
    /// declaration, or declares a label that is not recognized.
    pub fallback_encoding: String,
    /// Wraps input lacking a `Civ4GameText` root before parsing.
    pub wrap_fragments: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        ReadOptions {
            fallback_encoding: "utf-8".to_string(),
            wrap_fragments: false,
        }
    }
}

impl ReadOptions {
    /// Creates default read options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the fallback encoding label.
    pub fn with_fallback_encoding(mut self, label: impl Into<String>) -> Self {
        self.fallback_encoding = label.into();
        self
    }

    /// Enables/disables wrapping of bare `<TEXT>` fragments.
    pub fn with_wrap_fragments(mut self, wrap_fragments: bool) -> Self {
        self.wrap_fragments = wrap_fragments;
        self
    }
}

/// Layout options for [`crate::Document::serialize_with`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOptions {
    /// Prefix applied to every line after the first.
    pub indent: String,
    /// Separator inserted between adjacent tags.
    pub line_ending: String,
    /// Encoding name written into an existing XML declaration.
    ///
    /// This only changes the label. The serialized text is always UTF-8, and
    /// [`crate::Document::write_to`] writes it as UTF-8 bytes.
    pub declaration_encoding: String,
}

impl Default for WriteOptions {
    fn default() -> Self {
        WriteOptions {
            indent: "  ".to_string(),
            line_ending: "\r\n".to_string(),
            declaration_encoding: "UTF-8".to_string(),
        }
    }
}

impl WriteOptions {
    /// Creates default write options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the per-line indent.
    pub fn with_indent(mut self, indent: impl Into<String>) -> Self {
        self.indent = indent.into();
        self
    }

    /// Sets the line ending.
    pub fn with_line_ending(mut self, line_ending: impl Into<String>) -> Self {
        self.line_ending = line_ending.into();
        self
    }

    /// Sets the encoding label written into the XML declaration.
    pub fn with_declaration_encoding(mut self, label: impl Into<String>) -> Self {
        self.declaration_encoding = label.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_options_builder() {
        let options = ReadOptions::new()
            .with_fallback_encoding("windows-1252")
            .with_wrap_fragments(true);
        assert_eq!(options.fallback_encoding, "windows-1252");
        assert!(options.wrap_fragments);
    }

    #[test]
    fn test_write_options_defaults() {
        let options = WriteOptions::default();
        assert_eq!(options.indent, "  ");
        assert_eq!(options.line_ending, "\r\n");
        assert_eq!(options.declaration_encoding, "UTF-8");
    }

    #[test]
    fn test_write_options_builder() {
        let options = WriteOptions::new()
            .with_indent("\t")
            .with_line_ending("\n")
            .with_declaration_encoding("utf-8");
        assert_eq!(options.indent, "\t");
        assert_eq!(options.line_ending, "\n");
        assert_eq!(options.declaration_encoding, "utf-8");
    }
}
