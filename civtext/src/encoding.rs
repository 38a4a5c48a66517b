//! Turning raw file bytes into document text.
//!
//! Game text files come in UTF-8, UTF-16 with a BOM, or a single-byte
//! encoding named in the XML declaration (`ISO-8859-1` for most legacy
//! Russian files). Everything is decoded to UTF-8 before parsing.

use std::io::Read;

use encoding_rs::Encoding;
use indoc::formatdoc;
use lazy_static::lazy_static;
use regex::Regex;

use crate::{
    diagnostics::{Diagnostic, DiagnosticSink},
    error::Error,
    options::ReadOptions,
};

/// Namespace used when wrapping bare fragments.
pub const GAME_TEXT_NAMESPACE: &str = "http://www.firaxis.com";

/// How many leading bytes are inspected for an encoding declaration.
const PROLOG_SAMPLE_LEN: usize = 200;

lazy_static! {
    static ref ENCODING_DECLARATION_REGEX: Regex =
        Regex::new(r#"(?i)<\?xml[^>]*encoding\s*=\s*["']([^"']+)["']"#).unwrap();
}

/// Returns the encoding label from the `<?xml ...?>` declaration, if any.
///
/// Only the ASCII prefix of the input is inspected, which is enough for any
/// ASCII-compatible encoding.
pub fn declared_encoding(bytes: &[u8]) -> Option<String> {
    let sample: String = bytes
        .iter()
        .take(PROLOG_SAMPLE_LEN)
        .take_while(|&&b| b != 0 && b.is_ascii())
        .map(|&b| b as char)
        .collect();

    ENCODING_DECLARATION_REGEX
        .captures(&sample)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}

/// Picks the encoding for `bytes`: BOM first, then the declaration, then
/// [`ReadOptions::fallback_encoding`].
pub fn detect_encoding(
    bytes: &[u8],
    options: &ReadOptions,
    sink: &mut dyn DiagnosticSink,
) -> Result<&'static Encoding, Error> {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return Ok(encoding);
    }

    if let Some(label) = declared_encoding(bytes) {
        match Encoding::for_label(label.as_bytes()) {
            Some(encoding) => return Ok(encoding),
            None => sink.report(Diagnostic::warning(format!(
                "Unsupported XML encoding \"{}\", falling back to {}",
                label, options.fallback_encoding
            ))),
        }
    }

    Encoding::for_label(options.fallback_encoding.as_bytes())
        .ok_or_else(|| Error::UnsupportedEncoding(options.fallback_encoding.clone()))
}

/// Decodes `bytes` to a UTF-8 string.
///
/// Malformed sequences are replaced with U+FFFD rather than rejected.
pub fn decode_bytes(
    bytes: &[u8],
    options: &ReadOptions,
    sink: &mut dyn DiagnosticSink,
) -> Result<String, Error> {
    let encoding = detect_encoding(bytes, options, sink)?;
    tracing::debug!(encoding = encoding.name(), len = bytes.len(), "decoding document bytes");

    let mut decoder = encoding_rs_io::DecodeReaderBytesBuilder::new()
        .encoding(Some(encoding))
        .bom_override(true)
        .build(bytes);

    let mut decoded = String::new();
    decoder.read_to_string(&mut decoded).map_err(Error::Io)?;
    Ok(decoded)
}

/// Wraps bare `<TEXT>` markup in a `Civ4GameText` document.
///
/// Text that already opens with a `Civ4GameText` root and closes it at the
/// end is returned unchanged.
pub fn wrap_as_game_text(text: &str) -> String {
    if has_game_text_root(text) {
        return text.to_string();
    }
    formatdoc! {r#"
        <?xml version="1.0" encoding="UTF-8"?>
        <Civ4GameText xmlns="{namespace}">
        {body}
        </Civ4GameText>"#,
        namespace = GAME_TEXT_NAMESPACE,
        body = text.trim(),
    }
}

fn has_game_text_root(text: &str) -> bool {
    let head: String = text.chars().take(500).collect();
    head.contains("<Civ4GameText") && text.trim_end().ends_with("</Civ4GameText>")
}
