//! A whole `Civ4GameText` document.
//!
//! [`Document`] owns every [`Entry`] keyed by its tag, in document order, plus
//! the surrounding markup (declaration, comments, unknown elements) so the
//! file can be written back with nothing but the entries changed.
//!
//! All operations here are batch operations over hundreds of entries. They
//! never fail because of a single bad entry; problems are reported to the
//! [`DiagnosticSink`] passed in and the operation continues.

use std::path::Path;

use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::{
    diagnostics::{Diagnostic, DiagnosticSink},
    encoding,
    entry::{ENTRY_ELEMENT, Entry, LanguageValue, is_valid_language_name},
    error::Error,
    options::{ReadOptions, WriteOptions},
    xml::{self, Declaration, Element, Node, XmlTree},
};

/// Name of the document root element.
pub const ROOT_ELEMENT: &str = "Civ4GameText";
/// Preferred source when a missing language has to be filled in.
pub const DEFAULT_LANGUAGE: &str = "English";
/// Conventional prefix of every entry key.
pub const KEY_PREFIX: &str = "TXT_KEY_";

lazy_static! {
    static ref KEY_PREFIX_REGEX: Regex = Regex::new(&format!("(?i)^{}", KEY_PREFIX)).unwrap();
    static ref WORD_SEPARATOR_REGEX: Regex = Regex::new(r"[_\-\s]+").unwrap();
}

/// A position among the root's children.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Slot {
    /// Markup that is not an entry; written back unchanged.
    Node(Node),
    /// The entry with this tag.
    Entry(String),
}

/// A key that occurred more than once in the source.
///
/// The first occurrence is the one kept in [`Document::entries`]; later ones
/// are listed here and left out of the serialized output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Duplicate {
    pub tag: String,
    pub discarded: Vec<Entry>,
}

/// Outcome of [`Document::import_from`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ImportReport {
    /// Languages present in both documents; empty when the import was refused.
    pub common_languages: Vec<String>,
    /// Entries that received at least one new value.
    pub updated_entries: usize,
    /// Individual language values overwritten.
    pub updated_values: usize,
    /// Values that were already identical.
    pub unchanged_values: usize,
    /// Tags only present in the source document.
    pub skipped_tags: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    declaration: Option<Declaration>,
    prolog: Vec<Node>,
    root: Element,
    body: Vec<Slot>,
    epilog: Vec<Node>,
    entries: IndexMap<String, Entry>,
    duplicates: Vec<Duplicate>,
    namespace: Option<String>,
}

impl Document {
    /// Parses document text.
    ///
    /// Only malformed XML, a root other than `Civ4GameText`, or a `<TEXT>`
    /// entry without a key is an error. Duplicate keys and language scheme
    /// mismatches are reported to `sink`.
    pub fn parse(source: &str, sink: &mut dyn DiagnosticSink) -> Result<Self, Error> {
        let tree = XmlTree::parse(source)?;
        Self::from_tree(tree, sink)
    }

    /// Decodes raw file bytes (see [`encoding::decode_bytes`]) and parses them.
    pub fn from_bytes(
        bytes: &[u8],
        options: &ReadOptions,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<Self, Error> {
        let text = encoding::decode_bytes(bytes, options, sink)?;
        if options.wrap_fragments {
            Self::parse(&encoding::wrap_as_game_text(&text), sink)
        } else {
            Self::parse(&text, sink)
        }
    }

    /// Reads and parses a file.
    pub fn read_from<P: AsRef<Path>>(
        path: P,
        options: &ReadOptions,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<Self, Error> {
        let bytes = std::fs::read(path).map_err(Error::Io)?;
        Self::from_bytes(&bytes, options, sink)
    }

    /// Builds a document from an already parsed tree.
    pub fn from_tree(tree: XmlTree, sink: &mut dyn DiagnosticSink) -> Result<Self, Error> {
        let XmlTree {
            declaration,
            prolog,
            mut root,
            epilog,
        } = tree;

        if root.local_name() != ROOT_ELEMENT {
            return Err(Error::invalid_document(format!(
                "expected a <{}> root element, found <{}>",
                ROOT_ELEMENT, root.name
            )));
        }
        let namespace = root.attribute("xmlns").map(str::to_string);
        let children = std::mem::take(&mut root.children);

        let mut document = Document {
            declaration,
            prolog,
            root,
            body: Vec::with_capacity(children.len()),
            epilog,
            entries: IndexMap::new(),
            duplicates: Vec::new(),
            namespace,
        };

        let mut reference_scheme: Option<Vec<String>> = None;
        let mut has_scheme_error = false;

        for child in children {
            let element = match child {
                Node::Element(element) if element.local_name() == ENTRY_ELEMENT => element,
                other => {
                    document.body.push(Slot::Node(other));
                    continue;
                }
            };

            let entry = Entry::from_element(&element, document.namespace.as_deref())?;
            let tag = entry.tag().to_string();
            let scheme: Vec<String> = entry.languages().into_iter().map(str::to_string).collect();

            if document.entries.contains_key(&tag) {
                document.record_duplicate(entry, sink);
            } else {
                document.body.push(Slot::Entry(tag.clone()));
                document.entries.insert(tag.clone(), entry);
            }

            if scheme.is_empty() {
                sink.report(Diagnostic::warning(format!(
                    "Entry \"{}\" has no language tags.",
                    tag
                )));
                continue;
            }
            match &reference_scheme {
                None => reference_scheme = Some(scheme),
                Some(reference) if *reference != scheme => {
                    sink.report(Diagnostic::error(format!(
                        "Language scheme mismatch! Expected \"{}\", but found \"{}\" in entry \"{}\". \
                         Only one language scheme is allowed.",
                        reference.join(";"),
                        scheme.join(";"),
                        tag
                    )));
                    has_scheme_error = true;
                }
                Some(_) => {}
            }
        }

        match reference_scheme {
            None => sink.report(Diagnostic::warning(
                "No valid language scheme found in any entry.",
            )),
            Some(scheme) if !has_scheme_error => sink.report(Diagnostic::success(format!(
                "Validated: all entries use language scheme \"{}\".",
                scheme.join(";")
            ))),
            Some(_) => {}
        }

        tracing::debug!(
            entries = document.entries.len(),
            duplicates = document.duplicates.len(),
            "parsed game text document"
        );
        Ok(document)
    }

    fn record_duplicate(&mut self, entry: Entry, sink: &mut dyn DiagnosticSink) {
        match self.duplicates.iter_mut().find(|d| d.tag == entry.tag()) {
            Some(duplicate) => duplicate.discarded.push(entry),
            None => {
                sink.report(Diagnostic::warning(format!(
                    "Duplicate TXT_KEY found: \"{}\". Keeping first occurrence, all others will be discarded.",
                    entry.tag()
                )));
                self.duplicates.push(Duplicate {
                    tag: entry.tag().to_string(),
                    discarded: vec![entry],
                });
            }
        }
    }

    /// All entries keyed by tag, in document order.
    pub fn entries(&self) -> &IndexMap<String, Entry> {
        &self.entries
    }

    pub fn entry(&self, tag: &str) -> Option<&Entry> {
        self.entries.get(tag)
    }

    pub fn entry_mut(&mut self, tag: &str) -> Option<&mut Entry> {
        self.entries.get_mut(tag)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys that appeared more than once in the source, in first-seen order.
    pub fn duplicates(&self) -> &[Duplicate] {
        &self.duplicates
    }

    /// The `xmlns` declared on the root element.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// The sorted language set shared by every entry, or `None` if entries
    /// disagree or the document is empty.
    pub fn consistent_language_scheme(&self) -> Option<Vec<String>> {
        let mut entries = self.entries.values();
        let reference = sorted_languages(entries.next()?);
        entries
            .all(|entry| sorted_languages(entry) == reference)
            .then_some(reference)
    }

    /// The ordered language list shared by every entry, or `None` if any entry
    /// differs in content or order.
    pub fn language_scheme(&self) -> Option<Vec<String>> {
        let mut entries = self.entries.values();
        let reference = entries.next()?.languages();
        entries
            .all(|entry| entry.languages() == reference)
            .then(|| reference.into_iter().map(str::to_string).collect())
    }

    /// Tags whose ordered languages differ from the first entry that has any.
    /// Entries without languages are not compared.
    pub fn scheme_mismatches(&self) -> Vec<&str> {
        let mut with_languages = self.entries.values().filter(|e| !e.values().is_empty());
        let Some(reference) = with_languages.next().map(Entry::languages) else {
            return Vec::new();
        };
        with_languages
            .filter(|entry| entry.languages() != reference)
            .map(Entry::tag)
            .collect()
    }

    /// Entries containing `needle` in any language, ignoring case.
    pub fn search(&self, needle: &str) -> Vec<&Entry> {
        self.entries.values().filter(|e| e.has_text(needle)).collect()
    }

    /// Entries whose `first` and `second` languages hold identical text,
    /// which usually means `second` was never translated.
    pub fn untranslated(&self, first: &str, second: &str) -> Vec<&Entry> {
        self.entries
            .values()
            .filter(|e| e.has_equal_text(first, second))
            .collect()
    }

    /// Adds a new entry named `key` with every scheme language set to a
    /// readable text derived from the key.
    ///
    /// An existing key is left untouched and returned. Returns `None` only for
    /// a blank key.
    pub fn create_entry(&mut self, key: &str, sink: &mut dyn DiagnosticSink) -> Option<&mut Entry> {
        let key = key.trim();
        if key.is_empty() {
            sink.report(Diagnostic::error("Cannot create an entry with an empty TXT_KEY."));
            return None;
        }
        if let Some(index) = self.entries.get_index_of(key) {
            sink.report(Diagnostic::warning(format!(
                "Entry with TXT_KEY \"{}\" already exists.",
                key
            )));
            return Some(&mut self.entries[index]);
        }

        let scheme = self.creation_scheme();
        if scheme.is_empty() {
            sink.report(Diagnostic::warning(
                "No global language scheme found. Creating entry without languages.",
            ));
        }

        let display_text = display_text_from_key(key);
        let mut entry = Entry::new(key, self.namespace.clone());
        for language in &scheme {
            entry.set_language_data(language.as_str(), LanguageValue::new(display_text.as_str()));
        }

        sink.report(Diagnostic::success(format!(
            "Created new entry: \"{}\" with languages {}.",
            key,
            if scheme.is_empty() {
                "(none)".to_string()
            } else {
                scheme.join(", ")
            }
        )));

        self.body.push(Slot::Entry(key.to_string()));
        let (index, _) = self.entries.insert_full(key.to_string(), entry);
        Some(&mut self.entries[index])
    }

    /// Languages for a new entry: the first entry's order, provided every
    /// entry has the same language set.
    fn creation_scheme(&self) -> Vec<String> {
        if self.consistent_language_scheme().is_none() {
            return Vec::new();
        }
        self.entries
            .first()
            .map(|(_, entry)| entry.languages().into_iter().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Removes an entry and its place in the output.
    pub fn remove_entry(&mut self, tag: &str, sink: &mut dyn DiagnosticSink) -> Option<Entry> {
        let Some(entry) = self.entries.shift_remove(tag) else {
            sink.report(Diagnostic::warning(format!("Entry \"{}\" not found.", tag)));
            return None;
        };
        self.body
            .retain(|slot| !matches!(slot, Slot::Entry(existing) if existing == tag));
        sink.report(Diagnostic::normal(format!("Removed entry \"{}\".", tag)));
        Some(entry)
    }

    /// Adds `language` to every entry as a copy of `base`.
    ///
    /// Entries already holding `language` are left unchanged; entries missing
    /// `base` are reported and skipped. Returns the number of entries changed.
    pub fn add_language_to_all_entries(
        &mut self,
        language: &str,
        base: &str,
        sink: &mut dyn DiagnosticSink,
    ) -> usize {
        let language = language.trim();
        if language.is_empty() {
            sink.report(Diagnostic::error("Cannot add a language with an empty name."));
            return 0;
        }
        if !is_valid_language_name(language) {
            sink.report(Diagnostic::error(format!(
                "Invalid language name \"{}\"; nothing added.",
                language
            )));
            return 0;
        }

        let mut added = 0;
        let mut already_present = 0;
        for entry in self.entries.values_mut() {
            if entry.has_language(language) {
                already_present += 1;
                continue;
            }
            if entry.add_language(language, base, sink) {
                added += 1;
            }
        }

        if already_present > 0 {
            sink.report(Diagnostic::warning(format!(
                "Language \"{}\" already present in {} entries; left unchanged.",
                language, already_present
            )));
        }
        if added > 0 {
            sink.report(Diagnostic::success(format!(
                "Added language \"{}\" to {} entries (copied from \"{}\").",
                language, added, base
            )));
        }
        added
    }

    /// Copies translations from `other` into matching entries of this document.
    ///
    /// Only tags present in both documents and languages present in both
    /// schemes are touched, and a value is only overwritten when its text,
    /// gender or plural differs. An empty gender or plural counts as absent
    /// on both sides. Nothing is created.
    pub fn import_from(&mut self, other: &Document, sink: &mut dyn DiagnosticSink) -> ImportReport {
        let mut report = ImportReport::default();

        let (Some(target_languages), Some(source_languages)) = (
            self.consistent_language_scheme(),
            other.consistent_language_scheme(),
        ) else {
            sink.report(Diagnostic::error(
                "Cannot import: one of the documents has no valid language scheme.",
            ));
            return report;
        };

        let common: Vec<String> = target_languages
            .iter()
            .filter(|language| source_languages.contains(language))
            .cloned()
            .collect();
        if common.is_empty() {
            sink.report(Diagnostic::error(format!(
                "No common languages found between target [{}] and source [{}].",
                target_languages.join(", "),
                source_languages.join(", ")
            )));
            return report;
        }

        for (tag, source) in &other.entries {
            let Some(target) = self.entries.get_mut(tag) else {
                report.skipped_tags += 1;
                continue;
            };

            let mut modified = false;
            for language in &common {
                let Some(incoming) = source.language_data(language) else {
                    continue;
                };
                let incoming = incoming.clone().normalized();
                let current = target
                    .language_data(language)
                    .cloned()
                    .map(LanguageValue::normalized);
                if current.as_ref() == Some(&incoming) {
                    report.unchanged_values += 1;
                    continue;
                }
                target.set_language_data(language.as_str(), incoming);
                report.updated_values += 1;
                modified = true;
            }
            if modified {
                report.updated_entries += 1;
            }
        }

        tracing::debug!(?report, "imported translations");
        if report.updated_values > 0 {
            sink.report(Diagnostic::success(format!(
                "Imported {} values into {} entries (languages: {}).",
                report.updated_values,
                report.updated_entries,
                common.join(", ")
            )));
        } else {
            sink.report(Diagnostic::normal("Import found no differences."));
        }
        report.common_languages = common;
        report
    }

    /// Rewrites every entry to hold exactly `order`, in that order.
    ///
    /// Missing languages are cloned from the entry's English value, else its
    /// first language; languages not named in `order` are dropped. Returns
    /// `false`, changing nothing, if `order` is empty or names a language
    /// that cannot be written as an element.
    pub fn unify_language_order<S: AsRef<str>>(
        &mut self,
        order: &[S],
        sink: &mut dyn DiagnosticSink,
    ) -> bool {
        if order.is_empty() {
            sink.report(Diagnostic::error("Target language order cannot be empty."));
            return false;
        }

        let mut unique: Vec<&str> = Vec::with_capacity(order.len());
        for language in order {
            let language: &str = language.as_ref();
            if !unique.contains(&language) {
                unique.push(language);
            }
        }
        if let Some(invalid) = unique.iter().find(|language| !is_valid_language_name(language)) {
            sink.report(Diagnostic::error(format!(
                "Invalid language name \"{}\" in target order.",
                invalid
            )));
            return false;
        }
        if unique.len() != order.len() {
            sink.report(Diagnostic::warning(
                "Duplicate languages in target order; deduplicated.",
            ));
        }

        for entry in self.entries.values_mut() {
            let current = entry.values();
            let fallback = if current.contains_key(DEFAULT_LANGUAGE) {
                DEFAULT_LANGUAGE
            } else {
                current.keys().next().map_or(unique[0], String::as_str)
            };

            let mut languages = IndexMap::with_capacity(unique.len());
            for &language in &unique {
                let value = match current.get(language).or_else(|| current.get(fallback)) {
                    Some(value) => value.clone(),
                    None => {
                        sink.report(Diagnostic::warning(format!(
                            "Created empty entry for missing language \"{}\" in {}",
                            language,
                            entry.tag()
                        )));
                        LanguageValue::default()
                    }
                };
                languages.insert(language.to_string(), value);
            }
            entry.replace_values(languages);
        }

        sink.report(Diagnostic::success(format!(
            "Unified all entries to language order: {}",
            unique.join(";")
        )));
        true
    }

    /// Serializes with the default [`WriteOptions`].
    pub fn serialize(&self) -> Result<String, Error> {
        self.serialize_with(&WriteOptions::default())
    }

    /// Projects every entry back to XML, writes the tree and lays it out one
    /// tag per line.
    ///
    /// Fails if an entry holds a language name that is not a valid element
    /// name, since the output could not be parsed again.
    pub fn serialize_with(&self, options: &WriteOptions) -> Result<String, Error> {
        for entry in self.entries.values() {
            entry.check_language_names()?;
        }
        let compact = self.to_tree(options).to_compact_string()?;
        Ok(xml::pretty_print(&compact, options))
    }

    /// Serializes and writes to `path`.
    pub fn write_to<P: AsRef<Path>>(&self, path: P, options: &WriteOptions) -> Result<(), Error> {
        let text = self.serialize_with(options)?;
        std::fs::write(path, text).map_err(Error::Io)
    }

    /// Rebuilds the full XML tree from the current entries.
    pub fn to_tree(&self, options: &WriteOptions) -> XmlTree {
        let mut root = self.root.clone();
        root.children = self
            .body
            .iter()
            .filter_map(|slot| match slot {
                Slot::Node(node) => Some(node.clone()),
                Slot::Entry(tag) => self
                    .entries
                    .get(tag)
                    .map(|entry| Node::Element(entry.to_fragment())),
            })
            .collect();

        XmlTree {
            declaration: self
                .declaration
                .clone()
                .map(|declaration| normalize_declaration(declaration, options)),
            prolog: self.prolog.clone(),
            root,
            epilog: self.epilog.clone(),
        }
    }

    /// All entries as pretty JSON, with decoded values.
    pub fn to_json(&self) -> Result<String, Error> {
        let entries: Vec<&Entry> = self.entries.values().collect();
        Ok(serde_json::to_string_pretty(&entries)?)
    }
}

/// The output is always UTF-8 text, whatever the source declared.
fn normalize_declaration(mut declaration: Declaration, options: &WriteOptions) -> Declaration {
    if let Some(encoding) = &declaration.encoding
        && !encoding.eq_ignore_ascii_case(&options.declaration_encoding)
    {
        declaration.encoding = Some(options.declaration_encoding.clone());
    }
    declaration
}

fn sorted_languages(entry: &Entry) -> Vec<String> {
    let mut languages: Vec<String> = entry.languages().into_iter().map(str::to_string).collect();
    languages.sort();
    languages
}

/// `TXT_KEY_LEADER_BARBARIAN` becomes `Leader Barbarian`.
pub fn display_text_from_key(key: &str) -> String {
    let without_prefix = KEY_PREFIX_REGEX.replace(key, "");
    WORD_SEPARATOR_REGEX
        .split(&without_prefix)
        .filter(|word| !word.is_empty())
        .map(title_case)
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
