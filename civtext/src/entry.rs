//! A single `<TEXT>` entry: one key and its value in every language.

use std::fmt::Display;

use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
    codec,
    diagnostics::{Diagnostic, DiagnosticSink},
    error::Error,
    xml::{self, Element, Node},
};

/// Name of the element that wraps one entry.
pub const ENTRY_ELEMENT: &str = "TEXT";
/// Name of the child element holding the entry key.
pub const KEY_ELEMENT: &str = "Tag";

const TEXT_ELEMENT: &str = "Text";
const GENDER_ELEMENT: &str = "Gender";
const PLURAL_ELEMENT: &str = "Plural";

lazy_static! {
    static ref LANGUAGE_NAME_REGEX: Regex = Regex::new(r"^[\p{L}_][\p{L}\p{N}_.\-]*$").unwrap();
}

/// Whether `name` can be written as a language element.
///
/// It must be a plain XML name without a namespace prefix, and must not be
/// the key label `Tag`, which would be read back as the entry key.
pub fn is_valid_language_name(name: &str) -> bool {
    LANGUAGE_NAME_REGEX.is_match(name) && !name.eq_ignore_ascii_case(KEY_ELEMENT)
}

/// The value of one language inside an entry.
///
/// `gender` and `plural` decide the XML shape: with either present the
/// language is written as `<Text>`/`<Gender>`/`<Plural>` children, otherwise
/// as plain character data.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct LanguageValue {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub plural: Option<String>,
}

impl LanguageValue {
    pub fn new(text: impl Into<String>) -> Self {
        LanguageValue {
            text: text.into(),
            gender: None,
            plural: None,
        }
    }

    pub fn with_gender(mut self, gender: impl Into<String>) -> Self {
        self.gender = Some(gender.into());
        self
    }

    pub fn with_plural(mut self, plural: impl Into<String>) -> Self {
        self.plural = Some(plural.into());
        self
    }

    /// Whether the value needs the nested `<Text>`/`<Gender>`/`<Plural>` shape.
    pub fn has_qualifiers(&self) -> bool {
        self.gender.is_some() || self.plural.is_some()
    }

    /// Empty gender/plural become absent.
    pub(crate) fn normalized(self) -> Self {
        LanguageValue {
            text: self.text,
            gender: self.gender.filter(|g| !g.is_empty()),
            plural: self.plural.filter(|p| !p.is_empty()),
        }
    }
}

impl Display for LanguageValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text)?;
        if let Some(gender) = &self.gender {
            write!(f, " [gender: {}]", gender)?;
        }
        if let Some(plural) = &self.plural {
            write!(f, " [plural: {}]", plural)?;
        }
        Ok(())
    }
}

/// One localization key with its per-language values, in document order.
///
/// Values are always held in decoded form; the legacy Cyrillic encoding is
/// applied only when the entry is turned back into XML by [`Entry::to_fragment`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    tag: String,
    languages: IndexMap<String, LanguageValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<String>,
}

impl Entry {
    /// Creates an entry without languages.
    pub fn new(tag: impl Into<String>, namespace: Option<String>) -> Self {
        Entry {
            tag: tag.into(),
            languages: IndexMap::new(),
            namespace,
        }
    }

    /// Builds an entry from a `<TEXT>` element.
    ///
    /// Fails if the element is not a `<TEXT>` element or has no non-empty
    /// `<Tag>` child (matched case-insensitively). Every other child element
    /// is read as a language, accepting both the nested and the flat shape.
    pub fn from_element(element: &Element, namespace: Option<&str>) -> Result<Self, Error> {
        if element.local_name() != ENTRY_ELEMENT {
            return Err(Error::invalid_entry(format!(
                "expected a <{}> element, found <{}>",
                ENTRY_ELEMENT, element.name
            )));
        }

        let tag = element
            .find_child_ignore_case(KEY_ELEMENT)
            .map(|key| key.text_content().trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                Error::invalid_entry(format!(
                    "<{}> element is missing its <{}> child",
                    ENTRY_ELEMENT, KEY_ELEMENT
                ))
            })?;

        let mut languages = IndexMap::new();
        for child in element.child_elements() {
            if child.local_name().eq_ignore_ascii_case(KEY_ELEMENT) {
                continue;
            }
            let language = child.local_name().to_string();
            let value = parse_language_value(&language, child);
            languages.insert(language, value);
        }

        Ok(Entry {
            tag,
            languages,
            namespace: namespace.map(str::to_string),
        })
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Language names in order.
    pub fn languages(&self) -> Vec<&str> {
        self.languages.keys().map(String::as_str).collect()
    }

    /// All language values in order.
    pub fn values(&self) -> &IndexMap<String, LanguageValue> {
        &self.languages
    }

    pub fn values_mut(&mut self) -> &mut IndexMap<String, LanguageValue> {
        &mut self.languages
    }

    /// Replaces the whole language mapping, adopting its order.
    pub fn replace_values(&mut self, languages: IndexMap<String, LanguageValue>) {
        self.languages = languages;
    }

    pub fn has_language(&self, language: &str) -> bool {
        self.languages.contains_key(language)
    }

    /// Zero-based position of `language`, or `None` if absent.
    pub fn language_index(&self, language: &str) -> Option<usize> {
        self.languages.get_index_of(language)
    }

    pub fn language_data(&self, language: &str) -> Option<&LanguageValue> {
        self.languages.get(language)
    }

    /// Replaces the value of `language`, appending it if new.
    ///
    /// Empty gender/plural are stored as absent. The name is checked when the
    /// entry is serialized; see [`is_valid_language_name`].
    pub fn set_language_data(&mut self, language: impl Into<String>, value: LanguageValue) {
        self.languages.insert(language.into(), value.normalized());
    }

    pub fn content(&self, language: &str) -> Option<&str> {
        self.languages.get(language).map(|v| v.text.as_str())
    }

    pub fn gender(&self, language: &str) -> Option<&str> {
        self.languages.get(language).and_then(|v| v.gender.as_deref())
    }

    pub fn plural(&self, language: &str) -> Option<&str> {
        self.languages.get(language).and_then(|v| v.plural.as_deref())
    }

    /// Updates only the text of `language`.
    ///
    /// Russian text goes through the legacy codec when read back, and that
    /// codec also resolves literal `&#NNN;` tokens from its table. Russian
    /// text containing such a token, e.g. `&#201;`, is read back as the
    /// Cyrillic letter (`Й`).
    pub fn set_content(&mut self, language: &str, text: impl Into<String>) {
        let mut value = self.languages.get(language).cloned().unwrap_or_default();
        value.text = text.into();
        self.set_language_data(language, value);
    }

    /// Updates only the gender of `language`.
    pub fn set_gender(&mut self, language: &str, gender: impl Into<String>) {
        let mut value = self.languages.get(language).cloned().unwrap_or_default();
        value.gender = Some(gender.into());
        self.set_language_data(language, value);
    }

    /// Updates only the plural rule of `language`.
    pub fn set_plural(&mut self, language: &str, plural: impl Into<String>) {
        let mut value = self.languages.get(language).cloned().unwrap_or_default();
        value.plural = Some(plural.into());
        self.set_language_data(language, value);
    }

    /// Removes `language`, keeping the order of the others.
    pub fn remove_language(&mut self, language: &str) -> Option<LanguageValue> {
        self.languages.shift_remove(language)
    }

    /// Case-insensitive substring search over the text of every language.
    pub fn has_text(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.languages
            .values()
            .any(|value| value.text.to_lowercase().contains(&needle))
    }

    /// `true` only if both languages exist and their texts are identical.
    pub fn has_equal_text(&self, first: &str, second: &str) -> bool {
        match (self.languages.get(first), self.languages.get(second)) {
            (Some(a), Some(b)) => a.text == b.text,
            _ => false,
        }
    }

    /// Copies the value of `base` into `language`.
    ///
    /// Reports an error and returns `false` if `language` is not a valid
    /// element name or `base` is missing. An existing `language` is left
    /// unchanged and reported as a warning.
    pub fn add_language(
        &mut self,
        language: &str,
        base: &str,
        sink: &mut dyn DiagnosticSink,
    ) -> bool {
        if !is_valid_language_name(language) {
            sink.report(Diagnostic::error(format!(
                "Invalid language name \"{}\" for tag \"{}\"",
                language, self.tag
            )));
            return false;
        }
        if self.languages.contains_key(language) {
            sink.report(Diagnostic::warning(format!(
                "Language \"{}\" already exists for tag \"{}\"; left unchanged.",
                language, self.tag
            )));
            return false;
        }
        let Some(value) = self.languages.get(base).cloned() else {
            sink.report(Diagnostic::error(format!(
                "Base language \"{}\" not found for tag \"{}\"",
                base, self.tag
            )));
            return false;
        };
        self.languages.insert(language.to_string(), value);
        true
    }

    /// Projects the entry into a `<TEXT>` element: the key first, then one
    /// child per language in order. Legacy-language text is encoded here.
    pub fn to_fragment(&self) -> Element {
        let mut text = Element::new(ENTRY_ELEMENT);
        text.push_element(Element::with_text(KEY_ELEMENT, self.tag.as_str()));

        for (language, value) in &self.languages {
            let mut language_element = Element::new(language.as_str());
            let text_node = character_data(language, &value.text);

            if value.has_qualifiers() {
                let mut text_element = Element::new(TEXT_ELEMENT);
                text_element.children.extend(text_node);
                language_element.push_element(text_element);
                if let Some(gender) = &value.gender {
                    language_element.push_element(Element::with_text(GENDER_ELEMENT, gender.as_str()));
                }
                if let Some(plural) = &value.plural {
                    language_element.push_element(Element::with_text(PLURAL_ELEMENT, plural.as_str()));
                }
            } else {
                language_element.children.extend(text_node);
            }

            text.push_element(language_element);
        }

        text
    }

    /// Renders the entry as a standalone `<TEXT>` element, declaring its
    /// namespace when it has one.
    pub fn to_xml_string(&self) -> Result<String, Error> {
        self.check_language_names()?;
        let mut fragment = self.to_fragment();
        if let Some(namespace) = &self.namespace {
            fragment.set_attribute("xmlns", namespace.as_str());
        }
        xml::element_to_string(&fragment)
    }
}

impl Entry {
    /// Fails on the first language that cannot be written as an element.
    pub(crate) fn check_language_names(&self) -> Result<(), Error> {
        match self.languages.keys().find(|name| !is_valid_language_name(name)) {
            Some(name) => Err(Error::invalid_entry(format!(
                "entry \"{}\" has invalid language name \"{}\"",
                self.tag, name
            ))),
            None => Ok(()),
        }
    }
}

impl Display for Entry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entry {{ tag: {}, languages: [{}] }}", self.tag, self.languages().join(", "))
    }
}

fn parse_language_value(language: &str, element: &Element) -> LanguageValue {
    let text = element
        .find_child(TEXT_ELEMENT)
        .or_else(|| element.find_child(ENTRY_ELEMENT))
        .map_or_else(|| element.text_content(), Element::text_content);
    let text = if codec::is_legacy_language(language) {
        codec::decode(&text)
    } else {
        text
    };

    LanguageValue {
        text,
        gender: element.find_child(GENDER_ELEMENT).map(Element::text_content),
        plural: element.find_child(PLURAL_ELEMENT).map(Element::text_content),
    }
}

fn character_data(language: &str, text: &str) -> Option<Node> {
    if text.is_empty() {
        return None;
    }
    if codec::is_legacy_language(language) {
        let escaped = quick_xml::escape::escape(text);
        Some(Node::EscapedText(codec::encode(&escaped)))
    } else {
        Some(Node::Text(text.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::XmlTree;

    fn parse_entry(xml: &str) -> Result<Entry, Error> {
        let tree = XmlTree::parse(xml).unwrap();
        Entry::from_element(&tree.root, Some("http://www.firaxis.com"))
    }

    #[test]
    fn test_parse_nested_and_flat_shapes() {
        let entry = parse_entry(
            r#"<TEXT>
                <Tag>TXT_KEY_CITY</Tag>
                <English><Text>City</Text><Gender>Female</Gender><Plural>0:1</Plural></English>
                <French>Ville</French>
            </TEXT>"#,
        )
        .unwrap();

        assert_eq!(entry.tag(), "TXT_KEY_CITY");
        assert_eq!(entry.languages(), vec!["English", "French"]);
        assert_eq!(
            entry.language_data("English"),
            Some(&LanguageValue::new("City").with_gender("Female").with_plural("0:1"))
        );
        assert_eq!(entry.language_data("French"), Some(&LanguageValue::new("Ville")));
        assert_eq!(entry.namespace(), Some("http://www.firaxis.com"));
    }

    #[test]
    fn test_parse_accepts_uppercase_text_child() {
        let entry = parse_entry(
            "<TEXT><Tag>K</Tag><English><TEXT>Hi</TEXT><Gender>Male</Gender></English></TEXT>",
        )
        .unwrap();
        assert_eq!(entry.content("English"), Some("Hi"));
        assert_eq!(entry.gender("English"), Some("Male"));
        assert_eq!(entry.plural("English"), None);
    }

    #[test]
    fn test_tag_label_is_case_insensitive() {
        let entry = parse_entry("<TEXT><TAG>TXT_KEY_A</TAG><English>a</English></TEXT>").unwrap();
        assert_eq!(entry.tag(), "TXT_KEY_A");
        assert_eq!(entry.languages(), vec!["English"]);
    }

    #[test]
    fn test_russian_is_decoded_on_read() {
        let entry =
            parse_entry("<TEXT><Tag>K</Tag><Russian>&#207;&#240;&#232;&#226;&#229;&#242;</Russian></TEXT>")
                .unwrap();
        assert_eq!(entry.content("Russian"), Some("Привет"));
    }

    #[test]
    fn test_non_legacy_languages_are_not_decoded() {
        let entry = parse_entry("<TEXT><Tag>K</Tag><German>Grüße</German></TEXT>").unwrap();
        assert_eq!(entry.content("German"), Some("Grüße"));
    }

    #[test]
    fn test_wrong_container_is_fatal() {
        let result = parse_entry("<ENTRY><Tag>K</Tag></ENTRY>");
        assert!(matches!(result, Err(Error::InvalidEntry(_))));
    }

    #[test]
    fn test_missing_or_empty_tag_is_fatal() {
        assert!(matches!(
            parse_entry("<TEXT><English>x</English></TEXT>"),
            Err(Error::InvalidEntry(_))
        ));
        assert!(matches!(
            parse_entry("<TEXT><Tag></Tag><English>x</English></TEXT>"),
            Err(Error::InvalidEntry(_))
        ));
    }

    #[test]
    fn test_set_language_data_drops_empty_qualifiers() {
        let mut entry = Entry::new("K", None);
        entry.set_language_data(
            "English",
            LanguageValue {
                text: "Hello".to_string(),
                gender: Some(String::new()),
                plural: Some("1".to_string()),
            },
        );
        let value = entry.language_data("English").unwrap();
        assert_eq!(value.gender, None);
        assert_eq!(value.plural.as_deref(), Some("1"));
    }

    #[test]
    fn test_setters_keep_other_fields() {
        let mut entry = Entry::new("K", None);
        entry.set_content("English", "Hello");
        entry.set_gender("English", "Male");
        entry.set_plural("English", "0:1");
        entry.set_content("English", "Hi");
        assert_eq!(
            entry.language_data("English"),
            Some(&LanguageValue::new("Hi").with_gender("Male").with_plural("0:1"))
        );
    }

    #[test]
    fn test_has_text_checks_every_language() {
        let mut entry = Entry::new("K", None);
        entry.set_content("English", "Barbarian");
        entry.set_content("Russian", "Варвар");
        assert!(entry.has_text("barb"));
        assert!(entry.has_text("ВАРВ"));
        assert!(!entry.has_text("rome"));
    }

    #[test]
    fn test_has_equal_text() {
        let mut entry = Entry::new("K", None);
        entry.set_content("English", "Hello");
        assert!(!entry.has_equal_text("English", "Russian"));
        entry.set_content("Russian", "hello");
        assert!(!entry.has_equal_text("English", "Russian"));
        entry.set_content("Russian", "Hello");
        assert!(entry.has_equal_text("English", "Russian"));
    }

    #[test]
    fn test_add_language_copies_base() {
        let mut entry = Entry::new("K", None);
        entry.set_language_data("English", LanguageValue::new("Hi").with_gender("Male"));
        let mut sink: Vec<Diagnostic> = Vec::new();

        assert!(entry.add_language("German", "English", &mut sink));
        assert_eq!(entry.languages(), vec!["English", "German"]);
        assert_eq!(entry.language_data("German"), entry.language_data("English"));
        assert!(sink.is_empty());

        entry.set_content("German", "Hallo");
        assert_eq!(entry.content("English"), Some("Hi"));
    }

    #[test]
    fn test_add_language_missing_base_reports() {
        let mut entry = Entry::new("TXT_KEY_X", None);
        let mut sink: Vec<Diagnostic> = Vec::new();
        assert!(!entry.add_language("German", "English", &mut sink));
        assert!(entry.languages().is_empty());
        assert_eq!(sink.len(), 1);
        assert!(sink[0].text.contains("TXT_KEY_X"));
    }

    #[test]
    fn test_add_language_keeps_existing_value() {
        let mut entry = Entry::new("TXT_KEY_X", None);
        entry.set_content("English", "Hi");
        entry.set_content("German", "Hallo");
        let mut sink: Vec<Diagnostic> = Vec::new();

        assert!(!entry.add_language("German", "English", &mut sink));
        assert_eq!(entry.content("German"), Some("Hallo"));
        assert_eq!(sink.len(), 1);
        assert_eq!(sink[0].severity, crate::diagnostics::Severity::Warning);
    }

    #[test]
    fn test_add_language_rejects_invalid_name() {
        let mut entry = Entry::new("TXT_KEY_X", None);
        entry.set_content("English", "Hi");
        let mut sink: Vec<Diagnostic> = Vec::new();

        assert!(!entry.add_language("Rus sian", "English", &mut sink));
        assert!(!entry.add_language("tag", "English", &mut sink));
        assert_eq!(entry.languages(), vec!["English"]);
        assert_eq!(sink.len(), 2);
        assert_eq!(sink[0].severity, crate::diagnostics::Severity::Error);
    }

    #[test]
    fn test_is_valid_language_name() {
        assert!(is_valid_language_name("English"));
        assert!(is_valid_language_name("Pt-Br"));
        assert!(is_valid_language_name("Русский"));
        assert!(!is_valid_language_name(""));
        assert!(!is_valid_language_name("Rus sian"));
        assert!(!is_valid_language_name("1Russian"));
        assert!(!is_valid_language_name("ns:English"));
        assert!(!is_valid_language_name("<English>"));
        assert!(!is_valid_language_name("TAG"));
    }

    #[test]
    fn test_to_xml_string_rejects_invalid_language_name() {
        let mut entry = Entry::new("K", None);
        entry.set_content("Rus sian", "x");
        assert!(matches!(entry.to_xml_string(), Err(Error::InvalidEntry(_))));
    }

    #[test]
    fn test_literal_legacy_reference_reads_back_as_cyrillic() {
        let mut entry = Entry::new("K", None);
        entry.set_content("Russian", "Use &#201; literally");
        entry.set_content("English", "Use &#201; literally");

        let reparsed = parse_entry(&entry.to_xml_string().unwrap()).unwrap();
        assert_eq!(reparsed.content("Russian"), Some("Use Й literally"));
        assert_eq!(reparsed.content("English"), Some("Use &#201; literally"));
    }

    #[test]
    fn test_language_index() {
        let mut entry = Entry::new("K", None);
        entry.set_content("English", "a");
        entry.set_content("Russian", "b");
        assert_eq!(entry.language_index("English"), Some(0));
        assert_eq!(entry.language_index("Russian"), Some(1));
        assert_eq!(entry.language_index("German"), None);

        entry.remove_language("English");
        assert_eq!(entry.language_index("Russian"), Some(0));
    }

    #[test]
    fn test_to_fragment_shapes() {
        let mut entry = Entry::new("TXT_KEY_A", None);
        entry.set_language_data("English", LanguageValue::new("One").with_plural("0:1"));
        entry.set_content("French", "Un & deux");
        entry.set_content("German", "");

        let xml = xml::element_to_string(&entry.to_fragment()).unwrap();
        assert_eq!(
            xml,
            "<TEXT><Tag>TXT_KEY_A</Tag><English><Text>One</Text><Plural>0:1</Plural></English>\
             <French>Un &amp; deux</French><German/></TEXT>"
        );
    }

    #[test]
    fn test_to_fragment_encodes_russian_only() {
        let mut entry = Entry::new("K", None);
        entry.set_content("Russian", "Да <да>");
        entry.set_content("English", "Да");
        let xml = xml::element_to_string(&entry.to_fragment()).unwrap();
        assert_eq!(
            xml,
            "<TEXT><Tag>K</Tag><Russian>&#196;&#224; &lt;&#228;&#224;&gt;</Russian><English>Да</English></TEXT>"
        );
    }

    #[test]
    fn test_fragment_round_trip() {
        let mut entry = Entry::new("K", Some("http://www.firaxis.com".to_string()));
        entry.set_language_data("English", LanguageValue::new("Rome").with_gender("Female"));
        entry.set_content("Russian", "Рим");

        let xml = entry.to_xml_string().unwrap();
        assert!(xml.starts_with("<TEXT xmlns=\"http://www.firaxis.com\">"));
        let reparsed = parse_entry(&xml).unwrap();
        assert_eq!(reparsed, entry);
    }
}
