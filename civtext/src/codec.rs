//! Legacy Cyrillic transcoding.
//!
//! Civilization IV ships without Cyrillic glyphs, so Russian text was
//! historically stored as the Latin-1 characters that share the code point of
//! the CP1251 letter (`É` for `Й`, `Ö` for `Ц`, ...). On disk those characters
//! are written as numeric character references (`&#201;`) so the file stays
//! ASCII. This module converts between the three representations:
//!
//! - [`decode`]: legacy Latin-1 characters (or their `&#NNN;` references) to
//!   real Cyrillic.
//! - [`encode`]: real Cyrillic to `&#NNN;` references, ready to be written into
//!   XML character data without further escaping.

use std::collections::HashMap;

use lazy_static::lazy_static;

/// The only language slot whose text goes through this codec.
pub const LEGACY_LANGUAGE: &str = "Russian";

const CYRILLIC: &str = "ЙЦУКЕНГШЩЗХЪФЫВАПРОЛДЖЭЯЧСМИТЬБЮйцукенгшщзхъфывапролджэячсмитьбю";

const REFERENCES: &str = concat!(
    "&#201;&#214;&#211;&#202;&#197;&#205;&#195;&#216;&#217;&#199;&#213;&#218;&#212;&#219;&#194;&#192;",
    "&#207;&#208;&#206;&#203;&#196;&#198;&#221;&#223;&#215;&#209;&#204;&#200;&#210;&#220;&#193;&#222;",
    "&#233;&#246;&#243;&#234;&#229;&#237;&#227;&#248;&#249;&#231;&#245;&#250;&#244;&#251;&#226;&#224;",
    "&#239;&#240;&#238;&#235;&#228;&#230;&#253;&#255;&#247;&#241;&#236;&#232;&#242;&#252;&#225;&#254;",
);

const LEGACY: &str = "ÉÖÓÊÅÍÃØÙÇÕÚÔÛÂÀÏÐÎËÄÆÝß×ÑÌÈÒÜÁÞéöóêåíãøùçõúôûâàïðîëäæýÿ÷ñìèòüáþ";

/// Every reference token is `&#NNN;`.
const REFERENCE_LEN: usize = 6;

struct Tables {
    legacy_to_cyrillic: HashMap<char, char>,
    cyrillic_to_reference: HashMap<char, &'static str>,
    reference_to_cyrillic: HashMap<&'static str, char>,
}

impl Tables {
    fn build() -> Self {
        let cyrillic: Vec<char> = CYRILLIC.chars().collect();
        let legacy: Vec<char> = LEGACY.chars().collect();
        let references: Vec<&'static str> = (0..REFERENCES.len() / REFERENCE_LEN)
            .map(|i| &REFERENCES[i * REFERENCE_LEN..(i + 1) * REFERENCE_LEN])
            .collect();

        debug_assert_eq!(cyrillic.len(), legacy.len());
        debug_assert_eq!(cyrillic.len(), references.len());

        let mut tables = Tables {
            legacy_to_cyrillic: HashMap::with_capacity(cyrillic.len()),
            cyrillic_to_reference: HashMap::with_capacity(cyrillic.len()),
            reference_to_cyrillic: HashMap::with_capacity(cyrillic.len()),
        };
        for ((&ru, &jav), &reference) in cyrillic.iter().zip(&legacy).zip(&references) {
            tables.legacy_to_cyrillic.insert(jav, ru);
            tables.cyrillic_to_reference.insert(ru, reference);
            tables.reference_to_cyrillic.insert(reference, ru);
        }
        tables
    }
}

lazy_static! {
    static ref TABLES: Tables = Tables::build();
}

/// Returns `true` when `language` is stored in the legacy encoding.
pub fn is_legacy_language(language: &str) -> bool {
    language == LEGACY_LANGUAGE
}

/// Converts legacy text to real Cyrillic.
///
/// Both the Latin-1 stand-in characters and literal `&#NNN;` tokens from the
/// legacy table are translated; everything else is copied unchanged.
pub fn decode(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(c) = rest.chars().next() {
        if c == '&'
            && let Some(ru) = rest
                .get(..REFERENCE_LEN)
                .and_then(|token| TABLES.reference_to_cyrillic.get(token))
        {
            result.push(*ru);
            rest = &rest[REFERENCE_LEN..];
            continue;
        }
        result.push(TABLES.legacy_to_cyrillic.get(&c).copied().unwrap_or(c));
        rest = &rest[c.len_utf8()..];
    }

    result
}

/// Converts Cyrillic text to legacy numeric character references.
///
/// Characters outside the table are copied unchanged. The output is meant to
/// be written as already-escaped XML character data.
pub fn encode(text: &str) -> String {
    let mut result = String::with_capacity(text.len() * 2);
    for c in text.chars() {
        match TABLES.cyrillic_to_reference.get(&c) {
            Some(reference) => result.push_str(reference),
            None => result.push(c),
        }
    }
    result
}
