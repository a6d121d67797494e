//! Language utilities for ISO language code handling
//!
//! The model services want ISO 639-1 tags ("ar", "en"), while users and
//! configuration files sometimes carry 639-2 codes ("ara", "fre").
//! Everything is funnelled through `isolang`.

use anyhow::{Result, anyhow};
use isolang::Language;

/// ISO 639-2/B codes that differ from their 639-2/T form
const BIBLIOGRAPHIC_CODES: &[(&str, &str)] = &[
    ("fre", "fra"),
    ("ger", "deu"),
    ("dut", "nld"),
    ("gre", "ell"),
    ("chi", "zho"),
    ("cze", "ces"),
    ("ice", "isl"),
    ("alb", "sqi"),
    ("arm", "hye"),
    ("baq", "eus"),
    ("bur", "mya"),
    ("per", "fas"),
    ("geo", "kat"),
    ("may", "msa"),
    ("mac", "mkd"),
    ("rum", "ron"),
    ("slo", "slk"),
    ("wel", "cym"),
];

/// Resolve a 2- or 3-letter code to a language
fn lookup(code: &str) -> Option<Language> {
    let normalized = code.trim().to_lowercase();
    match normalized.len() {
        2 => Language::from_639_1(&normalized),
        3 => {
            let terminological = BIBLIOGRAPHIC_CODES
                .iter()
                .find(|(b, _)| *b == normalized)
                .map_or(normalized.as_str(), |(_, t)| t);
            Language::from_639_3(terminological)
        }
        _ => None,
    }
}

/// Validate a language code, returning its ISO 639-1 form when one exists
/// and its ISO 639-2/T form otherwise
pub fn normalize_code(code: &str) -> Result<String> {
    let language = lookup(code).ok_or_else(|| anyhow!("Invalid language code: {}", code))?;
    Ok(language
        .to_639_1()
        .map(str::to_string)
        .unwrap_or_else(|| language.to_639_3().to_string()))
}

/// Check if two language codes refer to the same language
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    match (lookup(code1), lookup(code2)) {
        (Some(a), Some(b)) => a == b,
        _ => code1.trim().eq_ignore_ascii_case(code2.trim()),
    }
}

/// Get the English name of a language from its code
pub fn get_language_name(code: &str) -> Result<String> {
    lookup(code)
        .map(|language| language.to_name().to_string())
        .ok_or_else(|| anyhow!("Invalid language code: {}", code))
}
