//! Language utilities for ISO language code handling.
//!
//! Provider language codes are BCP 47 like ("en", "pt-BR", "zh-Hans"). Only
//! the primary subtag is checked against ISO 639-1 (2-letter) and
//! ISO 639-2 (3-letter) codes.

use anyhow::{Result, anyhow};
use isolang::Language;

/// Return the lowercase primary subtag of a language tag
pub fn primary_subtag(code: &str) -> String {
    code.trim()
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_lowercase()
}

/// Resolve a language tag to its ISO 639 language
fn lookup(code: &str) -> Option<Language> {
    let primary = primary_subtag(code);
    match primary.len() {
        2 => Language::from_639_1(&primary),
        3 => Language::from_639_3(&primary).or_else(|| {
            // ISO 639-2/B codes that differ from 639-2/T
            let part2t = match primary.as_str() {
                "fre" => "fra",
                "ger" => "deu",
                "dut" => "nld",
                "gre" => "ell",
                "chi" => "zho",
                "cze" => "ces",
                "per" => "fas",
                "rum" => "ron",
                "slo" => "slk",
                "wel" => "cym",
                _ => return None,
            };
            Language::from_639_3(part2t)
        }),
        _ => None,
    }
}

/// Validate that a language tag has a known ISO 639 primary subtag
pub fn validate_language_code(code: &str) -> Result<()> {
    lookup(code)
        .map(|_| ())
        .ok_or_else(|| anyhow!("Invalid language code: {}", code))
}

/// Get the English language name from a code
pub fn get_language_name(code: &str) -> Result<String> {
    let lang = lookup(code).ok_or_else(|| anyhow!("Unknown language code: {}", code))?;
    Ok(lang.to_name().to_string())
}
