//! Language code handling
//!
//! TMX files label variants with anything from `EN` to `en-US` to `zh_CN`.
//! Output streams are keyed by a two-letter lowercase code, so every code
//! read from a document goes through [`normalize_lang`] first.

use icu_locale::Locale;

use crate::error::{CorpusError, CorpusResult};

/// Normalize a language code read from a TMX variant
///
/// Lowercases the code and, when the third character is a `-` or `_`
/// separator, drops everything from the separator on:
/// - `EN-us` → `en`
/// - `pt_BR` → `pt`
/// - `JA` → `ja`
/// - `fil` → `fil` (unchanged, no separator at index 2)
///
/// # Example
///
/// ```ignore
/// assert_eq!(normalize_lang("zh_CN"), "zh");
/// ```
pub fn normalize_lang(lang: &str) -> String {
    let lower = lang.to_lowercase();
    match lower.chars().nth(2) {
        Some('-') | Some('_') => lower.chars().take(2).collect(),
        _ => lower,
    }
}

/// Parse a user-supplied language code into the key used for output streams
///
/// Accepts BCP 47 locales (`en-US`, `zh-Hant-TW`) as well as the underscore
/// form common in TMX headers (`pt_BR`). The result is the normalized
/// language subtag, comparable with codes produced by [`normalize_lang`].
///
/// # Errors
///
/// Returns `CorpusError::InvalidLanguage` if the code is not a valid locale.
pub fn parse_language(code: &str) -> CorpusResult<String> {
    let locale: Locale = code
        .trim()
        .replace('_', "-")
        .parse()
        .map_err(|e| CorpusError::InvalidLanguage(format!("'{}': {}", code, e)))?;
    Ok(normalize_lang(locale.id.language.as_str()))
}
