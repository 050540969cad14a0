//! Pair filters applied before tokenization
//!
//! A pair rejected by any filter is not written and counts as suppressed.

use std::collections::BTreeSet;

use crate::data::Bitext;
use crate::error::CorpusResult;
use crate::lang::parse_language;

pub trait BitextFilter {
    /// Whether the pair should be written to the corpus
    fn accepts(&self, bitext: &Bitext) -> bool;
}

/// Keeps pairs whose two languages are both in an allow-list
#[derive(Debug, Clone)]
pub struct LanguageFilter {
    languages: BTreeSet<String>,
}

impl LanguageFilter {
    /// Build from user-supplied codes such as `en-US` or `ja`
    ///
    /// # Errors
    ///
    /// Returns `CorpusError::InvalidLanguage` for a code that is not a
    /// valid locale.
    pub fn new<S: AsRef<str>>(codes: &[S]) -> CorpusResult<Self> {
        let languages = codes
            .iter()
            .map(|code| parse_language(code.as_ref()))
            .collect::<CorpusResult<BTreeSet<_>>>()?;
        Ok(Self { languages })
    }

    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.languages.iter().map(String::as_str)
    }
}

impl BitextFilter for LanguageFilter {
    fn accepts(&self, bitext: &Bitext) -> bool {
        bitext
            .languages()
            .iter()
            .all(|language| self.languages.contains(*language))
    }
}

/// Rejects pairs where either side has more whitespace-separated words than
/// the ceiling
#[derive(Debug, Clone, Copy)]
pub struct MaxTokensFilter {
    max_tokens: usize,
}

impl MaxTokensFilter {
    pub fn new(max_tokens: usize) -> Self {
        Self { max_tokens }
    }
}

impl BitextFilter for MaxTokensFilter {
    fn accepts(&self, bitext: &Bitext) -> bool {
        bitext
            .iter()
            .all(|variant| variant.text.split_whitespace().count() <= self.max_tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Variant;
    use crate::error::CorpusError;

    fn pair(a: (&str, &str), b: (&str, &str)) -> Bitext {
        Bitext::from_variants(vec![Variant::new(a.0, a.1), Variant::new(b.0, b.1)]).unwrap()
    }

    #[test]
    fn test_language_filter() {
        let filter = LanguageFilter::new(&["en-US", "ja"]).unwrap();
        assert_eq!(filter.languages().collect::<Vec<_>>(), vec!["en", "ja"]);
        assert!(filter.accepts(&pair(("ja", "世界"), ("en", "world"))));
        assert!(!filter.accepts(&pair(("fr", "monde"), ("en", "world"))));
    }

    #[test]
    fn test_language_filter_rejects_bad_code() {
        let result = LanguageFilter::new(&["en", "??"]);
        assert!(matches!(result, Err(CorpusError::InvalidLanguage(_))));
    }

    #[test]
    fn test_max_tokens_filter() {
        let filter = MaxTokensFilter::new(3);
        assert!(filter.accepts(&pair(("en", "one two three"), ("fr", "un deux trois"))));
        assert!(!filter.accepts(&pair(("en", "one two three four"), ("fr", "un"))));
    }
}
