//! Core data structures for bilingual extraction
//!
//! A TMX translation unit (`<tu>`) holds one variant (`<tuv>`) per language.
//! Only units that reduce to exactly two languages become a [`Bitext`].

use serde::Serialize;

/// One language's text within a translation unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Variant {
    /// Normalized two-letter language code (e.g. "en", "ja")
    pub language: String,
    /// Flattened, cleaned segment text
    pub text: String,
}

impl Variant {
    pub fn new(language: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            text: text.into(),
        }
    }
}

/// An accepted bilingual pair
///
/// Invariant: exactly two variants with distinct language codes and
/// non-blank text. Construct through [`Bitext::from_variants`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bitext {
    variants: [Variant; 2],
}

impl Bitext {
    /// Build a pair from collected variants
    ///
    /// Returns `Err(count)` with the number of variants when the input does
    /// not hold exactly two distinct languages.
    pub fn from_variants(variants: Vec<Variant>) -> Result<Self, usize> {
        let count = variants.len();
        let [first, second]: [Variant; 2] = variants.try_into().map_err(|_| count)?;
        if first.language == second.language {
            return Err(1);
        }
        Ok(Self {
            variants: [first, second],
        })
    }

    /// Language codes in document order
    pub fn languages(&self) -> [&str; 2] {
        [&self.variants[0].language, &self.variants[1].language]
    }

    /// Text for the given language, if present in this pair
    pub fn text(&self, language: &str) -> Option<&str> {
        self.variants
            .iter()
            .find(|v| v.language == language)
            .map(|v| v.text.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Variant> {
        self.variants.iter()
    }
}

/// Collects variants of one unit keyed by language
///
/// A later variant with an already-seen language replaces the earlier text
/// but keeps the earlier position.
#[derive(Debug, Default)]
pub(crate) struct VariantSet {
    variants: Vec<Variant>,
}

impl VariantSet {
    pub(crate) fn insert(&mut self, variant: Variant) -> bool {
        if let Some(existing) = self
            .variants
            .iter_mut()
            .find(|v| v.language == variant.language)
        {
            existing.text = variant.text;
            return true;
        }
        self.variants.push(variant);
        false
    }

    pub(crate) fn len(&self) -> usize {
        self.variants.len()
    }

    pub(crate) fn into_bitext(self) -> Result<Bitext, usize> {
        Bitext::from_variants(self.variants)
    }
}
