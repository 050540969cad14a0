//! Tokenizers for corpus output
//!
//! Every accepted pair is written twice: as extracted, and tokenized into
//! space-separated tokens for MT training. Tokenization is chosen per
//! language through a [`TokenizerRegistry`]:
//!
//! 1. **Boundary tokenizer** - splits at word boundaries; the default for
//!    any language without a registered tokenizer
//! 2. **Japanese tokenizer** - dictionary-based segmentation for text
//!    without spaces between words (feature `japanese`)
//!
//! Both run the same post-processing: markup is stripped (or glommed back
//! into tag tokens with [`TagMode::Glom`]), URLs and email addresses are
//! glommed into single tokens, blank tokens are dropped and the rest are
//! joined with single spaces.
//!
//! # Example
//!
//! ```ignore
//! use tmx_corpus::tokenizer::{TokenizerRegistry, TagMode};
//!
//! let registry = TokenizerRegistry::with_defaults(TagMode::Strip)?;
//! assert_eq!(registry.tokenize("en", "Hello, world!")?, "Hello ,  world !");
//! ```
pub mod boundary;
pub mod glom;
#[cfg(feature = "japanese")]
pub mod japanese;

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{CorpusError, CorpusResult};
use crate::lang::normalize_lang;

pub use boundary::{BoundaryTokenizer, boundary_pieces};
pub use glom::{glom_multitags, glom_tags, glom_urls, is_tag, strip_tags};
#[cfg(feature = "japanese")]
pub use japanese::JapaneseTokenizer;

/// Tokenizes text for one language
pub trait Tokenizer {
    /// Language code this tokenizer is registered under (e.g. "en", "ja")
    fn language(&self) -> &str;

    /// Tokenize text into a single line of space-separated tokens
    fn tokenize(&self, text: &str) -> CorpusResult<String>;
}

/// How inline markup in segment text is handled before tokenizing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagMode {
    /// Remove tags before tokenizing, so they never reach the token stream
    #[default]
    Strip,
    /// Keep tags, reassembling them into single tokens after splitting
    Glom,
}

impl FromStr for TagMode {
    type Err = CorpusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strip" => Ok(TagMode::Strip),
            "glom" => Ok(TagMode::Glom),
            other => Err(CorpusError::Config(format!(
                "unknown tag mode '{}', expected 'strip' or 'glom'",
                other
            ))),
        }
    }
}

impl fmt::Display for TagMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagMode::Strip => write!(f, "strip"),
            TagMode::Glom => write!(f, "glom"),
        }
    }
}

pub(crate) fn prepare(text: &str, tag_mode: TagMode) -> Cow<'_, str> {
    match tag_mode {
        TagMode::Strip => Cow::Owned(strip_tags(text)),
        TagMode::Glom => Cow::Borrowed(text),
    }
}

/// Shared post-processing for raw tokenizer pieces
///
/// Pieces may still contain whitespace-only entries; they end URL runs and
/// are dropped before joining.
pub(crate) fn assemble(pieces: Vec<String>, tag_mode: TagMode) -> String {
    let tokens = match tag_mode {
        TagMode::Glom => glom_tags(pieces),
        TagMode::Strip => pieces,
    };
    glom_urls(tokens)
        .into_iter()
        .filter(|token| !token.trim().is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Tokenizers keyed by language code, with a fallback for everything else
pub struct TokenizerRegistry {
    tokenizers: HashMap<String, Box<dyn Tokenizer>>,
    default: Box<dyn Tokenizer>,
}

impl TokenizerRegistry {
    pub fn new(default: Box<dyn Tokenizer>) -> Self {
        Self {
            tokenizers: HashMap::new(),
            default,
        }
    }

    /// Registry with the built-in tokenizers for the given tag mode
    ///
    /// The boundary tokenizer is the default; with the `japanese` feature a
    /// dictionary tokenizer is registered for `ja`.
    ///
    /// # Errors
    ///
    /// Fails if the segmentation dictionary cannot be loaded.
    pub fn with_defaults(tag_mode: TagMode) -> CorpusResult<Self> {
        #[allow(unused_mut)]
        let mut registry = Self::new(Box::new(
            BoundaryTokenizer::default().with_tag_mode(tag_mode),
        ));
        #[cfg(feature = "japanese")]
        registry.register(Box::new(JapaneseTokenizer::new()?.with_tag_mode(tag_mode)));
        Ok(registry)
    }

    /// Register a tokenizer under its (normalized) language code, replacing
    /// any earlier one for that language
    pub fn register(&mut self, tokenizer: Box<dyn Tokenizer>) -> &mut Self {
        self.tokenizers
            .insert(normalize_lang(tokenizer.language()), tokenizer);
        self
    }

    pub fn get(&self, language: &str) -> &dyn Tokenizer {
        self.tokenizers
            .get(language)
            .map(|t| t.as_ref())
            .unwrap_or(self.default.as_ref())
    }

    pub fn is_registered(&self, language: &str) -> bool {
        self.tokenizers.contains_key(language)
    }

    pub fn tokenize(&self, language: &str, text: &str) -> CorpusResult<String> {
        self.get(language).tokenize(text)
    }
}

impl Default for TokenizerRegistry {
    fn default() -> Self {
        Self::new(Box::new(BoundaryTokenizer::default()))
    }
}
