//! Conversion settings
//!
//! Settings come from an optional JSON file and are then overridden by
//! command line flags. Every field has a default, so an empty object (or no
//! file at all) is a valid configuration:
//!
//! ```json
//! {
//!     "output_dir": "corpus",
//!     "file_prefix": "bitext",
//!     "extension": "tmx",
//!     "languages": ["en", "ja"],
//!     "tag_mode": "strip",
//!     "max_tokens": 80
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{CorpusError, CorpusResult};
use crate::filter::{BitextFilter, LanguageFilter, MaxTokensFilter};
use crate::tokenizer::TagMode;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory the corpus files are written to
    pub output_dir: PathBuf,
    /// File name prefix; streams are written to `<prefix>.<stream>`
    pub file_prefix: String,
    /// Extension of documents picked up when scanning directories
    pub extension: String,
    /// Only keep pairs whose languages are all in this list
    pub languages: Option<Vec<String>>,
    pub tag_mode: TagMode,
    /// Drop pairs with more words than this on either side
    pub max_tokens: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            file_prefix: "bitext".to_string(),
            extension: "tmx".to_string(),
            languages: None,
            tag_mode: TagMode::default(),
            max_tokens: None,
        }
    }
}

impl Config {
    /// Load settings from a JSON file
    ///
    /// # Errors
    /// - File read errors
    /// - Invalid JSON or unknown keys
    pub fn from_file(path: &Path) -> CorpusResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| CorpusError::io(path, e))?;
        Self::from_json(&content)
            .map_err(|e| CorpusError::Config(format!("'{}': {}", path.display(), e)))
    }

    pub fn from_json(json: &str) -> CorpusResult<Self> {
        serde_json::from_str(json).map_err(|e| CorpusError::Config(e.to_string()))
    }

    /// Extension without a leading dot, as compared against file names
    pub fn extension(&self) -> &str {
        self.extension.trim_start_matches('.')
    }

    /// Build the pair filters these settings ask for
    pub fn filters(&self) -> CorpusResult<Vec<Box<dyn BitextFilter>>> {
        let mut filters: Vec<Box<dyn BitextFilter>> = Vec::new();
        if let Some(languages) = &self.languages {
            filters.push(Box::new(LanguageFilter::new(languages.as_slice())?));
        }
        if let Some(max_tokens) = self.max_tokens {
            filters.push(Box::new(MaxTokensFilter::new(max_tokens)));
        }
        Ok(filters)
    }
}
