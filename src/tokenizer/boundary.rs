use std::sync::LazyLock;

use regex::Regex;

use super::{TagMode, Tokenizer, assemble, prepare};
use crate::error::CorpusResult;

static BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b|\z").expect("boundary pattern is valid"));

/// Split text at every word boundary
///
/// Pieces are the spans between consecutive boundaries, so whitespace stays
/// attached to the punctuation next to it: `"Hello, world!"` becomes
/// `["Hello", ", ", "world", "!"]`. Concatenating the pieces gives back the
/// input.
pub fn boundary_pieces(text: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    for boundary in BOUNDARY.find_iter(text) {
        if boundary.start() > start {
            pieces.push(&text[start..boundary.start()]);
        }
        start = boundary.end();
    }
    pieces
}

/// Generic word-boundary tokenizer, the default for languages that
/// separate words with spaces
///
/// Pieces are joined with single spaces without trimming them, so a
/// punctuation piece that carries a space (`", "`) yields a double space in
/// the output: `"Hello, world!"` → `"Hello ,  world !"`. Existing corpora
/// built with this tokenizer depend on that spacing.
#[derive(Debug, Clone)]
pub struct BoundaryTokenizer {
    language: String,
    tag_mode: TagMode,
}

impl BoundaryTokenizer {
    pub fn new(language: &str) -> Self {
        Self {
            language: language.to_string(),
            tag_mode: TagMode::default(),
        }
    }

    pub fn with_tag_mode(mut self, tag_mode: TagMode) -> Self {
        self.tag_mode = tag_mode;
        self
    }
}

impl Default for BoundaryTokenizer {
    fn default() -> Self {
        Self::new("en")
    }
}

impl Tokenizer for BoundaryTokenizer {
    fn language(&self) -> &str {
        &self.language
    }

    fn tokenize(&self, text: &str) -> CorpusResult<String> {
        let text = prepare(text, self.tag_mode);
        let pieces = boundary_pieces(&text)
            .into_iter()
            .map(str::to_string)
            .collect();
        Ok(assemble(pieces, self.tag_mode))
    }
}
