//! Japanese tokenizer
//!
//! Japanese does not separate words with spaces, so word boundaries come
//! from a morphological analyzer ([lindera] with the IPADIC dictionary)
//! instead of a boundary regex. The analyzer splits everything, including
//! URLs and markup, so input is cut into script runs first: whitespace is
//! kept as separator pieces, ASCII runs go through [`boundary_pieces`] and
//! only the remaining runs are segmented by the dictionary.

use lindera::dictionary::{DictionaryKind, load_dictionary_from_kind};
use lindera::mode::Mode;
use lindera::segmenter::Segmenter;
use lindera::tokenizer::Tokenizer as LinderaTokenizer;

use super::{TagMode, Tokenizer, assemble, boundary_pieces, prepare};
use crate::error::{CorpusError, CorpusResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Script {
    Space,
    Ascii,
    Other,
}

impl Script {
    fn of(c: char) -> Self {
        if c.is_whitespace() {
            Script::Space
        } else if c.is_ascii() {
            Script::Ascii
        } else {
            Script::Other
        }
    }
}

/// Split text into maximal runs of the same [`Script`]
fn script_runs(text: &str) -> Vec<(Script, &str)> {
    let mut runs = Vec::new();
    let mut chars = text.char_indices();
    let Some((_, first)) = chars.next() else {
        return runs;
    };
    let mut start = 0;
    let mut current = Script::of(first);
    for (index, c) in chars {
        let script = Script::of(c);
        if script != current {
            runs.push((current, &text[start..index]));
            start = index;
            current = script;
        }
    }
    runs.push((current, &text[start..]));
    runs
}

/// Dictionary-segmenting tokenizer for `ja`
///
/// The dictionary is loaded once in [`JapaneseTokenizer::new`] and shared by
/// every call to `tokenize`.
pub struct JapaneseTokenizer {
    segmenter: LinderaTokenizer,
    tag_mode: TagMode,
}

impl JapaneseTokenizer {
    /// Load the embedded IPADIC dictionary
    ///
    /// # Errors
    ///
    /// Returns `CorpusError::Segmentation` if the dictionary cannot be loaded.
    pub fn new() -> CorpusResult<Self> {
        let dictionary = load_dictionary_from_kind(DictionaryKind::IPADIC)
            .map_err(|e| CorpusError::Segmentation(format!("Failed to load IPADIC: {}", e)))?;
        let segmenter = Segmenter::new(Mode::Normal, dictionary, None);
        Ok(Self {
            segmenter: LinderaTokenizer::new(segmenter),
            tag_mode: TagMode::default(),
        })
    }

    pub fn with_tag_mode(mut self, tag_mode: TagMode) -> Self {
        self.tag_mode = tag_mode;
        self
    }

    fn segment(&self, text: &str) -> CorpusResult<Vec<String>> {
        let tokens = self
            .segmenter
            .tokenize(text)
            .map_err(|e| CorpusError::Segmentation(format!("'{}': {}", text, e)))?;
        Ok(tokens.iter().map(|token| token.text.to_string()).collect())
    }
}

impl Tokenizer for JapaneseTokenizer {
    fn language(&self) -> &str {
        "ja"
    }

    fn tokenize(&self, text: &str) -> CorpusResult<String> {
        let text = prepare(text, self.tag_mode);
        let mut pieces = Vec::new();
        for (script, run) in script_runs(&text) {
            match script {
                Script::Space => pieces.push(run.to_string()),
                Script::Ascii => pieces.extend(boundary_pieces(run).into_iter().map(str::to_string)),
                Script::Other => pieces.extend(self.segment(run)?),
            }
        }
        Ok(assemble(pieces, self.tag_mode))
    }
}
