use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Error types for corpus conversion
///
/// These are failures that stop work on a whole document or a whole run.
/// Defects inside a single translation unit are not errors; see [`Rejection`].
#[derive(Debug, Error)]
pub enum CorpusError {
    /// Reading an input or writing an output file failed
    #[error("I/O error on '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The TMX document is not well-formed XML
    #[error("Malformed TMX '{}' at byte {position}: {message}", .path.display())]
    Xml {
        path: PathBuf,
        position: u64,
        message: String,
    },
    /// The word segmenter failed on a piece of text
    #[error("Segmentation error: {0}")]
    Segmentation(String),
    /// Configuration file could not be read or is invalid
    #[error("Invalid configuration: {0}")]
    Config(String),
    /// A language code given by the user could not be parsed
    #[error("Invalid language code: {0}")]
    InvalidLanguage(String),
    /// None of the given paths resolved to a TMX document
    #[error("No TMX files found. Please specify input files or paths.")]
    NoInput,
}

impl CorpusError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CorpusError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for corpus operations
pub type CorpusResult<T> = Result<T, CorpusError>;

/// Why a variant or a whole translation unit was dropped during extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Rejection {
    /// Variant carries neither `lang` nor `xml:lang`
    MissingLanguage,
    /// Variant has no `seg` child
    MissingSegment,
    /// Variant has more than one `seg` child
    AmbiguousSegment,
    /// Segment text is empty after cleaning
    BlankSegment,
    /// Unit did not end up with exactly two languages
    Arity(usize),
}

impl Rejection {
    /// Stable key used when counting rejections by reason
    pub fn key(&self) -> &'static str {
        match self {
            Rejection::MissingLanguage => "missing_language",
            Rejection::MissingSegment => "missing_segment",
            Rejection::AmbiguousSegment => "ambiguous_segment",
            Rejection::BlankSegment => "blank_segment",
            Rejection::Arity(_) => "arity",
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::MissingLanguage => write!(f, "TUV missing lang"),
            Rejection::MissingSegment => write!(f, "TUV missing seg"),
            Rejection::AmbiguousSegment => write!(f, "Multiple segs found in TUV"),
            Rejection::BlankSegment => write!(f, "TUV had blank seg"),
            Rejection::Arity(count) => write!(f, "TU had {} TUV(s)", count),
        }
    }
}
