//! Parallel corpus extraction from TMX translation memories
//!
//! Reads TMX documents, keeps translation units with exactly two languages
//! and writes each side both as raw text and as space-separated tokens:
//!
//! ```no_run
//! use tmx_corpus::{Config, FileOutput};
//!
//! let config = Config::default();
//! let mut output = FileOutput::new(&config.output_dir).with_prefix(&config.file_prefix);
//! let summary = tmx_corpus::convert(&["memories/"], &config, &mut output)?;
//! println!("{} pairs", summary.emitted);
//! # Ok::<(), tmx_corpus::CorpusError>(())
//! ```

pub mod config;
pub mod converter;
pub mod data;
pub mod discovery;
pub mod error;
pub mod extract;
pub mod filter;
pub mod lang;
pub mod output;
pub mod tokenizer;

#[cfg(test)]
mod integration_tests;

use std::path::Path;

pub use config::Config;
pub use converter::{Converter, RunSummary};
pub use data::{Bitext, Variant};
pub use discovery::collect_files;
pub use error::{CorpusError, CorpusResult, Rejection};
pub use extract::{ExtractStats, TmxReader, clean_text};
pub use filter::{BitextFilter, LanguageFilter, MaxTokensFilter};
pub use lang::{normalize_lang, parse_language};
pub use output::{BufferOutput, FileOutput, OutputSink, TOKENIZED_PREFIX};
pub use tokenizer::{TagMode, Tokenizer, TokenizerRegistry};

/// Convert every document found under `paths` into `output`
///
/// Directories are scanned for files with the configured extension. The
/// built-in tokenizers and the filters from `config` are applied.
///
/// # Errors
/// - `CorpusError::NoInput` when no documents are found
/// - Configuration errors (bad language codes, dictionary loading)
/// - Output write errors
///
/// Documents that fail to open or parse do not abort the run; they are listed
/// in [`RunSummary::failed_documents`].
pub fn convert<P: AsRef<Path>>(
    paths: &[P],
    config: &Config,
    output: &mut dyn OutputSink,
) -> CorpusResult<RunSummary> {
    let files = collect_files(paths, config.extension())?;
    if files.is_empty() {
        return Err(CorpusError::NoInput);
    }

    let tokenizers = TokenizerRegistry::with_defaults(config.tag_mode)?;
    let filters = config.filters()?;

    let mut converter = Converter::new(output).with_tokenizers(tokenizers);
    for filter in filters {
        converter.add_filter(filter);
    }
    converter.convert(&files)?;
    converter.finalize_run()
}
