//! Conversion pipeline
//!
//! extraction → filtering → tokenization → output
//!
//! A [`Converter`] owns the running counters and borrows the output sink for
//! one run. The sink is finalized by [`Converter::finalize_run`], or on drop
//! if the run ends early with an error.

use std::io::Read;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{error, info, warn};

use crate::data::Bitext;
use crate::error::{CorpusError, CorpusResult};
use crate::extract::{ExtractStats, TmxReader};
use crate::filter::BitextFilter;
use crate::output::{OutputSink, tokenized_stream};
use crate::tokenizer::{Tokenizer, TokenizerRegistry};

/// Totals for one conversion run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Documents read to the end or until they failed
    pub documents: usize,
    /// Documents that could not be opened or parsed
    pub failed_documents: Vec<PathBuf>,
    /// Pairs written to the output
    pub emitted: usize,
    /// Pairs not written: malformed units, filtered and untokenizable pairs
    pub suppressed: usize,
    /// Pairs rejected by a filter
    pub filtered: usize,
    /// Extraction counters summed over all documents
    pub extraction: ExtractStats,
}

pub struct Converter<'a> {
    output: &'a mut dyn OutputSink,
    tokenizers: TokenizerRegistry,
    filters: Vec<Box<dyn BitextFilter>>,
    summary: RunSummary,
    finalized: bool,
}

impl<'a> Converter<'a> {
    /// Converter with the default tokenizer only and no filters
    pub fn new(output: &'a mut dyn OutputSink) -> Self {
        Self {
            output,
            tokenizers: TokenizerRegistry::default(),
            filters: Vec::new(),
            summary: RunSummary::default(),
            finalized: false,
        }
    }

    pub fn with_tokenizers(mut self, tokenizers: TokenizerRegistry) -> Self {
        self.tokenizers = tokenizers;
        self
    }

    pub fn add_tokenizer(&mut self, tokenizer: Box<dyn Tokenizer>) -> &mut Self {
        self.tokenizers.register(tokenizer);
        self
    }

    pub fn add_filter(&mut self, filter: Box<dyn BitextFilter>) -> &mut Self {
        self.filters.push(filter);
        self
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    /// Reset the counters for a new run
    pub fn start_run(&mut self) {
        self.summary = RunSummary::default();
        self.finalized = false;
    }

    /// Convert the given documents in order
    ///
    /// A document that cannot be opened or parsed is logged, recorded in
    /// [`RunSummary::failed_documents`] and skipped; pairs read from it
    /// before the failure stay in the output.
    ///
    /// # Errors
    ///
    /// Only output failures abort the run.
    pub fn convert(&mut self, files: &[PathBuf]) -> CorpusResult<()> {
        self.start_run();
        for file in files {
            self.convert_document(file)?;
        }
        Ok(())
    }

    pub fn convert_document(&mut self, path: &Path) -> CorpusResult<()> {
        let name = path.file_name().unwrap_or(path.as_os_str());
        info!("Extracting {}", name.to_string_lossy());
        match TmxReader::open(path) {
            Ok(reader) => self.convert_reader(reader),
            Err(e) => {
                self.summary.documents += 1;
                self.document_failed(path, e);
                Ok(())
            }
        }
    }

    /// Convert every pair from an already opened reader
    pub fn convert_reader<R: Read>(&mut self, mut reader: TmxReader<R>) -> CorpusResult<()> {
        let mut failure = None;
        for item in reader.by_ref() {
            match item {
                Ok(bitext) => {
                    self.output_bitext(&bitext)?;
                }
                Err(e) => failure = Some(e),
            }
        }

        let stats = reader.stats();
        self.summary.documents += 1;
        self.summary.suppressed += stats.rejected_units;
        self.summary.extraction.merge(stats);
        if let Some(e) = failure {
            self.document_failed(reader.path(), e);
        }
        Ok(())
    }

    fn document_failed(&mut self, path: &Path, e: CorpusError) {
        error!("{}", e);
        self.summary.failed_documents.push(path.to_path_buf());
    }

    /// Filter, tokenize and write one pair
    ///
    /// Streams are written in the order: each language's raw text in pair
    /// order, then each language's tokenized text. Returns whether the pair
    /// was written.
    pub fn output_bitext(&mut self, bitext: &Bitext) -> CorpusResult<bool> {
        if !self.filters.iter().all(|filter| filter.accepts(bitext)) {
            self.summary.filtered += 1;
            self.summary.suppressed += 1;
            return Ok(false);
        }

        let mut lines: Vec<(String, String)> = bitext
            .iter()
            .map(|variant| (variant.language.clone(), variant.text.clone()))
            .collect();
        for variant in bitext.iter() {
            match self.tokenizers.tokenize(&variant.language, &variant.text) {
                Ok(tokenized) => lines.push((tokenized_stream(&variant.language), tokenized)),
                Err(e) => {
                    warn!(language = %variant.language, "Could not tokenize pair, skipping: {}", e);
                    self.summary.suppressed += 1;
                    return Ok(false);
                }
            }
        }

        for (stream, _) in &lines {
            self.output.init(stream)?;
        }
        for (stream, text) in &lines {
            self.output.write(stream, text)?;
        }
        self.summary.emitted += 1;
        Ok(true)
    }

    /// Log the totals, finalize the output and return the summary
    pub fn finalize_run(&mut self) -> CorpusResult<RunSummary> {
        info!("Output {} pairs", self.summary.emitted);
        if self.summary.suppressed > 0 {
            info!("Suppressed {} pairs", self.summary.suppressed);
        }
        self.finalized = true;
        self.output.finalize()?;
        Ok(self.summary.clone())
    }
}

impl Drop for Converter<'_> {
    fn drop(&mut self) {
        if !self.finalized {
            if let Err(e) = self.output.finalize() {
                error!("Failed to finalize output: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Variant;
    use crate::filter::LanguageFilter;
    use crate::output::BufferOutput;

    fn pair(a: (&str, &str), b: (&str, &str)) -> Bitext {
        Bitext::from_variants(vec![Variant::new(a.0, a.1), Variant::new(b.0, b.1)]).unwrap()
    }

    /// Sink that counts finalize calls and can fail writes
    #[derive(Default)]
    struct CountingSink {
        writes: usize,
        finalized: usize,
        fail_writes: bool,
    }

    impl OutputSink for CountingSink {
        fn init(&mut self, _stream: &str) -> CorpusResult<()> {
            Ok(())
        }

        fn write(&mut self, stream: &str, _content: &str) -> CorpusResult<()> {
            if self.fail_writes {
                return Err(CorpusError::io(
                    stream,
                    std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
                ));
            }
            self.writes += 1;
            Ok(())
        }

        fn finalize(&mut self) -> CorpusResult<()> {
            self.finalized += 1;
            Ok(())
        }
    }

    #[test]
    fn test_output_bitext_writes_raw_then_tokenized() {
        let mut output = BufferOutput::new();
        {
            let mut converter = Converter::new(&mut output);
            assert!(converter
                .output_bitext(&pair(("fr", "Bonjour, monde"), ("en", "Hello, world!")))
                .unwrap());
            let summary = converter.finalize_run().unwrap();
            assert_eq!(summary.emitted, 1);
        }
        assert_eq!(output.lines("fr"), ["Bonjour, monde"]);
        assert_eq!(output.lines("en"), ["Hello, world!"]);
        assert_eq!(output.lines("tok.fr"), ["Bonjour ,  monde"]);
        assert_eq!(output.lines("tok.en"), ["Hello ,  world !"]);
    }

    #[test]
    fn test_filtered_pairs_are_suppressed() {
        let mut output = BufferOutput::new();
        let mut converter = Converter::new(&mut output);
        converter.add_filter(Box::new(LanguageFilter::new(&["en", "ja"]).unwrap()));
        assert!(!converter
            .output_bitext(&pair(("fr", "monde"), ("en", "world")))
            .unwrap());
        assert!(converter
            .output_bitext(&pair(("ja", "世界"), ("en", "world")))
            .unwrap());
        let summary = converter.finalize_run().unwrap();
        assert_eq!(summary.emitted, 1);
        assert_eq!(summary.filtered, 1);
        assert_eq!(summary.suppressed, 1);
    }

    #[test]
    fn test_convert_reader_counts_malformed_units() {
        let xml = r#"<tmx><body>
            <tu><tuv xml:lang="en"><seg>alone</seg></tuv></tu>
            <tu><tuv xml:lang="en"><seg>one</seg></tuv><tuv xml:lang="de"><seg>eins</seg></tuv></tu>
        </body></tmx>"#;
        let mut output = BufferOutput::new();
        let mut converter = Converter::new(&mut output);
        converter
            .convert_reader(TmxReader::from_reader(xml.as_bytes(), "mem.tmx"))
            .unwrap();
        let summary = converter.finalize_run().unwrap();
        assert_eq!(summary.documents, 1);
        assert_eq!(summary.emitted, 1);
        assert_eq!(summary.suppressed, 1);
        assert_eq!(summary.extraction.units, 2);
        assert!(summary.failed_documents.is_empty());
    }

    #[test]
    fn test_broken_document_keeps_earlier_pairs() {
        let xml = r#"<tmx><body>
            <tu><tuv xml:lang="en"><seg>one</seg></tuv><tuv xml:lang="de"><seg>eins</seg></tuv></tu>
            <tu><tuv xml:lang="en"><seg>two</seg></tuv></body></tmx>"#;
        let mut output = BufferOutput::new();
        {
            let mut converter = Converter::new(&mut output);
            converter
                .convert_reader(TmxReader::from_reader(xml.as_bytes(), "broken.tmx"))
                .unwrap();
            let summary = converter.finalize_run().unwrap();
            assert_eq!(summary.emitted, 1);
            assert_eq!(summary.failed_documents, vec![PathBuf::from("broken.tmx")]);
        }
        assert_eq!(output.lines("de"), ["eins"]);
    }

    #[test]
    fn test_missing_document_is_recorded_not_fatal() {
        let mut output = BufferOutput::new();
        let mut converter = Converter::new(&mut output);
        converter
            .convert(&[PathBuf::from("/nonexistent/file.tmx")])
            .unwrap();
        let summary = converter.finalize_run().unwrap();
        assert_eq!(summary.documents, 1);
        assert_eq!(summary.failed_documents.len(), 1);
    }

    #[test]
    fn test_sink_finalized_on_drop_after_error() {
        let mut sink = CountingSink {
            fail_writes: true,
            ..CountingSink::default()
        };
        {
            let mut converter = Converter::new(&mut sink);
            let result = converter.output_bitext(&pair(("en", "a"), ("fr", "b")));
            assert!(matches!(result, Err(CorpusError::Io { .. })));
        }
        assert_eq!(sink.finalized, 1);
    }

    #[test]
    fn test_sink_finalized_once() {
        let mut sink = CountingSink::default();
        {
            let mut converter = Converter::new(&mut sink);
            converter
                .output_bitext(&pair(("en", "a"), ("fr", "b")))
                .unwrap();
            converter.finalize_run().unwrap();
        }
        assert_eq!(sink.writes, 4);
        assert_eq!(sink.finalized, 1);
    }

    #[test]
    fn test_start_run_resets_counters() {
        let mut output = BufferOutput::new();
        let mut converter = Converter::new(&mut output);
        converter
            .output_bitext(&pair(("en", "a"), ("fr", "b")))
            .unwrap();
        assert_eq!(converter.summary().emitted, 1);
        converter.start_run();
        assert_eq!(converter.summary(), &RunSummary::default());
    }
}
