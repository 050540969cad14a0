//! Output sinks for extracted corpora
//!
//! A sink receives lines keyed by stream name. Raw text goes to the stream
//! named after the language (`en`); tokenized text to the same name under the
//! [`TOKENIZED_PREFIX`] namespace (`tok.en`).

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use serde::Serialize;
use tracing::debug;

use crate::error::{CorpusError, CorpusResult};

/// Namespace prefix for tokenized streams
pub const TOKENIZED_PREFIX: &str = "tok.";

/// Stream name for the tokenized text of a language
pub fn tokenized_stream(language: &str) -> String {
    format!("{}{}", TOKENIZED_PREFIX, language)
}

/// Destination for corpus lines
pub trait OutputSink {
    /// Prepare a stream; called before the first write and harmless to
    /// repeat
    fn init(&mut self, stream: &str) -> CorpusResult<()>;

    /// Append one line to an initialized stream
    fn write(&mut self, stream: &str, content: &str) -> CorpusResult<()>;

    /// Flush and release every stream; the sink may be reused afterwards
    fn finalize(&mut self) -> CorpusResult<()>;
}

/// Writes each stream to `<dir>/<prefix>.<stream>`
///
/// Files are created on first `init` and truncated if they already exist.
pub struct FileOutput {
    dir: PathBuf,
    prefix: String,
    files: HashMap<String, (PathBuf, BufWriter<File>)>,
}

impl FileOutput {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        debug!("Output path: {}", dir.display());
        Self {
            dir,
            prefix: "bitext".to_string(),
            files: HashMap::new(),
        }
    }

    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = prefix.to_string();
        self
    }

    pub fn path_for(&self, stream: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", self.prefix, stream))
    }
}

impl OutputSink for FileOutput {
    fn init(&mut self, stream: &str) -> CorpusResult<()> {
        if self.files.contains_key(stream) {
            return Ok(());
        }
        let path = self.path_for(stream);
        let file = File::create(&path).map_err(|e| CorpusError::io(&path, e))?;
        self.files
            .insert(stream.to_string(), (path, BufWriter::new(file)));
        Ok(())
    }

    fn write(&mut self, stream: &str, content: &str) -> CorpusResult<()> {
        if !self.files.contains_key(stream) {
            self.init(stream)?;
        }
        if let Some((path, out)) = self.files.get_mut(stream) {
            writeln!(out, "{}", content).map_err(|e| CorpusError::io(path.as_path(), e))?;
        }
        Ok(())
    }

    fn finalize(&mut self) -> CorpusResult<()> {
        let mut first_error = None;
        for (_, (path, mut out)) in self.files.drain() {
            if let Err(e) = out.flush() {
                first_error.get_or_insert(CorpusError::io(path, e));
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Drop for FileOutput {
    fn drop(&mut self) {
        if let Err(e) = self.finalize() {
            tracing::error!("Failed to flush output: {}", e);
        }
    }
}

/// Keeps every stream in memory, in write order
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct BufferOutput {
    buckets: BTreeMap<String, Vec<String>>,
}

impl BufferOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self, stream: &str) -> &[String] {
        self.buckets.get(stream).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl OutputSink for BufferOutput {
    fn init(&mut self, stream: &str) -> CorpusResult<()> {
        self.buckets.entry(stream.to_string()).or_default();
        Ok(())
    }

    fn write(&mut self, stream: &str, content: &str) -> CorpusResult<()> {
        self.buckets
            .entry(stream.to_string())
            .or_default()
            .push(content.to_string());
        Ok(())
    }

    fn finalize(&mut self) -> CorpusResult<()> {
        Ok(())
    }
}
