//! Streaming TMX extraction
//!
//! [`TmxReader`] pulls XML events from a document and yields one [`Bitext`]
//! per well-formed translation unit. Only the unit currently being read is
//! held in memory, so arbitrarily large translation memories can be
//! converted.
//!
//! Segment flattening keeps the text directly inside `<seg>` plus, for every
//! direct child element, its leading text and its tail:
//!
//! ```text
//! <seg>Press <bpt i="1">&lt;b&gt;</bpt>Save<ept i="1">&lt;/b&gt;</ept> now</seg>
//!   => "Press <b>Save</b> now"
//! ```
//!
//! Text nested deeper than a direct child is dropped.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use encoding_rs_io::{DecodeReaderBytes, DecodeReaderBytesBuilder};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use serde::Serialize;
use tracing::debug;

use crate::data::{Bitext, Variant, VariantSet};
use crate::error::{CorpusError, CorpusResult, Rejection};
use crate::lang::normalize_lang;

const TU: &[u8] = b"tu";
const TUV: &[u8] = b"tuv";
const SEG: &[u8] = b"seg";
const LANG: &[u8] = b"lang";
const XML_LANG: &[u8] = b"xml:lang";

/// Counters collected while reading one document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractStats {
    /// Translation units seen
    pub units: usize,
    /// Units that produced a pair
    pub pairs: usize,
    /// Units dropped because they did not reduce to two languages
    pub rejected_units: usize,
    /// Rejections by reason, variants and units alike
    pub rejections: BTreeMap<&'static str, usize>,
}

impl ExtractStats {
    fn record(&mut self, rejection: Rejection) {
        *self.rejections.entry(rejection.key()).or_insert(0) += 1;
        if let Rejection::Arity(_) = rejection {
            self.rejected_units += 1;
        }
    }

    /// Fold another document's counters into this one
    pub fn merge(&mut self, other: &ExtractStats) {
        self.units += other.units;
        self.pairs += other.pairs;
        self.rejected_units += other.rejected_units;
        for (reason, count) in &other.rejections {
            *self.rejections.entry(reason).or_insert(0) += count;
        }
    }
}

/// Open element bookkeeping for the `<seg>` being flattened
#[derive(Debug)]
struct SegState {
    /// Depth of the `<seg>` element itself
    depth: usize,
    /// The current direct child has opened a nested element, so the rest
    /// of its content is no longer its leading text
    child_nested: bool,
}

#[derive(Debug)]
struct VariantState {
    depth: usize,
    language: Option<String>,
    seg_count: usize,
    seg: Option<SegState>,
    text: String,
}

impl VariantState {
    fn finish(self) -> Result<Variant, Rejection> {
        let language = self.language.ok_or(Rejection::MissingLanguage)?;
        match self.seg_count {
            0 => return Err(Rejection::MissingSegment),
            1 => {}
            _ => return Err(Rejection::AmbiguousSegment),
        }
        let text = clean_text(&self.text);
        if text.trim().is_empty() {
            return Err(Rejection::BlankSegment);
        }
        Ok(Variant::new(language, text))
    }
}

#[derive(Debug)]
struct UnitState {
    depth: usize,
    variants: VariantSet,
    variant: Option<VariantState>,
}

/// Pull-style reader over the translation units of one TMX document
///
/// Implements `Iterator<Item = CorpusResult<Bitext>>`. Malformed units and
/// variants are skipped with a debug diagnostic. A malformed document yields
/// a single `Err` and then ends.
///
/// Input may be UTF-8 or, with a byte order mark, UTF-16 in either byte
/// order; UTF-16 is transcoded to UTF-8 before parsing.
pub struct TmxReader<R: Read> {
    reader: Reader<BufReader<DecodeReaderBytes<R, Vec<u8>>>>,
    path: PathBuf,
    buf: Vec<u8>,
    depth: usize,
    unit: Option<UnitState>,
    stats: ExtractStats,
    done: bool,
}

impl TmxReader<File> {
    /// Open a TMX file for streaming extraction
    pub fn open(path: &Path) -> CorpusResult<Self> {
        let file = File::open(path).map_err(|e| CorpusError::io(path, e))?;
        Ok(Self::from_reader(file, path))
    }
}

impl<R: Read> TmxReader<R> {
    /// Read from any byte source; `path` is used for diagnostics only
    pub fn from_reader(source: R, path: impl Into<PathBuf>) -> Self {
        let decoded = DecodeReaderBytesBuilder::new().strip_bom(true).build(source);
        let mut reader = Reader::from_reader(BufReader::new(decoded));
        reader.config_mut().trim_text(false);
        Self {
            reader,
            path: path.into(),
            buf: Vec::new(),
            depth: 0,
            unit: None,
            stats: ExtractStats::default(),
            done: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Counters for everything read so far
    pub fn stats(&self) -> &ExtractStats {
        &self.stats
    }

    fn xml_error(&self, message: impl Display) -> CorpusError {
        CorpusError::Xml {
            path: self.path.clone(),
            position: self.reader.buffer_position() as u64,
            message: message.to_string(),
        }
    }

    fn reject(&mut self, rejection: Rejection) {
        debug!(
            path = %self.path.display(),
            unit = self.stats.units,
            reason = rejection.key(),
            "{}. Skipping.",
            rejection
        );
        self.stats.record(rejection);
    }

    fn open_element(&mut self, element: &BytesStart) -> CorpusResult<()> {
        let depth = self.depth;
        self.depth += 1;
        let name = element.local_name();
        let name = name.as_ref();

        let Some(unit) = self.unit.as_mut() else {
            if name == TU {
                self.unit = Some(UnitState {
                    depth,
                    variants: VariantSet::default(),
                    variant: None,
                });
            }
            return Ok(());
        };

        match unit.variant.as_mut() {
            None => {
                if depth == unit.depth + 1 && name == TUV {
                    let language = self.variant_language(element)?;
                    if let Some(unit) = self.unit.as_mut() {
                        unit.variant = Some(VariantState {
                            depth,
                            language,
                            seg_count: 0,
                            seg: None,
                            text: String::new(),
                        });
                    }
                }
            }
            Some(variant) => match variant.seg.as_mut() {
                None => {
                    if depth == variant.depth + 1 && name == SEG {
                        variant.seg_count += 1;
                        if variant.seg_count == 1 {
                            variant.seg = Some(SegState {
                                depth,
                                child_nested: false,
                            });
                        }
                    }
                }
                Some(seg) => {
                    if depth == seg.depth + 1 {
                        seg.child_nested = false;
                    } else if depth == seg.depth + 2 {
                        seg.child_nested = true;
                    }
                }
            },
        }
        Ok(())
    }

    /// Close the innermost open element; returns a pair when a unit completes
    fn close_element(&mut self) -> Option<Bitext> {
        self.depth = self.depth.saturating_sub(1);
        let depth = self.depth;
        let unit = self.unit.as_mut()?;

        if let Some(variant) = unit.variant.as_mut() {
            if variant.seg.as_ref().is_some_and(|seg| seg.depth == depth) {
                variant.seg = None;
            }
            if variant.depth == depth {
                let finished = unit.variant.take().map(VariantState::finish);
                match finished {
                    Some(Ok(variant)) => {
                        if unit.variants.insert(variant) {
                            debug!(path = %self.path.display(), "Duplicate TUV language, keeping the later one");
                        }
                    }
                    Some(Err(rejection)) => self.reject(rejection),
                    None => {}
                }
            }
            return None;
        }

        if unit.depth != depth {
            return None;
        }
        let unit = self.unit.take()?;
        self.stats.units += 1;
        let count = unit.variants.len();
        match unit.variants.into_bitext() {
            Ok(bitext) => {
                self.stats.pairs += 1;
                Some(bitext)
            }
            Err(_) => {
                self.reject(Rejection::Arity(count));
                None
            }
        }
    }

    fn push_text(&mut self, text: &str) {
        let depth = self.depth;
        let Some(variant) = self.unit.as_mut().and_then(|u| u.variant.as_mut()) else {
            return;
        };
        let Some(seg) = variant.seg.as_ref() else {
            return;
        };
        let direct = depth == seg.depth + 1;
        let child_lead = depth == seg.depth + 2 && !seg.child_nested;
        if direct || child_lead {
            variant.text.push_str(text);
        }
    }

    fn in_segment(&self) -> bool {
        self.unit
            .as_ref()
            .and_then(|u| u.variant.as_ref())
            .is_some_and(|v| v.seg.is_some())
    }

    /// Resolve the variant language: `lang` first, then `xml:lang`
    fn variant_language(&self, element: &BytesStart) -> CorpusResult<Option<String>> {
        let mut plain = None;
        let mut namespaced = None;
        for attr in element.attributes() {
            let attr = attr.map_err(|e| self.xml_error(e))?;
            let key = attr.key.as_ref();
            if key == LANG {
                plain = Some(attr.unescape_value().map_err(|e| self.xml_error(e))?);
            } else if key == XML_LANG {
                namespaced = Some(attr.unescape_value().map_err(|e| self.xml_error(e))?);
            }
        }
        Ok(plain.or(namespaced).map(|lang| normalize_lang(&lang)))
    }

    fn next_bitext(&mut self) -> CorpusResult<Option<Bitext>> {
        let mut buf = std::mem::take(&mut self.buf);
        let result = loop {
            buf.clear();
            let event = match self.reader.read_event_into(&mut buf) {
                Ok(event) => event,
                Err(e) => break Err(self.xml_error(e)),
            };
            match event {
                Event::Start(element) => {
                    if let Err(e) = self.open_element(&element) {
                        break Err(e);
                    }
                }
                Event::Empty(element) => {
                    if let Err(e) = self.open_element(&element) {
                        break Err(e);
                    }
                    if let Some(bitext) = self.close_element() {
                        break Ok(Some(bitext));
                    }
                }
                Event::End(_) => {
                    if let Some(bitext) = self.close_element() {
                        break Ok(Some(bitext));
                    }
                }
                Event::Text(text) => {
                    if self.in_segment() {
                        match text.unescape() {
                            Ok(text) => self.push_text(&text),
                            Err(e) => break Err(self.xml_error(e)),
                        }
                    }
                }
                Event::CData(data) => {
                    if self.in_segment() {
                        let text = String::from_utf8_lossy(&data).into_owned();
                        self.push_text(&text);
                    }
                }
                Event::Eof => {
                    if self.depth > 0 {
                        break Err(self.xml_error("unexpected end of document"));
                    }
                    break Ok(None);
                }
                _ => {}
            }
        };
        self.buf = buf;
        result
    }
}

impl<R: Read> Iterator for TmxReader<R> {
    type Item = CorpusResult<Bitext>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_bitext() {
            Ok(Some(bitext)) => Some(Ok(bitext)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Clean flattened segment text
///
/// Trims surrounding whitespace, removes embedded line breaks and decodes
/// HTML entities left over from escaped markup.
pub fn clean_text(text: &str) -> String {
    let text = text.trim().replace(['\n', '\r'], "");
    html_escape::decode_html_entities(&text).into_owned()
}
