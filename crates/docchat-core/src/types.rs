//! Domain types shared by the extractor, chunker, index and answer pipeline.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Format tag of an uploaded document, inferred from its name.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    PlainText,
    Unsupported,
}

impl DocumentFormat {
    pub fn from_name(name: &str) -> Self {
        match Path::new(name).extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("pdf") => Self::Pdf,
            Some(ext) if ext.eq_ignore_ascii_case("txt") => Self::PlainText,
            _ => Self::Unsupported,
        }
    }
}

/// Raw uploaded content. Consumed once by the extractor.
#[derive(Debug, Clone)]
pub struct Document {
    pub name: String,
    pub format: DocumentFormat,
    pub bytes: Vec<u8>,
}

impl Document {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let format = DocumentFormat::from_name(&name);
        Self { name, format, bytes }
    }
}

/// A contiguous span of the corpus text.
///
/// - `index`: position in the chunk sequence
/// - `content`: the text payload, used verbatim for embedding and prompting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub index: usize,
    pub content: String,
}

impl Chunk {
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}

/// A chunk returned by a similarity search. Higher `score` is closer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub chunk: Chunk,
    pub score: f32,
}

/// Top-k chunks for one question, nearest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetrievedContext {
    pub hits: Vec<SearchHit>,
}

impl RetrievedContext {
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn contents(&self) -> impl Iterator<Item = &str> {
        self.hits.iter().map(|h| h.chunk.content.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnswerStatus {
    Answered,
    /// The model replied with the "don't know" phrase of the prompt contract.
    Declined,
    /// Generation failed; `text` carries a user-facing explanation.
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    pub status: AnswerStatus,
}

impl Answer {
    pub fn failed(text: impl Into<String>) -> Self {
        Self { text: text.into(), status: AnswerStatus::Failed }
    }
}

/// Counters describing one finished ingestion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub documents: usize,
    pub skipped: usize,
    pub characters: usize,
    pub chunks: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_is_inferred_from_suffix() {
        assert_eq!(DocumentFormat::from_name("report.pdf"), DocumentFormat::Pdf);
        assert_eq!(DocumentFormat::from_name("REPORT.PDF"), DocumentFormat::Pdf);
        assert_eq!(DocumentFormat::from_name("notes.txt"), DocumentFormat::PlainText);
        assert_eq!(DocumentFormat::from_name("notes.md"), DocumentFormat::Unsupported);
        assert_eq!(DocumentFormat::from_name("txt"), DocumentFormat::Unsupported);
    }

    #[test]
    fn char_len_counts_scalars_not_bytes() {
        let c = Chunk { index: 0, content: "héllo".into() };
        assert_eq!(c.char_len(), 5);
    }
}
