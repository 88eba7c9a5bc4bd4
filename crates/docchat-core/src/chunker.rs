//! Recursive-separator chunker.
//!
//! Text is cut on the coarsest separator present (paragraph, line, space,
//! then single characters), pieces that are still too long are cut again with
//! the finer separators, and the resulting units are packed greedily into
//! chunks. Every chunk after the first starts with the last `overlap`
//! characters of its predecessor.
//!
//! Units may be at most `max_chunk_size - overlap` characters so that an
//! overlap prefix plus one unit always fits. A unit longer than that which no
//! remaining separator can cut is emitted on its own, even past
//! `max_chunk_size`; it is never truncated. The chunk before such a unit does
//! not overlap it.
//!
//! All sizes are in chars, and every chunk is a contiguous slice of the input.
//! Long whitespace runs therefore come back as whitespace-only chunks;
//! callers that embed chunks are expected to skip them.

use tracing::debug;

use crate::config::ChunkingConfig;
use crate::error::Result;
use crate::types::Chunk;

/// Half-open char range `[start, end)` into the corpus.
type Span = (usize, usize);

#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    max_chunk_size: usize,
    overlap: usize,
    separators: Vec<String>,
}

impl RecursiveChunker {
    pub fn new(config: &ChunkingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            max_chunk_size: config.max_chunk_size,
            overlap: config.overlap,
            separators: config.separators.clone(),
        })
    }

    pub fn max_chunk_size(&self) -> usize { self.max_chunk_size }

    pub fn overlap(&self) -> usize { self.overlap }

    /// Largest unit that can follow an overlap prefix.
    fn capacity(&self) -> usize {
        self.max_chunk_size - self.overlap
    }

    pub fn split(&self, text: &str) -> Vec<Chunk> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        let offsets = CharOffsets::new(text);
        let mut units = Vec::new();
        self.split_span(text, &offsets, (0, offsets.char_len()), &self.separators, &mut units);
        let spans = self.pack(&units);
        debug!(units = units.len(), chunks = spans.len(), "chunked corpus");
        spans
            .into_iter()
            .enumerate()
            .map(|(index, (start, end))| Chunk { index, content: offsets.slice(text, start, end).to_string() })
            .collect()
    }

    fn split_span(&self, text: &str, offsets: &CharOffsets, span: Span, separators: &[String], out: &mut Vec<Span>) {
        let slice = offsets.slice(text, span.0, span.1);
        let Some(pos) = separators.iter().position(|sep| sep.is_empty() || slice.contains(sep.as_str())) else {
            out.push(span);
            return;
        };
        let finer = &separators[pos + 1..];
        for piece in split_keep_leading(slice, &separators[pos], offsets, span.0) {
            if piece.1 - piece.0 <= self.capacity() || finer.is_empty() {
                out.push(piece);
            } else {
                self.split_span(text, offsets, piece, finer, out);
            }
        }
    }

    fn pack(&self, units: &[Span]) -> Vec<Span> {
        let capacity = self.capacity();
        let mut chunks = Vec::new();
        let mut current: Option<Span> = None;
        // Whether `current` holds anything beyond a carried-over overlap.
        let mut fresh = false;

        for &(start, end) in units {
            let len = end - start;
            if len > capacity {
                if let Some(span) = current.take() {
                    if fresh {
                        chunks.push(span);
                    }
                }
                chunks.push((start, end));
                current = Some((end - self.overlap.min(len), end));
                fresh = false;
                continue;
            }
            current = Some(match current {
                None => (start, end),
                Some((cs, _)) if end - cs <= self.max_chunk_size => (cs, end),
                Some((cs, ce)) => {
                    chunks.push((cs, ce));
                    (ce - self.overlap, end)
                }
            });
            fresh = true;
        }
        if let (Some(span), true) = (current, fresh) {
            chunks.push(span);
        }
        chunks
    }
}

/// Split `slice` before every occurrence of `sep`, keeping the separator at
/// the start of the following piece. Returns absolute char spans.
fn split_keep_leading(slice: &str, sep: &str, offsets: &CharOffsets, base_char: usize) -> Vec<Span> {
    let base_byte = offsets.byte_at(base_char);
    let char_at = |rel: usize| offsets.char_at_byte(base_byte + rel);

    if sep.is_empty() {
        let end = char_at(slice.len());
        return (base_char..end).map(|c| (c, c + 1)).collect();
    }
    let mut bounds: Vec<usize> = vec![0];
    bounds.extend(slice.match_indices(sep).map(|(i, _)| i));
    bounds.push(slice.len());
    bounds.dedup();
    bounds
        .windows(2)
        .filter(|w| w[0] < w[1])
        .map(|w| (char_at(w[0]), char_at(w[1])))
        .collect()
}

/// Byte offset of every char boundary, plus the end of the string.
struct CharOffsets {
    bytes: Vec<usize>,
}

impl CharOffsets {
    fn new(text: &str) -> Self {
        let mut bytes: Vec<usize> = text.char_indices().map(|(b, _)| b).collect();
        bytes.push(text.len());
        Self { bytes }
    }

    fn char_len(&self) -> usize {
        self.bytes.len() - 1
    }

    fn byte_at(&self, char_idx: usize) -> usize {
        self.bytes[char_idx]
    }

    fn char_at_byte(&self, byte: usize) -> usize {
        // Separator matches always land on char boundaries.
        self.bytes.binary_search(&byte).unwrap_or_else(|i| i)
    }

    fn slice<'a>(&self, text: &'a str, start: usize, end: usize) -> &'a str {
        &text[self.bytes[start]..self.bytes[end]]
    }
}
