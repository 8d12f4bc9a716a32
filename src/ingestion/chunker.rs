//! Deterministic text chunking with fixed size and overlap

use uuid::Uuid;

use crate::config::ChunkingConfig;
use crate::types::{Chunk, ChunkSource};

use super::parser::ParsedDocument;

/// Text chunker with configurable size and overlap
///
/// Chunks are fixed windows of `chunk_size` characters advanced by
/// `chunk_size - overlap`, so adjacent chunks within a page share exactly
/// `overlap` characters. Windows never cross page boundaries.
pub struct TextChunker {
    /// Target chunk size in characters
    chunk_size: usize,
    /// Overlap between adjacent chunks in characters
    overlap: usize,
    /// Minimum size for a trailing chunk
    min_size: usize,
}

impl TextChunker {
    /// Create a new chunker; overlap is clamped below the chunk size
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            overlap: overlap.min(chunk_size - 1),
            min_size: 50,
        }
    }

    /// Create a chunker from configuration
    pub fn from_config(config: &ChunkingConfig) -> Self {
        let mut chunker = Self::new(config.chunk_size, config.chunk_overlap);
        chunker.min_size = config.min_chunk_size;
        chunker
    }

    /// Chunk a parsed document page by page
    pub fn chunk_document(
        &self,
        document_id: Uuid,
        filename: &str,
        parsed: &ParsedDocument,
    ) -> Vec<Chunk> {
        let mut chunks = Vec::new();

        for page in &parsed.pages {
            let source = ChunkSource {
                filename: filename.to_string(),
                page_number: Some(page.page_number),
                page_count: parsed.total_pages,
            };
            self.chunk_page(document_id, &page.content, &source, &mut chunks);
        }

        chunks
    }

    /// Chunk one page of text into overlapping character windows
    fn chunk_page(
        &self,
        document_id: Uuid,
        text: &str,
        source: &ChunkSource,
        chunks: &mut Vec<Chunk>,
    ) {
        if text.is_empty() {
            return;
        }

        // Byte offset of every character, plus the end sentinel, so windows
        // land on valid UTF-8 boundaries.
        let offsets: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let char_count = offsets.len() - 1;
        let step = self.chunk_size - self.overlap;

        let mut start = 0usize;
        loop {
            let end = (start + self.chunk_size).min(char_count);
            let byte_start = offsets[start];
            let byte_end = offsets[end];
            let content = &text[byte_start..byte_end];

            // Drop a tail below the minimum size: too small to retrieve
            // usefully. The part beyond the previous chunk's overlap is lost.
            let is_tail = start > 0 && end == char_count;
            if !(is_tail && end - start < self.min_size) {
                chunks.push(Chunk::new(
                    document_id,
                    content.to_string(),
                    source.clone(),
                    byte_start,
                    byte_end,
                    chunks.len() as u32,
                ));
            }

            if end == char_count {
                break;
            }
            start += step;
        }
    }
}
