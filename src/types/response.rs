//! Response types for the HTTP API

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::document::Chunk;
use super::transcript::Turn;

/// Reference to a retrieved source passage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRef {
    /// Chunk that matched
    pub chunk_id: Uuid,
    /// Filename of the source document
    pub filename: String,
    /// Page number (1-indexed), if known
    pub page_number: Option<u32>,
    /// Short preview of the matched text
    pub snippet: String,
    /// Cosine similarity score (0.0-1.0)
    pub similarity: f32,
}

impl SourceRef {
    /// Build a source reference from a retrieved chunk
    pub fn from_chunk(chunk: &Chunk, similarity: f32) -> Self {
        Self {
            chunk_id: chunk.id,
            filename: chunk.source.filename.clone(),
            page_number: chunk.source.page_number,
            snippet: chunk.snippet(200),
            similarity,
        }
    }
}

/// Response to a question
///
/// A failed model call is reported inline through `error` rather than as an
/// HTTP error, so the client can render it in the transcript view while the
/// session stays queryable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    /// Generated answer (absent when the model call failed)
    pub answer: Option<String>,
    /// Error message when the answer could not be generated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Passages the answer was grounded on
    pub sources: Vec<SourceRef>,
    /// Number of chunks retrieved for this question
    pub chunks_retrieved: usize,
    /// End-to-end processing time
    pub processing_time_ms: u64,
}

impl AskResponse {
    /// Successful answer
    pub fn answered(answer: String, sources: Vec<SourceRef>, processing_time_ms: u64) -> Self {
        let chunks_retrieved = sources.len();
        Self {
            answer: Some(answer),
            error: None,
            sources,
            chunks_retrieved,
            processing_time_ms,
        }
    }

    /// Inline failure, surfaced to the user instead of an HTTP error
    pub fn failed(error: String, sources: Vec<SourceRef>, processing_time_ms: u64) -> Self {
        let chunks_retrieved = sources.len();
        Self {
            answer: None,
            error: Some(error),
            sources,
            chunks_retrieved,
            processing_time_ms,
        }
    }
}

/// Response to a document upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Document ID
    pub document_id: Uuid,
    /// Original filename
    pub filename: String,
    /// Total pages extracted
    pub total_pages: Option<u32>,
    /// Number of chunks indexed
    pub total_chunks: u32,
    /// Whether a memoized index was reused for identical content
    pub index_reused: bool,
    /// Processing time
    pub processing_time_ms: u64,
}

/// Snapshot of a session's state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionView {
    /// Session ID
    pub session_id: Uuid,
    /// Filename of the active document, if any
    pub document: Option<String>,
    /// Whether an index has been built
    pub indexed: bool,
    /// Number of transcript turns
    pub turns: usize,
}

/// Full transcript of a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptResponse {
    /// Session ID
    pub session_id: Uuid,
    /// Ordered role-tagged turns
    pub turns: Vec<Turn>,
}
