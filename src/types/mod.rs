//! Core types: documents, chunks, transcript turns, request/response DTOs

pub mod document;
pub mod request;
pub mod response;
pub mod transcript;

pub use document::{Chunk, ChunkSource, Document};
pub use request::AskRequest;
pub use response::{AskResponse, SessionView, SourceRef, TranscriptResponse, UploadResponse};
pub use transcript::{Role, Turn};
