//! In-memory vector retrieval over chunk embeddings

pub mod index;

pub use index::{ChunkIndex, ScoredChunk};
