//! Document ingestion: PDF parsing, chunking, and on-disk storage

pub mod chunker;
pub mod parser;
pub mod storage;

pub use chunker::TextChunker;
pub use parser::{PageContent, ParsedDocument, PdfParser};
pub use storage::DocumentStore;
