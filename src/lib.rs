//! docchat: conversational document Q&A
//!
//! Upload a PDF into a session, index it (extract, chunk, embed), and answer
//! free-text questions with retrieval-augmented generation against a remote
//! chat-completion API. Sessions keep an append-only transcript and can be
//! reset wholesale.

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod session;
pub mod types;

pub use config::ChatConfig;
pub use error::{Error, Result};
pub use session::{Session, SessionManager};
pub use types::{
    document::{Chunk, ChunkSource, Document},
    request::AskRequest,
    response::{AskResponse, SessionView, SourceRef, UploadResponse},
    transcript::{Role, Turn},
};
