//! Request types for the query surface

use serde::{Deserialize, Serialize};

/// Request body for asking a question about the indexed document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    /// The question to answer
    pub question: String,

    /// Number of chunks to retrieve (defaults to the configured value)
    #[serde(default)]
    pub top_k: Option<usize>,
}

impl AskRequest {
    /// Create a new request with default retrieval settings
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            top_k: None,
        }
    }
}
