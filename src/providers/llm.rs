//! LLM provider trait for answer generation

use async_trait::async_trait;

use crate::error::Result;

/// Trait for LLM-based answer generation
///
/// Implementations make exactly one attempt per call; a failed call is
/// surfaced to the caller, which renders it inline rather than retrying.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate an answer given a question and retrieved context
    async fn generate_answer(&self, question: &str, context: &str) -> Result<String>;

    /// Provider name for logging
    fn name(&self) -> &str;

    /// Model being used
    fn model(&self) -> &str;
}
