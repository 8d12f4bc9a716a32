//! Provider abstractions for embeddings and answer generation
//!
//! Trait-based seams so the HTTP backends can be swapped for deterministic
//! implementations in tests.

pub mod embedding;
pub mod groq;
pub mod llm;
pub mod ollama;

pub use embedding::EmbeddingProvider;
pub use groq::GroqClient;
pub use llm::LlmProvider;
pub use ollama::OllamaEmbedder;
