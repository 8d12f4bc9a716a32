//! Application state for the chat server

use dashmap::DashMap;
use std::sync::Arc;

use crate::config::ChatConfig;
use crate::error::Result;
use crate::ingestion::DocumentStore;
use crate::providers::{EmbeddingProvider, GroqClient, LlmProvider, OllamaEmbedder};
use crate::retrieval::ChunkIndex;
use crate::session::SessionManager;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: ChatConfig,
    /// Embedding provider
    embedding_provider: Arc<dyn EmbeddingProvider>,
    /// Chat-completion provider
    llm_provider: Arc<dyn LlmProvider>,
    /// On-disk store for uploaded files
    document_store: DocumentStore,
    /// Active sessions
    sessions: SessionManager,
    /// Built indexes memoized by document content hash
    index_cache: DashMap<String, Arc<ChunkIndex>>,
}

impl AppState {
    /// Create application state with the default HTTP-backed providers
    pub fn new(config: ChatConfig) -> Result<Self> {
        tracing::info!("Initializing application state...");

        let embedder = Arc::new(OllamaEmbedder::new(&config.embeddings)?);
        tracing::info!(
            "Embedding provider initialized ({}, {} dims)",
            config.embeddings.model,
            config.embeddings.dimensions
        );

        let llm = Arc::new(GroqClient::new(&config.llm)?);
        tracing::info!("LLM provider initialized (model: {})", config.llm.model);

        Self::with_providers(config, embedder, llm)
    }

    /// Create application state with explicit providers
    ///
    /// Used by tests to inject deterministic embedding and LLM backends.
    pub fn with_providers(
        config: ChatConfig,
        embedding_provider: Arc<dyn EmbeddingProvider>,
        llm_provider: Arc<dyn LlmProvider>,
    ) -> Result<Self> {
        let document_store = DocumentStore::new(config.storage.upload_dir.clone())?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                embedding_provider,
                llm_provider,
                document_store,
                sessions: SessionManager::new(),
                index_cache: DashMap::new(),
            }),
        })
    }

    /// Get configuration
    pub fn config(&self) -> &ChatConfig {
        &self.inner.config
    }

    /// Get embedding provider
    pub fn embedding_provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.inner.embedding_provider
    }

    /// Get LLM provider
    pub fn llm_provider(&self) -> &Arc<dyn LlmProvider> {
        &self.inner.llm_provider
    }

    /// Get document store
    pub fn document_store(&self) -> &DocumentStore {
        &self.inner.document_store
    }

    /// Get session manager
    pub fn sessions(&self) -> &SessionManager {
        &self.inner.sessions
    }

    /// Look up a memoized index by content hash
    pub fn cached_index(&self, content_hash: &str) -> Option<Arc<ChunkIndex>> {
        self.inner
            .index_cache
            .get(content_hash)
            .map(|entry| entry.value().clone())
    }

    /// Memoize a built index under its content hash
    pub fn cache_index(&self, content_hash: String, index: Arc<ChunkIndex>) {
        self.inner.index_cache.insert(content_hash, index);
    }

    /// Drop a memoized index; only an explicit reset invalidates the cache
    pub fn evict_index(&self, content_hash: &str) {
        self.inner.index_cache.remove(content_hash);
    }
}
