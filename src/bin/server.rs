//! docchat server binary
//!
//! Run with: cargo run --bin docchat-server [config.toml]

use docchat::{config::ChatConfig, server::ChatServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docchat=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => ChatConfig::from_file(&path)?,
        None => ChatConfig::default(),
    };

    tracing::info!("Configuration loaded");
    tracing::info!("  - Embedding model: {}", config.embeddings.model);
    tracing::info!("  - LLM model: {}", config.llm.model);
    tracing::info!(
        "  - Chunking: {} chars, {} overlap",
        config.chunking.chunk_size,
        config.chunking.chunk_overlap
    );
    tracing::info!("  - Retrieval top-k: {}", config.retrieval.top_k);

    // Check the embedding backend before accepting uploads
    tracing::info!("Checking Ollama at {}...", config.embeddings.base_url);
    let client = reqwest::Client::new();
    match client
        .get(format!("{}/api/tags", config.embeddings.base_url))
        .send()
        .await
    {
        Ok(resp) if resp.status().is_success() => {
            tracing::info!("Ollama is running");
        }
        _ => {
            tracing::warn!("Ollama not available at {}", config.embeddings.base_url);
            tracing::warn!("Start it with: ollama serve && ollama pull {}", config.embeddings.model);
        }
    }

    let server = ChatServer::new(config)?;

    println!("\ndocchat server starting...");
    println!("  API: http://{}/api", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("\nEndpoints:");
    println!("  POST /api/sessions                - Create a session");
    println!("  POST /api/sessions/:id/document   - Upload a PDF");
    println!("  POST /api/sessions/:id/ask        - Ask a question");
    println!("  GET  /api/sessions/:id/transcript - View the conversation");
    println!("  POST /api/sessions/:id/reset      - Start over");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
