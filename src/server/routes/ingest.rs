//! Document upload and indexing

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::ingestion::{parser::hash_bytes, PdfParser, TextChunker};
use crate::retrieval::ChunkIndex;
use crate::server::state::AppState;
use crate::types::{Document, UploadResponse};

/// POST /api/sessions/:id/document - Upload and index a PDF
pub async fn upload_document(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::Upload(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() == Some("file") {
            let filename = field
                .file_name()
                .ok_or_else(|| Error::Upload("Missing filename".to_string()))?
                .to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| Error::Upload(format!("Failed to read upload: {}", e)))?;
            upload = Some((filename, data.to_vec()));
        }
    }

    let (filename, data) =
        upload.ok_or_else(|| Error::Upload("Expected a 'file' field".to_string()))?;

    let response = ingest_document(&state, session_id, &filename, &data).await?;
    Ok(Json(response))
}

/// Ingest a document into a session: persist, parse, chunk, embed, index
pub async fn ingest_document(
    state: &AppState,
    session_id: Uuid,
    filename: &str,
    data: &[u8],
) -> Result<UploadResponse> {
    let start = Instant::now();

    if data.is_empty() {
        return Err(Error::Upload("Uploaded file is empty".to_string()));
    }
    if !PdfParser::is_pdf(filename) {
        let extension = filename.rsplit('.').next().unwrap_or("").to_string();
        return Err(Error::UnsupportedFileType(extension));
    }

    // One active document per session; checked up front so we fail before
    // doing any extraction work.
    let has_document = state
        .sessions()
        .with_session(session_id, |s| s.document().is_some())?;
    if has_document {
        return Err(Error::DocumentExists(session_id));
    }

    tracing::info!("Ingesting '{}' ({} bytes)", filename, data.len());

    let content_hash = hash_bytes(data);
    let mut document = Document::new(filename.to_string(), content_hash.clone(), data.len() as u64);

    // Persist the raw bytes before extraction
    state.document_store().store(&document.id, data).await?;

    // pdf-extract is CPU-bound; keep it off the async runtime
    let parse_filename = filename.to_string();
    let parse_data = data.to_vec();
    let parsed = tokio::task::spawn_blocking(move || PdfParser::parse(&parse_filename, &parse_data))
        .await
        .map_err(|e| Error::Internal(format!("Task join error: {}", e)))?;

    let parsed = match parsed {
        Ok(parsed) => parsed,
        Err(e) => {
            // No partial state: drop the stored file if extraction failed
            let _ = state.document_store().delete(&document.id).await;
            return Err(e);
        }
    };

    document.total_pages = parsed.total_pages;

    // Reuse a memoized index for identical content; chunking is deterministic
    // so the cached index covers exactly the same chunks.
    let (index, index_reused) = match state.cached_index(&content_hash) {
        Some(index) => {
            tracing::info!("Reusing memoized index for content hash {}", &content_hash[..12]);
            (index, true)
        }
        None => {
            let chunker = TextChunker::from_config(&state.config().chunking);
            let mut chunks = chunker.chunk_document(document.id, filename, &parsed);
            if chunks.is_empty() {
                let _ = state.document_store().delete(&document.id).await;
                return Err(Error::file_parse(
                    filename,
                    "Document produced no indexable text",
                ));
            }

            let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
            let embeddings = match state.embedding_provider().embed_batch(&texts).await {
                Ok(embeddings) => embeddings,
                Err(e) => {
                    let _ = state.document_store().delete(&document.id).await;
                    return Err(e);
                }
            };
            for (chunk, embedding) in chunks.iter_mut().zip(embeddings) {
                chunk.embedding = embedding;
            }

            let index = match ChunkIndex::build(document.id, chunks) {
                Ok(index) => Arc::new(index),
                Err(e) => {
                    let _ = state.document_store().delete(&document.id).await;
                    return Err(e);
                }
            };
            state.cache_index(content_hash.clone(), index.clone());
            (index, false)
        }
    };

    document.total_chunks = index.len() as u32;
    let response = UploadResponse {
        document_id: document.id,
        filename: document.filename.clone(),
        total_pages: document.total_pages,
        total_chunks: document.total_chunks,
        index_reused,
        processing_time_ms: start.elapsed().as_millis() as u64,
    };

    let attach = state
        .sessions()
        .with_session_mut(session_id, |s| s.attach_document(document, index))?;
    if let Err(e) = attach {
        // A concurrent upload won the session; drop our stored copy and,
        // when the index was built on this call, its cache entry
        if !index_reused {
            state.evict_index(&content_hash);
        }
        let _ = state.document_store().delete(&response.document_id).await;
        return Err(e);
    }

    tracing::info!(
        "Indexed '{}': {} chunks across {:?} pages in {}ms",
        filename,
        response.total_chunks,
        response.total_pages,
        response.processing_time_ms
    );

    Ok(response)
}
