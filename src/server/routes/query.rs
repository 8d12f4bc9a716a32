//! Question answering with retrieval-grounded generation

use axum::{
    extract::{Path, State},
    Json,
};
use std::time::Instant;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::generation::PromptBuilder;
use crate::server::state::AppState;
use crate::types::{AskRequest, AskResponse, Role, SourceRef};

/// POST /api/sessions/:id/ask - Ask a question about the indexed document
pub async fn ask(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>> {
    let response = answer_question(&state, session_id, request).await?;
    Ok(Json(response))
}

/// Answer a question: retrieve top-k chunks and invoke the model once
///
/// The user turn is recorded as soon as the question is accepted. Failures
/// after that point (embedding, retrieval, model call) are caught and
/// returned inline so the transcript keeps the user turn and the session
/// stays queryable. Only a missing session or missing index is a hard error.
pub async fn answer_question(
    state: &AppState,
    session_id: Uuid,
    request: AskRequest,
) -> Result<AskResponse> {
    let start = Instant::now();
    let question = request.question.trim().to_string();

    if question.is_empty() {
        return Err(Error::InvalidQuery("Question must not be empty".to_string()));
    }

    // The query surface is only offered once an index exists
    let index = state
        .sessions()
        .with_session(session_id, |s| s.index())?
        .ok_or(Error::NoIndex(session_id))?;

    tracing::info!("Question: \"{}\"", question);
    state
        .sessions()
        .with_session_mut(session_id, |s| s.record(Role::User, &question))??;

    let top_k = request.top_k.unwrap_or(state.config().retrieval.top_k);

    let outcome = retrieve_and_generate(state, &index, &question, top_k).await;
    let processing_time_ms = start.elapsed().as_millis() as u64;

    match outcome {
        Ok((answer, sources)) => {
            state
                .sessions()
                .with_session_mut(session_id, |s| s.record(Role::Assistant, &answer))??;

            tracing::info!(
                "Answered in {}ms using {} sources",
                processing_time_ms,
                sources.len()
            );
            Ok(AskResponse::answered(answer, sources, processing_time_ms))
        }
        Err(e) => {
            // No assistant turn; the error is rendered inline
            tracing::warn!("Answer generation failed: {}", e);
            Ok(AskResponse::failed(e.to_string(), Vec::new(), processing_time_ms))
        }
    }
}

/// Embed the question, search the index, and generate an answer
async fn retrieve_and_generate(
    state: &AppState,
    index: &crate::retrieval::ChunkIndex,
    question: &str,
    top_k: usize,
) -> Result<(String, Vec<SourceRef>)> {
    let query_embedding = state.embedding_provider().embed(question).await?;
    let results = index.search(&query_embedding, top_k)?;

    let sources: Vec<SourceRef> = results
        .iter()
        .map(|r| SourceRef::from_chunk(&r.chunk, r.similarity))
        .collect();

    let context = PromptBuilder::build_context(&results);
    let answer = state
        .llm_provider()
        .generate_answer(question, &context)
        .await?;

    Ok((answer, sources))
}
