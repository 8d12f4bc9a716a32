//! Session lifecycle: create, inspect, transcript, reset

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::json;
use uuid::Uuid;

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::{SessionView, TranscriptResponse};

/// POST /api/sessions - Create an empty session
pub async fn create_session(State(state): State<AppState>) -> Json<serde_json::Value> {
    let session_id = state.sessions().create();
    tracing::info!("Created session {}", session_id);
    Json(json!({ "session_id": session_id }))
}

/// GET /api/sessions/:id - Session snapshot
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionView>> {
    let view = state.sessions().with_session(session_id, |s| SessionView {
        session_id: s.id,
        document: s.document().map(|d| d.filename.clone()),
        indexed: s.has_index(),
        turns: s.transcript().len(),
    })?;
    Ok(Json(view))
}

/// GET /api/sessions/:id/transcript - Ordered role-tagged turns
pub async fn get_transcript(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<TranscriptResponse>> {
    let turns = state
        .sessions()
        .with_session(session_id, |s| s.transcript().to_vec())?;
    Ok(Json(TranscriptResponse { session_id, turns }))
}

/// POST /api/sessions/:id/reset - Clear document, index, and transcript
pub async fn reset(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>> {
    let response = reset_session(&state, session_id).await?;
    Ok(Json(response))
}

/// Reset a session wholesale and release its document's cache and file
pub async fn reset_session(state: &AppState, session_id: Uuid) -> Result<serde_json::Value> {
    let removed = state
        .sessions()
        .with_session_mut(session_id, |s| s.reset())?;

    if let Some(document) = removed {
        state.evict_index(&document.content_hash);
        state.document_store().delete(&document.id).await?;
        tracing::info!("Reset session {} (released '{}')", session_id, document.filename);
    } else {
        tracing::info!("Reset session {} (already empty)", session_id);
    }

    Ok(json!({ "session_id": session_id, "reset": true }))
}
