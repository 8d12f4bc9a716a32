//! API routes for the chat server

pub mod ingest;
pub mod query;
pub mod sessions;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        // Session lifecycle
        .route("/sessions", post(sessions::create_session))
        .route("/sessions/:id", get(sessions::get_session))
        .route("/sessions/:id/transcript", get(sessions::get_transcript))
        .route("/sessions/:id/reset", post(sessions::reset))
        // Upload - with larger body limit for the PDF
        .route(
            "/sessions/:id/document",
            post(ingest::upload_document).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        // Query
        .route("/sessions/:id/ask", post(query::ask))
        // Info
        .route("/info", get(info))
}

/// API info endpoint
async fn info() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "name": "docchat",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Conversational document Q&A with retrieval-grounded answers",
        "endpoints": {
            "POST /api/sessions": "Create a session",
            "GET /api/sessions/:id": "Session snapshot",
            "POST /api/sessions/:id/document": "Upload a PDF into the session",
            "POST /api/sessions/:id/ask": "Ask a question about the document",
            "GET /api/sessions/:id/transcript": "Ordered question/answer turns",
            "POST /api/sessions/:id/reset": "Clear document, index, and transcript"
        }
    }))
}
