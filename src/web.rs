//! Web chat surface
//!
//! A small axum router: `POST /api/chat` runs one exchange through the
//! [`Agent`], `GET /health` reports liveness. The agent is blocking HTTP, so
//! calls run under `spawn_blocking`.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use uuid::Uuid;

use crate::agent::Agent;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Clone)]
pub struct WebState {
    agent: Arc<Agent>,
}

pub fn router(agent: Arc<Agent>) -> Router {
    Router::new()
        .route("/api/chat", post(chat_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(WebState { agent })
}

/// Bind and serve until the process is stopped.
pub async fn serve(agent: Arc<Agent>, port: u16) -> std::io::Result<()> {
    let app = router(agent);
    let addr = format!("0.0.0.0:{port}");
    info!("web chat listening on {addr}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

async fn chat_handler(
    State(state): State<WebState>,
    Json(request): Json<ChatRequest>,
) -> impl IntoResponse {
    let message = request.message.trim().to_string();
    if message.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Message cannot be empty." })),
        );
    }

    // Absent session ids get a fresh session rather than a shared default.
    let session_id = request
        .session_id
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let agent = state.agent.clone();
    let result =
        tokio::task::spawn_blocking(move || agent.respond(&session_id, &message)).await;

    match result {
        Ok(Ok(text)) => (StatusCode::OK, Json(json!({ "response": text }))),
        Ok(Err(e)) => {
            error!(error = %e, "chat exchange failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "response": format!("I'm sorry, I encountered an error: {e}")
                })),
            )
        }
        Err(e) => {
            error!(error = %e, "chat task panicked");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "response": "I'm sorry, I encountered an internal error."
                })),
            )
        }
    }
}
