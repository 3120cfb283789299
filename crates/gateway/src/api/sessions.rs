//! Session inspection endpoints.
//!
//! - `GET  /v1/sessions`             list sessions with message counts
//! - `GET  /v1/sessions/:key/turns`  rendered conversation
//! - `POST /v1/sessions/:key/reset`  drop a session's history

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Json};

use crate::state::AppState;

pub async fn list_sessions(State(state): State<AppState>) -> impl IntoResponse {
    let sessions = state.orchestrator.sessions().list();
    Json(serde_json::json!({
        "count": sessions.len(),
        "sessions": sessions,
    }))
}

pub async fn get_turns(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> impl IntoResponse {
    let turns = state.orchestrator.view(&key);
    Json(serde_json::json!({
        "session_key": key,
        "turns": turns,
    }))
}

pub async fn reset_session(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> impl IntoResponse {
    let dropped = state.orchestrator.reset(&key).await;
    tracing::info!(session_key = %key, dropped, "session reset via API");
    Json(serde_json::json!({
        "session_key": key,
        "dropped_messages": dropped,
    }))
}
