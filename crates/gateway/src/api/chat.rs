//! `POST /v1/chat`: multi-turn chat scoped to a session key.

use axum::extract::State;
use axum::response::{IntoResponse, Json};
use serde::{Deserialize, Serialize};

use cm_domain::Turn;
use cm_providers::GenerateOptions;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Session to continue. A new key is minted when absent.
    #[serde(default)]
    pub session_key: Option<String>,
    /// User message text. Blank messages return the current view unchanged.
    #[serde(default)]
    pub message: String,
    /// Optional model override.
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub session_key: String,
    pub turns: Vec<Turn>,
}

pub async fn chat(
    State(state): State<AppState>,
    Json(body): Json<ChatRequest>,
) -> impl IntoResponse {
    let session_key = body
        .session_key
        .filter(|k| !k.trim().is_empty())
        .unwrap_or_else(|| format!("web:{}", uuid::Uuid::new_v4()));

    let opts = GenerateOptions::with_model(body.model);
    let turns = state
        .orchestrator
        .respond(&session_key, &body.message, &opts)
        .await;

    Json(ChatResponse { session_key, turns })
}
