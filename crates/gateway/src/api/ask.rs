//! `POST /ask`: one-shot question endpoint for editor extensions.
//!
//! Always answers with `{"answer": ...}`. Model failures are folded into
//! the answer text and still return 200; only a missing prompt is a 400.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};

use cm_providers::GenerateOptions;
use cm_sessions::PromptTemplate;

use crate::runtime::error_reply;
use crate::state::AppState;

pub const MISSING_PROMPT: &str = "Please provide a prompt";

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub prompt: Option<String>,
    /// How to phrase the prompt (`ask`, `explain`, `generate`).
    #[serde(default)]
    pub task: PromptTemplate,
    /// Optional model override.
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub answer: String,
}

pub async fn ask(
    State(state): State<AppState>,
    body: Result<Json<AskRequest>, JsonRejection>,
) -> Response {
    let req = match body {
        Ok(Json(req)) => req,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "unreadable /ask body");
            return missing_prompt();
        }
    };

    let prompt = req.prompt.as_deref().map(str::trim).unwrap_or_default();
    if prompt.is_empty() {
        return missing_prompt();
    }

    let question = req.task.apply(prompt);
    let opts = GenerateOptions::with_model(req.model);

    let answer = match state.orchestrator.ask(&question, &opts).await {
        Ok(text) => text,
        Err(e) => error_reply(&e),
    };

    Json(AskResponse { answer }).into_response()
}

fn missing_prompt() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(AskResponse {
            answer: MISSING_PROMPT.into(),
        }),
    )
        .into_response()
}
