//! `GET /v1/health`: relay status and inference daemon reachability.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};

use crate::state::AppState;

/// 200 when the daemon answers, 503 otherwise. The body always describes
/// which model and endpoint the relay is pointed at.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let model = state.orchestrator.model();
    let probe = model.ping().await;

    let status = if probe.is_ok() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(serde_json::json!({
            "status": if probe.is_ok() { "ok" } else { "degraded" },
            "version": env!("CARGO_PKG_VERSION"),
            "model": model.default_model(),
            "endpoint": model.endpoint(),
            "daemon_reachable": probe.is_ok(),
            "daemon_error": probe.err().map(|e| e.to_string()),
            "sessions": state.orchestrator.sessions().len(),
        })),
    )
}
