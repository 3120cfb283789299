pub mod ask;
pub mod chat;
pub mod health;
pub mod page;
pub mod sessions;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// Build the full API router.
///
/// All routes are public: the relay is meant to bind to localhost and has
/// no authentication.
pub fn router() -> Router<AppState> {
    Router::new()
        // Chat page
        .route("/", get(page::index))
        // Editor-extension endpoint (one-shot, no history)
        .route("/ask", post(ask::ask))
        // Multi-turn chat
        .route("/v1/chat", post(chat::chat))
        // Sessions
        .route("/v1/sessions", get(sessions::list_sessions))
        .route("/v1/sessions/:key/turns", get(sessions::get_turns))
        .route("/v1/sessions/:key/reset", post(sessions::reset_session))
        // Health
        .route("/v1/health", get(health::health))
}
