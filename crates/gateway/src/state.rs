use std::sync::Arc;

use cm_domain::config::Config;

use crate::runtime::TurnOrchestrator;

/// Shared application state passed to all API handlers and CLI commands.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub orchestrator: Arc<TurnOrchestrator>,
}
