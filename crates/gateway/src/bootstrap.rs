//! AppState construction shared by `serve`, `chat` and the one-shot
//! commands, so they all boot the same runtime.

use std::sync::Arc;

use anyhow::Context;

use cm_domain::config::{Config, ConfigSeverity};
use cm_providers::{ModelClient, OllamaClient};

use crate::runtime::TurnOrchestrator;
use crate::state::AppState;

/// Validate config, build the model client and orchestrator, and return a
/// fully-wired [`AppState`].
pub fn build_app_state(config: Arc<Config>) -> anyhow::Result<AppState> {
    // ── Config validation ────────────────────────────────────────────
    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            ConfigSeverity::Warning => tracing::warn!("config: {issue}"),
            ConfigSeverity::Error => tracing::error!("config: {issue}"),
        }
    }
    let error_count = issues
        .iter()
        .filter(|i| i.severity == ConfigSeverity::Error)
        .count();
    if error_count > 0 {
        anyhow::bail!("config validation failed with {error_count} error(s)");
    }

    // ── Model client ─────────────────────────────────────────────────
    let model: Arc<dyn ModelClient> = Arc::new(
        OllamaClient::from_config(&config.model).context("initializing model client")?,
    );
    tracing::info!(
        endpoint = %config.model.endpoint,
        model = %config.model.name,
        timeout_secs = config.model.timeout_secs,
        "model client ready"
    );

    Ok(with_model(config, model))
}

/// Wire an [`AppState`] around an already-built model client.
pub fn with_model(config: Arc<Config>, model: Arc<dyn ModelClient>) -> AppState {
    let orchestrator = Arc::new(TurnOrchestrator::new(&config.chat, model));
    tracing::debug!(max_turns = config.chat.max_turns, "turn orchestrator ready");
    AppState {
        config,
        orchestrator,
    }
}

/// Log whether the inference daemon answers. Never fails: the relay keeps
/// serving and reports model errors per request.
pub async fn probe_model(state: &AppState) {
    let model = state.orchestrator.model();
    match model.ping().await {
        Ok(()) => tracing::info!(endpoint = %model.endpoint(), "inference daemon reachable"),
        Err(e) => tracing::warn!(
            endpoint = %model.endpoint(),
            error = %e,
            "inference daemon not reachable; requests will report errors until it is up"
        ),
    }
}
