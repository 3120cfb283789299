mod chat;
mod model;
mod observability;
mod server;

pub use chat::*;
pub use model::*;
pub use observability::*;
pub use server::*;

use serde::{Deserialize, Serialize};
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl ConfigError {
    fn error(field: &str, message: impl Into<String>) -> Self {
        Self {
            severity: ConfigSeverity::Error,
            field: field.into(),
            message: message.into(),
        }
    }

    fn warning(field: &str, message: impl Into<String>) -> Self {
        Self {
            severity: ConfigSeverity::Warning,
            field: field.into(),
            message: message.into(),
        }
    }
}

impl Config {
    /// Validate the configuration and return a list of issues.
    ///
    /// Returns an empty vec when everything looks good.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.server.port == 0 {
            errors.push(ConfigError::error("server.port", "port must be greater than 0"));
        }
        if self.server.host.is_empty() {
            errors.push(ConfigError::error("server.host", "host must not be empty"));
        }
        if self.server.max_concurrent_requests == 0 {
            errors.push(ConfigError::error(
                "server.max_concurrent_requests",
                "must be greater than 0",
            ));
        }

        if self.model.endpoint.is_empty() {
            errors.push(ConfigError::error("model.endpoint", "endpoint must not be empty"));
        } else if !self.model.endpoint.starts_with("http://")
            && !self.model.endpoint.starts_with("https://")
        {
            errors.push(ConfigError::error(
                "model.endpoint",
                "endpoint must be an http:// or https:// URL",
            ));
        }
        if self.model.name.trim().is_empty() {
            errors.push(ConfigError::error("model.name", "model name must not be empty"));
        }
        if !(0.0..=2.0).contains(&self.model.temperature) {
            errors.push(ConfigError::error(
                "model.temperature",
                "temperature must be between 0.0 and 2.0",
            ));
        }
        if self.model.timeout_secs == 0 {
            errors.push(ConfigError::error(
                "model.timeout_secs",
                "timeout must be greater than 0",
            ));
        }

        if self.chat.max_turns == 0 {
            errors.push(ConfigError::error(
                "chat.max_turns",
                "at least one turn must be kept for prompting",
            ));
        }
        if self.chat.system_prompt.trim().is_empty() {
            errors.push(ConfigError::warning(
                "chat.system_prompt",
                "empty system prompt; the model gets no persona",
            ));
        }

        if self.server.cors.allowed_origins.len() == 1
            && self.server.cors.allowed_origins[0] == "*"
        {
            errors.push(ConfigError::warning(
                "server.cors.allowed_origins",
                "wildcard \"*\" allows all origins (not recommended for production)",
            ));
        }

        errors
    }
}
