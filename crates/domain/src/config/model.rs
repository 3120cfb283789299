use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Inference daemon
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Where and how to reach the local model-serving daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Full URL of the generation endpoint (Ollama `/api/generate` shape).
    #[serde(default = "d_endpoint")]
    pub endpoint: String,
    /// Model identifier sent in every request.
    #[serde(default = "d_name")]
    pub name: String,
    /// Sampling temperature.
    #[serde(default = "d_temperature")]
    pub temperature: f64,
    /// Whole-request timeout. Each call is a single attempt bounded by this.
    #[serde(default = "d_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            endpoint: d_endpoint(),
            name: d_name(),
            temperature: d_temperature(),
            timeout_secs: d_timeout_secs(),
        }
    }
}

fn d_endpoint() -> String {
    "http://localhost:11434/api/generate".into()
}
fn d_name() -> String {
    "codeMITRA".into()
}
fn d_temperature() -> f64 {
    0.2
}
fn d_timeout_secs() -> u64 {
    60
}
