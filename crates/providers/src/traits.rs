use cm_domain::ModelError;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Request options
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Per-call overrides. `None` fields fall back to the client's configured
/// defaults.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Model identifier override.
    pub model: Option<String>,
    /// Sampling temperature override.
    pub temperature: Option<f64>,
}

impl GenerateOptions {
    pub fn with_model(model: Option<String>) -> Self {
        Self {
            model,
            temperature: None,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Core client trait
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A text-completion backend.
///
/// Implementations make a single request per call and report every failure
/// as a [`ModelError`] value; they never panic past this boundary.
#[async_trait::async_trait]
pub trait ModelClient: Send + Sync {
    /// Send a fully rendered prompt and return the generated text.
    async fn generate(&self, prompt: &str, opts: &GenerateOptions) -> Result<String, ModelError>;

    /// Check that the backend is reachable.
    async fn ping(&self) -> Result<(), ModelError>;

    /// Model used when no override is given.
    fn default_model(&self) -> &str;

    /// Human-readable location of the backend (for logs and health output).
    fn endpoint(&self) -> &str;
}
