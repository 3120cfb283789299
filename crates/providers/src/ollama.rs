//! Ollama-style `/api/generate` adapter.
//!
//! Sends one non-streaming JSON POST per call and extracts the generated
//! text from the reply. Works with Ollama and any daemon that mimics its
//! generate endpoint.

use std::time::{Duration, Instant};

use serde_json::Value;

use cm_domain::config::ModelConfig;
use cm_domain::error::{Error, Result};
use cm_domain::trace::TraceEvent;
use cm_domain::ModelError;

use crate::traits::{GenerateOptions, ModelClient};
use crate::util::{base_url, from_reqwest};

/// Reply fields that may carry the generated text, in priority order.
pub const TEXT_FIELDS: [&str; 3] = ["response", "output", "text"];

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Client struct
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct OllamaClient {
    endpoint: String,
    default_model: String,
    temperature: f64,
    client: reqwest::Client,
}

impl OllamaClient {
    /// Build a client from the `[model]` config section.
    pub fn from_config(cfg: &ModelConfig) -> Result<Self> {
        reqwest::Url::parse(&cfg.endpoint)
            .map_err(|e| Error::Config(format!("model.endpoint '{}': {e}", cfg.endpoint)))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        Ok(Self {
            endpoint: cfg.endpoint.clone(),
            default_model: cfg.name.clone(),
            temperature: cfg.temperature,
            client,
        })
    }

    fn build_body(&self, prompt: &str, opts: &GenerateOptions) -> Value {
        let model = opts.model.as_deref().unwrap_or(&self.default_model);
        let temperature = opts.temperature.unwrap_or(self.temperature);
        serde_json::json!({
            "model": model,
            "prompt": prompt,
            "stream": false,
            "temperature": temperature,
        })
    }

    async fn send(&self, body: &Value) -> std::result::Result<(u16, String), ModelError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .json(body)
            .send()
            .await
            .map_err(from_reqwest)?;

        let status = resp.status().as_u16();
        let text = resp.text().await.map_err(from_reqwest)?;
        Ok((status, text))
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Response parsing
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Classify a daemon reply into generated text or a [`ModelError`].
pub fn parse_generation(status: u16, raw: &str) -> std::result::Result<String, ModelError> {
    if status != 200 {
        return Err(ModelError::Server {
            status,
            body: raw.to_owned(),
        });
    }

    let body: Value = serde_json::from_str(raw).map_err(|_| ModelError::decode(raw))?;

    if let Some(text) = extract_text(&body) {
        return Ok(text.to_owned());
    }
    Err(ModelError::Schema { body })
}

/// First of [`TEXT_FIELDS`] that holds a string.
fn extract_text(body: &Value) -> Option<&str> {
    TEXT_FIELDS
        .iter()
        .find_map(|field| body.get(*field).and_then(Value::as_str))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Trait implementation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[async_trait::async_trait]
impl ModelClient for OllamaClient {
    async fn generate(
        &self,
        prompt: &str,
        opts: &GenerateOptions,
    ) -> std::result::Result<String, ModelError> {
        let body = self.build_body(prompt, opts);
        let model = body["model"].as_str().unwrap_or_default().to_owned();

        tracing::debug!(
            endpoint = %self.endpoint,
            model = %model,
            prompt_chars = prompt.len(),
            "generate request"
        );

        let started = Instant::now();
        let sent = self.send(&body).await;
        let status = sent.as_ref().ok().map(|(s, _)| *s);
        let result = sent.and_then(|(status, raw)| parse_generation(status, &raw));

        TraceEvent::ModelRequest {
            model,
            endpoint: self.endpoint.clone(),
            prompt_chars: prompt.len(),
            duration_ms: started.elapsed().as_millis() as u64,
            status,
            error_kind: result.as_ref().err().map(|e| e.kind().to_owned()),
        }
        .emit();

        if let Err(ref e) = result {
            tracing::warn!(endpoint = %self.endpoint, error = %e, "generate failed");
        }
        result
    }

    async fn ping(&self) -> std::result::Result<(), ModelError> {
        let mut url = base_url(&self.endpoint)?;
        url.set_path("/api/tags");

        let resp = self.client.get(url).send().await.map_err(from_reqwest)?;
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let body = resp.text().await.unwrap_or_default();
        Err(ModelError::Server {
            status: status.as_u16(),
            body,
        })
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> OllamaClient {
        OllamaClient::from_config(&ModelConfig::default()).unwrap()
    }

    #[test]
    fn ok_response_field() {
        assert_eq!(parse_generation(200, r#"{"response":"hi"}"#).unwrap(), "hi");
    }

    #[test]
    fn server_error_keeps_status_and_body() {
        assert_eq!(
            parse_generation(500, "oops").unwrap_err(),
            ModelError::Server {
                status: 500,
                body: "oops".into()
            }
        );
    }

    #[test]
    fn non_200_success_codes_are_server_errors() {
        let err = parse_generation(201, r#"{"response":"hi"}"#).unwrap_err();
        assert!(matches!(err, ModelError::Server { status: 201, .. }));
    }

    #[test]
    fn non_json_is_decode_error() {
        assert_eq!(
            parse_generation(200, "not json").unwrap_err(),
            ModelError::Decode {
                body_prefix: "not json".into()
            }
        );
    }

    #[test]
    fn missing_fields_is_schema_error() {
        assert_eq!(
            parse_generation(200, r#"{"foo":"bar"}"#).unwrap_err(),
            ModelError::Schema {
                body: serde_json::json!({"foo": "bar"})
            }
        );
    }

    #[test]
    fn field_priority_is_response_output_text() {
        let all = r#"{"text":"t","output":"o","response":"r"}"#;
        assert_eq!(parse_generation(200, all).unwrap(), "r");
        let two = r#"{"text":"t","output":"o"}"#;
        assert_eq!(parse_generation(200, two).unwrap(), "o");
        assert_eq!(parse_generation(200, r#"{"text":"t"}"#).unwrap(), "t");
    }

    #[test]
    fn null_field_falls_through_to_next_candidate() {
        let body = r#"{"response":null,"output":"o"}"#;
        assert_eq!(parse_generation(200, body).unwrap(), "o");
    }

    #[test]
    fn empty_string_counts_as_present() {
        let body = r#"{"response":"","output":"o"}"#;
        assert_eq!(parse_generation(200, body).unwrap(), "");
    }

    #[test]
    fn json_array_is_schema_error() {
        let err = parse_generation(200, "[1,2]").unwrap_err();
        assert!(matches!(err, ModelError::Schema { .. }));
    }

    #[test]
    fn from_config_rejects_unparseable_endpoint() {
        let cfg = ModelConfig {
            endpoint: "not a url".into(),
            ..ModelConfig::default()
        };
        assert!(matches!(
            OllamaClient::from_config(&cfg),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn body_uses_defaults() {
        let body = client().build_body("P", &GenerateOptions::default());
        assert_eq!(body["model"], "codeMITRA");
        assert_eq!(body["prompt"], "P");
        assert_eq!(body["stream"], false);
        assert_eq!(body["temperature"], serde_json::json!(0.2));
    }

    #[test]
    fn body_honours_overrides() {
        let opts = GenerateOptions {
            model: Some("llama3".into()),
            temperature: Some(0.9),
        };
        let body = client().build_body("P", &opts);
        assert_eq!(body["model"], "llama3");
        assert_eq!(body["temperature"], serde_json::json!(0.9));
    }
}
