use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Observability
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Optional OpenTelemetry export for the `serve` command.
///
/// Without `otlp_endpoint` the relay only writes structured JSON logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// OTLP gRPC endpoint (e.g. `http://localhost:4317`).
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
    #[serde(default = "d_service_name")]
    pub service_name: String,
    /// `TraceIdRatioBased` sampling rate, `0.0..=1.0`.
    #[serde(default = "d_sample_rate")]
    pub sample_rate: f64,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            otlp_endpoint: None,
            service_name: d_service_name(),
            sample_rate: d_sample_rate(),
        }
    }
}

fn d_service_name() -> String {
    "codemitra".into()
}

fn d_sample_rate() -> f64 {
    1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_disabled_by_default() {
        let cfg: ObservabilityConfig = toml::from_str("").unwrap();
        assert!(cfg.otlp_endpoint.is_none());
        assert_eq!(cfg.service_name, "codemitra");
        assert!((cfg.sample_rate - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn endpoint_and_rate_parse() {
        let cfg: ObservabilityConfig = toml::from_str(
            r#"
            otlp_endpoint = "http://otel:4317"
            sample_rate = 0.25
        "#,
        )
        .unwrap();
        assert_eq!(cfg.otlp_endpoint.as_deref(), Some("http://otel:4317"));
        assert!((cfg.sample_rate - 0.25).abs() < f64::EPSILON);
    }
}
