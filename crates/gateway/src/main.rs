use std::sync::Arc;

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use clap::Parser;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::WithExportConfig as _;

use cm_domain::config::{Config, CorsConfig, ObservabilityConfig};
use cm_gateway::api;
use cm_gateway::bootstrap;
use cm_gateway::cli::{self, Cli, Command, ConfigCommand};
use cm_sessions::PromptTemplate;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    match args.command {
        // Default to serve when no subcommand is given.
        None | Some(Command::Serve) => {
            let (config, config_path) = cli::load_config()?;
            let tracer_provider = init_tracing(&config.observability);
            run_server(Arc::new(config), config_path, tracer_provider).await
        }
        Some(Command::Chat { session, model }) => {
            init_cli_tracing();
            let (config, _) = cli::load_config()?;
            cli::chat::chat(Arc::new(config), session, model).await
        }
        Some(Command::Ask { prompt, output }) => {
            init_cli_tracing();
            let (config, _) = cli::load_config()?;
            cli::ask::run(Arc::new(config), PromptTemplate::Ask, &prompt, output).await
        }
        Some(Command::Explain { file, output }) => {
            init_cli_tracing();
            let (config, _) = cli::load_config()?;
            let code = cli::ask::read_source(&file)?;
            cli::ask::run(Arc::new(config), PromptTemplate::Explain, &code, output).await
        }
        Some(Command::Generate { description, output }) => {
            init_cli_tracing();
            let (config, _) = cli::load_config()?;
            cli::ask::run(Arc::new(config), PromptTemplate::Generate, &description, output).await
        }
        Some(Command::Config(ConfigCommand::Validate)) => {
            let (config, config_path) = cli::load_config()?;
            if !cli::config::validate(&config, &config_path) {
                std::process::exit(1);
            }
            Ok(())
        }
        Some(Command::Config(ConfigCommand::Show)) => {
            let (config, _) = cli::load_config()?;
            cli::config::show(&config)
        }
        Some(Command::Version) => {
            println!("codemitra {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Initialize structured JSON tracing (only for the `serve` command).
///
/// When `otlp_endpoint` is configured, an OpenTelemetry layer is added
/// so that every `tracing` span is also exported via OTLP/gRPC. The
/// returned provider must be shut down on exit to flush pending spans.
fn init_tracing(
    obs: &ObservabilityConfig,
) -> Option<opentelemetry_sdk::trace::SdkTracerProvider> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,cm_gateway=debug"));

    let fmt_layer = tracing_subscriber::fmt::layer().json();

    let Some(endpoint) = &obs.otlp_endpoint else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .init();
        return None;
    };

    let exporter = match opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()
    {
        Ok(e) => e,
        Err(e) => {
            eprintln!(
                "WARNING: failed to create OTLP exporter for {endpoint}: {e}; \
                 starting without OpenTelemetry"
            );
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer)
                .init();
            return None;
        }
    };

    let resource = opentelemetry_sdk::Resource::builder()
        .with_service_name(obs.service_name.clone())
        .build();

    let tracer_provider = opentelemetry_sdk::trace::SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_sampler(opentelemetry_sdk::trace::Sampler::TraceIdRatioBased(
            obs.sample_rate,
        ))
        .with_resource(resource)
        .build();

    let otel_layer =
        tracing_opentelemetry::layer().with_tracer(tracer_provider.tracer("codemitra"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(otel_layer)
        .init();

    Some(tracer_provider)
}

/// Compact stderr-only tracing for CLI commands.
///
/// Defaults to `warn` so diagnostics never mix with answers on stdout.
fn init_cli_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

/// Start the relay with the given configuration.
async fn run_server(
    config: Arc<Config>,
    config_path: String,
    tracer_provider: Option<opentelemetry_sdk::trace::SdkTracerProvider>,
) -> anyhow::Result<()> {
    tracing::info!(config = %config_path, "CodeMITRA starting");

    let state = bootstrap::build_app_state(config.clone())?;

    // Reachability is informational only; serving starts regardless.
    {
        let state = state.clone();
        tokio::spawn(async move { bootstrap::probe_model(&state).await });
    }

    let cors_layer = build_cors_layer(&config.server.cors);

    let max_concurrent = config.server.max_concurrent_requests;
    tracing::info!(max_concurrent, "concurrency limit set");

    let app = api::router()
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
        .layer(tower::limit::ConcurrencyLimitLayer::new(max_concurrent))
        .with_state(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding to {addr}"))?;

    tracing::info!(addr = %addr, "CodeMITRA listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("axum server error")?;

    if let Some(provider) = tracer_provider {
        if let Err(e) = provider.shutdown() {
            tracing::warn!(error = ?e, "OpenTelemetry tracer provider shutdown failed");
        }
    }

    tracing::info!("shutdown complete");

    Ok(())
}

/// Wait for SIGINT or SIGTERM, then return to trigger graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to register SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received SIGINT, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}

/// Build a [`CorsLayer`] from the configured allowed origins.
///
/// Entries ending in `:*` match any numeric port on that host
/// (`http://localhost:*`). Other entries ending in `*` match any origin
/// with that prefix (`vscode-webview://*`). A lone `"*"` allows everything.
fn build_cors_layer(cors: &CorsConfig) -> CorsLayer {
    use axum::http::header;

    let methods = [Method::GET, Method::POST, Method::OPTIONS];

    if cors.allowed_origins.len() == 1 && cors.allowed_origins[0] == "*" {
        tracing::warn!("CORS configured with wildcard \"*\", all origins allowed");
        return CorsLayer::new()
            .allow_origin(tower_http::cors::Any)
            .allow_methods(methods)
            .allow_headers([header::CONTENT_TYPE]);
    }

    let patterns = OriginPatterns::parse(&cors.allowed_origins);
    let allow_origin = if patterns.port_prefixes.is_empty() && patterns.prefixes.is_empty() {
        AllowOrigin::list(patterns.exact)
    } else {
        AllowOrigin::predicate(move |origin, _| patterns.matches(origin))
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(methods)
        .allow_headers([header::CONTENT_TYPE])
}

#[derive(Debug, Clone, Default)]
struct OriginPatterns {
    exact: Vec<HeaderValue>,
    /// `http://localhost:` from `http://localhost:*`.
    port_prefixes: Vec<String>,
    /// `vscode-webview://` from `vscode-webview://*`.
    prefixes: Vec<String>,
}

impl OriginPatterns {
    fn parse(origins: &[String]) -> Self {
        let mut out = Self::default();
        for origin in origins {
            if origin.ends_with(":*") {
                out.port_prefixes.push(origin.trim_end_matches('*').to_owned());
            } else if let Some(prefix) = origin.strip_suffix('*') {
                out.prefixes.push(prefix.to_owned());
            } else if let Ok(hv) = origin.parse::<HeaderValue>() {
                out.exact.push(hv);
            } else {
                tracing::warn!(origin = %origin, "invalid CORS origin, skipping");
            }
        }
        out
    }

    fn matches(&self, origin: &HeaderValue) -> bool {
        if self.exact.iter().any(|e| e.as_bytes() == origin.as_bytes()) {
            return true;
        }
        let origin_str = origin.to_str().unwrap_or("");
        let port_match = self.port_prefixes.iter().any(|prefix| {
            origin_str
                .strip_prefix(prefix.as_str())
                .map(|port| !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()))
                .unwrap_or(false)
        });
        port_match
            || self.prefixes.iter().any(|prefix| {
                origin_str
                    .strip_prefix(prefix.as_str())
                    .is_some_and(|rest| !rest.is_empty())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterns() -> OriginPatterns {
        OriginPatterns::parse(&CorsConfig::default().allowed_origins)
    }

    fn hv(s: &str) -> HeaderValue {
        HeaderValue::from_str(s).unwrap()
    }

    #[test]
    fn localhost_any_port_is_allowed() {
        let p = patterns();
        assert!(p.matches(&hv("http://localhost:5173")));
        assert!(p.matches(&hv("http://127.0.0.1:5000")));
    }

    #[test]
    fn port_wildcard_requires_digits() {
        let p = patterns();
        assert!(!p.matches(&hv("http://localhost:")));
        assert!(!p.matches(&hv("http://localhost:80.evil.com")));
    }

    #[test]
    fn vscode_webviews_are_allowed() {
        assert!(patterns().matches(&hv("vscode-webview://1abc2def")));
    }

    #[test]
    fn foreign_origins_are_rejected() {
        let p = patterns();
        assert!(!p.matches(&hv("https://example.com")));
        assert!(!p.matches(&hv("http://localhost")));
    }

    #[test]
    fn exact_origins_match_verbatim() {
        let p = OriginPatterns::parse(&["https://tutor.example".to_string()]);
        assert!(p.matches(&hv("https://tutor.example")));
        assert!(!p.matches(&hv("https://tutor.example.evil")));
    }
}
