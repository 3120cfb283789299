pub mod ask;
pub mod chat;
pub mod config;

use clap::{Parser, Subcommand};

/// CodeMitra: a local code-teaching assistant relay for Ollama-style
/// inference daemons.
#[derive(Debug, Parser)]
#[command(name = "codemitra", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the HTTP relay (default when no subcommand is given).
    Serve,
    /// Interactive multi-turn chat in the terminal.
    Chat {
        /// Session key (defaults to "cli:chat").
        #[arg(long, default_value = "cli:chat")]
        session: String,
        /// Model override.
        #[arg(long)]
        model: Option<String>,
    },
    /// Ask a single question and print the answer.
    Ask {
        /// The question to send.
        prompt: String,
        #[command(flatten)]
        output: OneShotArgs,
    },
    /// Explain a piece of code read from a file (or `-` for stdin).
    Explain {
        /// Path to the source file, or `-` to read stdin.
        file: String,
        #[command(flatten)]
        output: OneShotArgs,
    },
    /// Generate code from a description.
    Generate {
        /// What the code should do.
        description: String,
        #[command(flatten)]
        output: OneShotArgs,
    },
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Print version information.
    Version,
}

/// Flags shared by the one-shot commands.
#[derive(Debug, Clone, clap::Args)]
pub struct OneShotArgs {
    /// Model override.
    #[arg(long)]
    pub model: Option<String>,
    /// Print `{"answer": ...}` instead of plain text.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

// ── Config loading helper ─────────────────────────────────────────────

/// Load the configuration from the path in `CM_CONFIG` (or `config.toml`
/// by default). A missing file means all defaults. Returns the parsed
/// [`Config`](cm_domain::config::Config) and the path that was used.
pub fn load_config() -> anyhow::Result<(cm_domain::config::Config, String)> {
    let config_path = std::env::var("CM_CONFIG").unwrap_or_else(|_| "config.toml".into());

    let config = if std::path::Path::new(&config_path).exists() {
        let raw = std::fs::read_to_string(&config_path)
            .map_err(|e| anyhow::anyhow!("reading {config_path}: {e}"))?;
        toml::from_str(&raw).map_err(|e| anyhow::anyhow!("parsing {config_path}: {e}"))?
    } else {
        cm_domain::config::Config::default()
    };

    Ok((config, config_path))
}
