/// Setup-time error shared across CodeMitra crates.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("HTTP: {0}")]
    Http(String),

    #[error("config: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Maximum number of characters of a non-JSON body kept in
/// [`ModelError::Decode`].
pub const DECODE_PREFIX_CHARS: usize = 1000;

/// Failure of a single call to the inference daemon.
///
/// Every variant renders to a human-readable message, which is what ends up
/// in the chat transcript or in the `answer` field of `/ask`.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// Connection refused, DNS failure, timeout or a broken body stream.
    #[error("Request failed: {0}")]
    Transport(String),

    /// The daemon answered with a non-200 status.
    #[error("Error from server (status {status}): {body}")]
    Server { status: u16, body: String },

    /// The body was not valid JSON. Only a bounded prefix is kept.
    #[error("Invalid JSON returned: {body_prefix}")]
    Decode { body_prefix: String },

    /// Valid JSON, but none of the recognised text fields were present.
    #[error("No 'response' in model output: {body}")]
    Schema { body: serde_json::Value },
}

impl ModelError {
    /// Build a [`ModelError::Decode`] from a raw body, keeping at most
    /// [`DECODE_PREFIX_CHARS`] characters.
    pub fn decode(raw: &str) -> Self {
        Self::Decode {
            body_prefix: raw.chars().take(DECODE_PREFIX_CHARS).collect(),
        }
    }

    /// Short machine-friendly name of the failure kind (used in trace events).
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Server { .. } => "server",
            Self::Decode { .. } => "decode",
            Self::Schema { .. } => "schema",
        }
    }
}
