//! Shared helpers for model clients.

use cm_domain::ModelError;

/// Convert a [`reqwest::Error`] into [`ModelError::Transport`].
///
/// Timeouts are called out explicitly so the transcript says why the call
/// gave up.
pub(crate) fn from_reqwest(e: reqwest::Error) -> ModelError {
    if e.is_timeout() {
        ModelError::Transport(format!("timed out: {e}"))
    } else {
        ModelError::Transport(e.to_string())
    }
}

/// Derive the daemon's base URL (`scheme://host:port`) from the generation
/// endpoint URL.
pub(crate) fn base_url(endpoint: &str) -> Result<reqwest::Url, ModelError> {
    let mut url = reqwest::Url::parse(endpoint)
        .map_err(|e| ModelError::Transport(format!("invalid endpoint '{endpoint}': {e}")))?;
    url.set_path("/");
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}
