//! Error taxonomy for a review run.
//!
//! Only [`ConfigError`] is fatal. [`FetchError`] is isolated to the store
//! that raised it, and [`WebhookError`] only skips the one delivery that
//! failed. Watermark read problems never surface as errors at all: the
//! store logs them and falls back to epoch-zero.

use thiserror::Error;

/// Invalid or incomplete configuration. Detected before any fetch.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid store selection '{0}': choose apple, google, or both")]
    InvalidStore(String),

    #[error("{what} is required (set {env} or [{section}] in the config file)")]
    Missing {
        what: &'static str,
        env: &'static str,
        section: &'static str,
    },

    #[error("unknown time zone '{0}'")]
    TimeZone(String),

    #[error("invalid watermark strategy '{0}': choose now or max_seen")]
    InvalidStrategy(String),

    #[error("{0}")]
    Invalid(String),
}

/// A store fetch failed. The run continues with zero records from that store.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Parse(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A single webhook delivery failed. Logged and skipped.
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("webhook returned HTTP {0}")]
    Status(u16),

    #[error("webhook rejected the message: {0}")]
    Rejected(String),
}

/// Truncate a response body for inclusion in an error message.
pub(crate) fn snippet(body: &str) -> String {
    body.chars().take(500).collect()
}
