//! Error types for blocklister.

use std::time::Duration;
use thiserror::Error;

/// Failure while collecting routes from one upstream.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Connection to {target} failed: {source}")]
    Connect {
        target: String,
        #[source]
        source: std::io::Error,
    },

    #[error("No complete response from {target} within {}s", .after.as_secs_f64())]
    Timeout { target: String, after: Duration },

    #[error("Protocol error from {target}: {message}")]
    Protocol { target: String, message: String },

    #[error("Network error fetching {url}: {message}")]
    Network { url: String, message: String },

    #[error("Parse error in response from {url}: {message}")]
    Parse { url: String, message: String },
}

impl FetchError {
    /// Short stable label used in diagnostics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Connect { .. } => "connect",
            FetchError::Timeout { .. } => "timeout",
            FetchError::Protocol { .. } => "protocol",
            FetchError::Network { .. } => "network",
            FetchError::Parse { .. } => "parse",
        }
    }
}

/// A fetch failure attributed to a configured source.
#[derive(Error, Debug)]
#[error("Source '{source_name}' failed ({}): {error}", .error.kind())]
pub struct SourceError {
    pub source_name: String,
    #[source]
    pub error: FetchError,
}
