//! Typed errors for the search pipeline.
//!
//! Each layer has its own error type:
//! - [`SourceError`]: one provider call failed (transport, status, parse, credential).
//!   Adapters turn these into per-source failure markers in the report.
//! - [`CategoryError`]: a whole adapter misbehaved outside its per-source handling.
//!   The aggregator records it as a category-wide failure.
//! - [`ConfigError`] / [`RequestError`]: invalid inputs, reported before any search starts.
//! - [`OutputError`]: the report could not be persisted.

use thiserror::Error;

/// A single provider call failed.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Network-level failure (DNS, connect, timeout, body read).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The remote answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// The remote answered 429.
    #[error("rate limited by {host}")]
    RateLimited { host: String },

    /// The response body did not have the expected shape.
    #[error("parse error: {0}")]
    Parse(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::DeError),

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The provider needs a credential that was not supplied.
    #[error("missing credential {credential}")]
    MissingCredential { credential: &'static str },

    /// The provider found nothing to search against (e.g. no author profile).
    #[error("no match: {0}")]
    NoMatch(String),

    /// A retried provider did not finish within its time budget.
    #[error("no answer within {}ms", .0.as_millis())]
    Deadline(std::time::Duration),

    /// Every attempt behind this source failed.
    #[error("all attempts failed: {}", .attempts.join("; "))]
    Exhausted { attempts: Vec<String> },
}

impl SourceError {
    /// Whether retrying the same request could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            SourceError::Transport(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            SourceError::Status { status, .. } => *status >= 500,
            SourceError::RateLimited { .. } => true,
            _ => false,
        }
    }
}

/// An adapter failed as a whole.
#[derive(Debug, Error)]
pub enum CategoryError {
    /// The adapter panicked while searching.
    #[error("adapter panicked: {0}")]
    Panicked(String),

    /// The adapter reported an internal failure.
    #[error("adapter failed: {0}")]
    Internal(String),
}

/// Configuration could not be loaded or is not usable.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid config field `{field}`: {reason}")]
    Invalid { field: String, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// A search request was rejected before it started.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("person name must not be empty")]
    EmptyName,

    #[error("per-source limit must be at least 1")]
    ZeroLimit,
}

/// Persisting or rendering the report failed.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transience() {
        let server = SourceError::Status {
            status: 503,
            url: "https://example.com".to_string(),
        };
        let missing = SourceError::Status {
            status: 404,
            url: "https://example.com".to_string(),
        };
        assert!(server.is_transient());
        assert!(!missing.is_transient());
    }

    #[test]
    fn test_credential_and_parse_errors_are_not_transient() {
        assert!(!SourceError::MissingCredential { credential: "TAVILY_API_KEY" }.is_transient());
        assert!(!SourceError::Parse("bad".to_string()).is_transient());
        assert!(SourceError::RateLimited { host: "api.tavily.com".to_string() }.is_transient());
    }

    #[test]
    fn test_exhausted_message_lists_attempts() {
        let e = SourceError::Exhausted {
            attempts: vec!["tavily: HTTP 500".to_string(), "google: timeout".to_string()],
        };
        assert_eq!(
            e.to_string(),
            "all attempts failed: tavily: HTTP 500; google: timeout"
        );
    }
}
