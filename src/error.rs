use std::path::PathBuf;

use thiserror::Error;

// Errors raised while talking to the remote model API.
#[derive(Debug, Error)]
pub enum AIError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error), // Transport level failures (DNS, TLS, timeouts).

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String }, // Non-2xx answer from the provider.

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("The model returned no content")]
    EmptyResponse,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AIError {
    /// Whether a retry has a chance of succeeding.
    pub fn is_retryable(&self) -> bool {
        match self {
            AIError::Api { status, message } => {
                matches!(status, 429 | 500 | 502 | 503 | 504) || looks_transient(message)
            }
            AIError::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// Authentication failures only show up here, at call time.
    pub fn is_auth_error(&self) -> bool {
        match self {
            AIError::Api {
                status: 401 | 403, ..
            } => true,
            AIError::Api {
                status: 400,
                message,
            } => message.to_lowercase().contains("api key"),
            _ => false,
        }
    }
}

fn looks_transient(message: &str) -> bool {
    let lower = message.to_lowercase();
    ["rate limit", "rate-limit", "quota", "overloaded", "unavailable", "resource_exhausted"]
        .iter()
        .any(|needle| lower.contains(needle))
}

// Errors raised while loading or composing instruction templates.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Unknown persona: {0}")]
    UnknownPersona(String),

    #[error("Template {name} has {found} occurrence(s) of {placeholder}")]
    Placeholder {
        name: String,
        placeholder: &'static str,
        found: usize,
    },

    #[error("Failed to read template {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Could not find the home directory")]
    NoHomeDir,

    #[error("Could not create log directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("Logger already set")]
    AlreadySet,
}

pub type Result<T, E = AIError> = std::result::Result<T, E>;
