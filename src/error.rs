//! Error types for camgpt-rs.
//!
//! [`AgentError`] covers the analysis pipeline and its upstream
//! collaborators. [`CommandError`] wraps failures surfaced by the CLI.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Classification of a failed upstream model call.
///
/// The HTTP layer maps these to specific status codes, so the
/// classification must survive every layer between the provider
/// and the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpstreamKind {
    /// The account has run out of quota or credit.
    QuotaExceeded,
    /// The API key was rejected.
    InvalidCredentials,
    /// Timeouts, rate limits and connection failures.
    Transient,
    /// Anything the provider reported that fits none of the above.
    Other,
}

impl UpstreamKind {
    /// Wire name of this kind (`"quota_exceeded"`, ...).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::QuotaExceeded => "quota_exceeded",
            Self::InvalidCredentials => "invalid_credentials",
            Self::Transient => "transient",
            Self::Other => "other",
        }
    }

    /// Classifies a provider error code (e.g. `"insufficient_quota"`).
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        match code {
            "insufficient_quota" | "quota_exceeded" | "billing_hard_limit_reached" => {
                Self::QuotaExceeded
            }
            "invalid_api_key" | "invalid_credentials" | "invalid_authentication" => {
                Self::InvalidCredentials
            }
            "rate_limit_exceeded" => Self::Transient,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for UpstreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors produced by the agent pipeline.
#[derive(Debug, Error)]
pub enum AgentError {
    /// No model API key was configured.
    #[error("API key missing: set OPENAI_API_KEY")]
    ApiKeyMissing,

    /// The configured provider name has no implementation.
    #[error("unsupported provider: {name}")]
    UnsupportedProvider {
        /// Provider name as configured.
        name: String,
    },

    /// An upstream model call failed.
    #[error("upstream model error ({kind}): {message}")]
    Upstream {
        /// Failure classification.
        kind: UpstreamKind,
        /// Provider message.
        message: String,
    },

    /// The model response could not be interpreted.
    #[error("failed to parse model response: {message}")]
    ResponseParse {
        /// What went wrong.
        message: String,
        /// Raw model output.
        content: String,
    },

    /// The inbound analysis request was malformed.
    #[error("invalid request: {message}")]
    InvalidRequest {
        /// What was wrong with it.
        message: String,
    },
}

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The command ran but failed.
    #[error("{0}")]
    ExecutionFailed(String),

    /// An argument was rejected before execution.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Filesystem failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Pipeline failure.
    #[error(transparent)]
    Agent(#[from] AgentError),
}

/// Result alias used by the CLI layer.
pub type Result<T, E = CommandError> = std::result::Result<T, E>;
