//! Web search collaborators.
//!
//! Search is an optional enhancement: implementations of [`WebSearch`]
//! never fail. Unavailability, timeouts and provider errors all surface
//! as an empty result list.

pub mod tavily;

use async_trait::async_trait;
use serde::Serialize;

pub use crate::agent::outcome::SearchResult;
pub use tavily::TavilyClient;

/// Connectivity of a dependency as reported by the health endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    /// Reachable and accepting requests.
    Connected,
    /// Configured but failing.
    Error,
    /// No credential configured.
    NotConfigured,
    /// Not checked yet.
    Unknown,
}

impl ServiceStatus {
    /// Wire name of this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::Error => "error",
            Self::NotConfigured => "not_configured",
            Self::Unknown => "unknown",
        }
    }
}

/// A web search backend.
#[async_trait]
pub trait WebSearch: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &'static str;

    /// Whether a credential is configured. Unconfigured backends return no results.
    fn is_configured(&self) -> bool;

    /// Runs a query and returns provider-ranked results.
    ///
    /// Returns an empty vector on any failure.
    async fn search(&self, query: &str) -> Vec<SearchResult>;

    /// Checks the backend for the health endpoint.
    async fn ping(&self) -> ServiceStatus;
}
