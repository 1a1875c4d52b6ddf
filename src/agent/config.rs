//! Agent configuration with builder pattern and environment variable support.
//!
//! Configuration is resolved in order: explicit values → environment variables → defaults.

use std::path::PathBuf;
use std::time::Duration;

use super::outcome::MAX_SURFACED_RESULTS;
use crate::error::AgentError;

/// Default model for the initial image analysis.
const DEFAULT_VISION_MODEL: &str = "gpt-4o";
/// Default model for the search decision.
const DEFAULT_DECISION_MODEL: &str = "gpt-4o-mini";
/// Default model for answer fusion.
const DEFAULT_FUSION_MODEL: &str = "gpt-4o";
/// Default vision max tokens.
const DEFAULT_VISION_MAX_TOKENS: u32 = 500;
/// Default decision max tokens.
const DEFAULT_DECISION_MAX_TOKENS: u32 = 200;
/// Default fusion max tokens.
const DEFAULT_FUSION_MAX_TOKENS: u32 = 600;
/// Default timeout for a single model call in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 60;
/// Default web search timeout in seconds.
const DEFAULT_SEARCH_TIMEOUT_SECS: u64 = 10;
/// Default number of results requested from the search provider.
const DEFAULT_SEARCH_MAX_RESULTS: usize = 5;
/// Default number of search results surfaced to the caller.
const DEFAULT_SURFACED_RESULTS: usize = 3;
/// Default search provider endpoint.
pub const DEFAULT_SEARCH_BASE_URL: &str = "https://api.tavily.com";

/// Configuration for the analysis pipeline.
#[derive(Clone)]
pub struct AgentConfig {
    /// LLM provider name (e.g., "openai").
    pub provider: String,
    /// API key for the model provider.
    pub api_key: String,
    /// Optional base URL override (for proxies or compatible APIs).
    pub base_url: Option<String>,
    /// Multimodal model used for the initial analysis.
    pub vision_model: String,
    /// Small text model used for the search decision.
    pub decision_model: String,
    /// Text model used to fuse analysis and search results.
    pub fusion_model: String,
    /// Maximum tokens for the vision response.
    pub vision_max_tokens: u32,
    /// Maximum tokens for the decision response.
    pub decision_max_tokens: u32,
    /// Maximum tokens for the fusion response.
    pub fusion_max_tokens: u32,
    /// Upper bound on any single model call.
    pub timeout: Duration,
    /// Search provider API key. Web search is disabled when absent.
    pub search_api_key: Option<String>,
    /// Search provider endpoint.
    pub search_base_url: String,
    /// Timeout for one search request.
    pub search_timeout: Duration,
    /// Results requested from the search provider.
    pub search_max_results: usize,
    /// Results included in the outcome for transparency.
    pub surfaced_results: usize,
    /// Directory containing prompt template files.
    ///
    /// When set, system prompts are loaded from markdown files in this
    /// directory, falling back to compiled-in defaults for any missing files.
    pub prompt_dir: Option<PathBuf>,
}

impl AgentConfig {
    /// Creates a new builder for `AgentConfig`.
    #[must_use]
    pub fn builder() -> AgentConfigBuilder {
        AgentConfigBuilder::default()
    }

    /// Creates configuration from environment variables with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ApiKeyMissing`] if no API key is found.
    pub fn from_env() -> Result<Self, AgentError> {
        Self::builder().from_env().build()
    }

    /// Whether a search provider credential is configured.
    #[must_use]
    pub const fn search_enabled(&self) -> bool {
        self.search_api_key.is_some()
    }
}

impl std::fmt::Debug for AgentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentConfig")
            .field("provider", &self.provider)
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("vision_model", &self.vision_model)
            .field("decision_model", &self.decision_model)
            .field("fusion_model", &self.fusion_model)
            .field("timeout", &self.timeout)
            .field("search_enabled", &self.search_enabled())
            .field("search_base_url", &self.search_base_url)
            .field("search_timeout", &self.search_timeout)
            .field("prompt_dir", &self.prompt_dir)
            .finish_non_exhaustive()
    }
}

/// Builder for [`AgentConfig`].
#[derive(Debug, Clone, Default)]
pub struct AgentConfigBuilder {
    provider: Option<String>,
    api_key: Option<String>,
    base_url: Option<String>,
    vision_model: Option<String>,
    decision_model: Option<String>,
    fusion_model: Option<String>,
    vision_max_tokens: Option<u32>,
    decision_max_tokens: Option<u32>,
    fusion_max_tokens: Option<u32>,
    timeout: Option<Duration>,
    search_api_key: Option<String>,
    search_base_url: Option<String>,
    search_timeout: Option<Duration>,
    search_max_results: Option<usize>,
    surfaced_results: Option<usize>,
    prompt_dir: Option<PathBuf>,
}

/// Reads an environment variable, treating blank values as unset.
pub(crate) fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl AgentConfigBuilder {
    /// Populates unset fields from environment variables.
    #[must_use]
    pub fn from_env(mut self) -> Self {
        if self.provider.is_none() {
            self.provider = env_nonempty("CAMGPT_PROVIDER");
        }
        if self.api_key.is_none() {
            self.api_key = env_nonempty("OPENAI_API_KEY");
        }
        if self.base_url.is_none() {
            self.base_url = env_nonempty("OPENAI_BASE_URL");
        }
        if self.vision_model.is_none() {
            self.vision_model = env_nonempty("CAMGPT_VISION_MODEL");
        }
        if self.decision_model.is_none() {
            self.decision_model = env_nonempty("CAMGPT_DECISION_MODEL");
        }
        if self.fusion_model.is_none() {
            self.fusion_model = env_nonempty("CAMGPT_FUSION_MODEL");
        }
        if self.timeout.is_none() {
            self.timeout = env_nonempty("CAMGPT_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs);
        }
        if self.search_api_key.is_none() {
            self.search_api_key = env_nonempty("TAVILY_API_KEY");
        }
        if self.search_base_url.is_none() {
            self.search_base_url = env_nonempty("TAVILY_BASE_URL");
        }
        if self.prompt_dir.is_none() {
            self.prompt_dir = env_nonempty("CAMGPT_PROMPT_DIR").map(PathBuf::from);
        }
        self
    }

    /// Sets the LLM provider name.
    #[must_use]
    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Sets the API key.
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the base URL override.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the vision model.
    #[must_use]
    pub fn vision_model(mut self, model: impl Into<String>) -> Self {
        self.vision_model = Some(model.into());
        self
    }

    /// Sets the decision model.
    #[must_use]
    pub fn decision_model(mut self, model: impl Into<String>) -> Self {
        self.decision_model = Some(model.into());
        self
    }

    /// Sets the fusion model.
    #[must_use]
    pub fn fusion_model(mut self, model: impl Into<String>) -> Self {
        self.fusion_model = Some(model.into());
        self
    }

    /// Sets the vision max tokens.
    #[must_use]
    pub const fn vision_max_tokens(mut self, n: u32) -> Self {
        self.vision_max_tokens = Some(n);
        self
    }

    /// Sets the decision max tokens.
    #[must_use]
    pub const fn decision_max_tokens(mut self, n: u32) -> Self {
        self.decision_max_tokens = Some(n);
        self
    }

    /// Sets the fusion max tokens.
    #[must_use]
    pub const fn fusion_max_tokens(mut self, n: u32) -> Self {
        self.fusion_max_tokens = Some(n);
        self
    }

    /// Sets the model call timeout.
    #[must_use]
    pub const fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Sets the search provider API key.
    #[must_use]
    pub fn search_api_key(mut self, key: impl Into<String>) -> Self {
        self.search_api_key = Some(key.into());
        self
    }

    /// Sets the search provider endpoint.
    #[must_use]
    pub fn search_base_url(mut self, url: impl Into<String>) -> Self {
        self.search_base_url = Some(url.into());
        self
    }

    /// Sets the search request timeout.
    #[must_use]
    pub const fn search_timeout(mut self, duration: Duration) -> Self {
        self.search_timeout = Some(duration);
        self
    }

    /// Sets the number of results requested from the search provider.
    #[must_use]
    pub const fn search_max_results(mut self, n: usize) -> Self {
        self.search_max_results = Some(n);
        self
    }

    /// Sets the number of results surfaced in the outcome.
    ///
    /// Values above [`MAX_SURFACED_RESULTS`] are clamped at build time.
    #[must_use]
    pub const fn surfaced_results(mut self, n: usize) -> Self {
        self.surfaced_results = Some(n);
        self
    }

    /// Sets the prompt template directory.
    #[must_use]
    pub fn prompt_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.prompt_dir = Some(dir.into());
        self
    }

    /// Builds the [`AgentConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ApiKeyMissing`] if no API key was set.
    pub fn build(self) -> Result<AgentConfig, AgentError> {
        let api_key = self.api_key.ok_or(AgentError::ApiKeyMissing)?;

        Ok(AgentConfig {
            provider: self.provider.unwrap_or_else(|| "openai".to_string()),
            api_key,
            base_url: self.base_url,
            vision_model: self
                .vision_model
                .unwrap_or_else(|| DEFAULT_VISION_MODEL.to_string()),
            decision_model: self
                .decision_model
                .unwrap_or_else(|| DEFAULT_DECISION_MODEL.to_string()),
            fusion_model: self
                .fusion_model
                .unwrap_or_else(|| DEFAULT_FUSION_MODEL.to_string()),
            vision_max_tokens: self.vision_max_tokens.unwrap_or(DEFAULT_VISION_MAX_TOKENS),
            decision_max_tokens: self
                .decision_max_tokens
                .unwrap_or(DEFAULT_DECISION_MAX_TOKENS),
            fusion_max_tokens: self.fusion_max_tokens.unwrap_or(DEFAULT_FUSION_MAX_TOKENS),
            timeout: self
                .timeout
                .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            search_api_key: self.search_api_key.filter(|k| !k.trim().is_empty()),
            search_base_url: self
                .search_base_url
                .unwrap_or_else(|| DEFAULT_SEARCH_BASE_URL.to_string()),
            search_timeout: self
                .search_timeout
                .unwrap_or(Duration::from_secs(DEFAULT_SEARCH_TIMEOUT_SECS)),
            search_max_results: self
                .search_max_results
                .unwrap_or(DEFAULT_SEARCH_MAX_RESULTS),
            surfaced_results: self
                .surfaced_results
                .unwrap_or(DEFAULT_SURFACED_RESULTS)
                .min(MAX_SURFACED_RESULTS),
            prompt_dir: self.prompt_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = AgentConfig::builder()
            .api_key("test-key")
            .build()
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(config.provider, "openai");
        assert_eq!(config.api_key, "test-key");
        assert_eq!(config.vision_model, "gpt-4o");
        assert_eq!(config.decision_model, "gpt-4o-mini");
        assert_eq!(config.fusion_model, "gpt-4o");
        assert_eq!(config.vision_max_tokens, 500);
        assert_eq!(config.decision_max_tokens, 200);
        assert_eq!(config.fusion_max_tokens, 600);
        assert_eq!(config.search_timeout, Duration::from_secs(10));
        assert_eq!(config.search_max_results, 5);
        assert_eq!(config.surfaced_results, 3);
        assert!(!config.search_enabled());
    }

    #[test]
    fn test_builder_clamps_surfaced_results() {
        let config = AgentConfig::builder()
            .api_key("key")
            .surfaced_results(10)
            .build()
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(config.surfaced_results, MAX_SURFACED_RESULTS);
    }

    #[test]
    fn test_builder_missing_api_key() {
        let result = AgentConfig::builder().build();
        assert!(matches!(result, Err(AgentError::ApiKeyMissing)));
    }

    #[test]
    fn test_builder_custom_values() {
        let config = AgentConfig::builder()
            .api_key("key")
            .provider("custom")
            .vision_model("gpt-4.1")
            .search_api_key("tvly-123")
            .search_base_url("http://localhost:9999")
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(config.provider, "custom");
        assert_eq!(config.vision_model, "gpt-4.1");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.search_base_url, "http://localhost:9999");
        assert!(config.search_enabled());
    }

    #[test]
    fn test_blank_search_key_disables_search() {
        let config = AgentConfig::builder()
            .api_key("key")
            .search_api_key("   ")
            .build()
            .unwrap_or_else(|_| unreachable!());
        assert!(!config.search_enabled());
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = AgentConfig::builder()
            .api_key("sk-secret")
            .build()
            .unwrap_or_else(|_| unreachable!());
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("<redacted>"));
    }
}
