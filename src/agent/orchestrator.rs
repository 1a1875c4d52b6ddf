//! Orchestrator for the two-phase analysis pipeline.
//!
//! Coordinates the full pipeline: vision analysis → search decision →
//! (conditional) web search → answer fusion. The pipeline graph has no
//! cycle, so at most one search round can ever run.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info};

use super::config::AgentConfig;
use super::decider::DeciderAgent;
use super::fusion::FusionAgent;
use super::message::{ChatRequest, user_message};
use super::outcome::{AgentOutcome, AnalysisRequest};
use super::prompt::PromptSet;
use super::provider::LlmProvider;
use super::vision::VisionAgent;
use crate::error::AgentError;
use crate::search::{ServiceStatus, WebSearch};

/// Structural ceiling on pipeline rounds (analysis, then at most one search round).
pub const MAX_ITERATIONS: u8 = 2;

/// Max tokens for the model connectivity check.
const HEALTH_PING_MAX_TOKENS: u32 = 5;

/// Pipeline states, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    /// Request accepted, nothing run yet.
    Init,
    /// Initial vision analysis obtained.
    Analyzed,
    /// Search decision made.
    Decided,
    /// Web search and fusion done.
    Searched,
    /// Outcome emitted.
    Done,
}

/// Dependency connectivity report.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    /// Model API status.
    pub openai: ServiceStatus,
    /// Search API status.
    pub tavily: ServiceStatus,
    /// `"operational"` when the model API answers, `"error"` otherwise.
    pub agent_service: &'static str,
    /// Model API failure message, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HealthReport {
    /// Whether the pipeline can serve requests.
    #[must_use]
    pub fn is_operational(&self) -> bool {
        self.openai == ServiceStatus::Connected
    }
}

/// Orchestrates the analysis pipeline.
///
/// Holds the process-wide provider and search clients; safe to share
/// across concurrent requests behind an `Arc`.
pub struct Orchestrator {
    provider: Arc<dyn LlmProvider>,
    search: Arc<dyn WebSearch>,
    config: AgentConfig,
    prompts: PromptSet,
}

impl Orchestrator {
    /// Creates a new orchestrator with the given provider, search backend and configuration.
    ///
    /// Loads prompt templates from the directory specified in
    /// [`AgentConfig::prompt_dir`], falling back to compiled-in defaults.
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        search: Arc<dyn WebSearch>,
        config: AgentConfig,
    ) -> Self {
        let prompts = PromptSet::load(config.prompt_dir.as_deref());
        Self {
            provider,
            search,
            config,
            prompts,
        }
    }

    /// Replaces the prompt set.
    #[must_use]
    pub fn with_prompts(mut self, prompts: PromptSet) -> Self {
        self.prompts = prompts;
        self
    }

    /// The configuration this orchestrator runs with.
    #[must_use]
    pub const fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Runs the full pipeline for one request.
    ///
    /// # Steps
    ///
    /// 1. Initial analysis via [`VisionAgent`] (failure aborts the request)
    /// 2. Search decision via [`DeciderAgent`] (never fails)
    /// 3. If search is warranted: web search, then fusion via [`FusionAgent`]
    ///    (skipped when search returned nothing; falls back to the initial
    ///    analysis on failure)
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Upstream`] when the vision call fails.
    pub async fn analyze(&self, request: &AnalysisRequest) -> Result<AgentOutcome, AgentError> {
        let start = Instant::now();
        let instruction = request.instruction();
        let mut stage = PipelineStage::Init;
        debug!(?stage, image_bytes = request.image().len(), "pipeline started");

        // Init → Analyzed
        let vision = VisionAgent::new(&self.config, self.prompts.vision.clone());
        let initial = vision.analyze(&*self.provider, request).await?;
        stage = PipelineStage::Analyzed;
        debug!(?stage, chars = initial.len(), "initial analysis complete");

        // Analyzed → Decided
        let decider = DeciderAgent::new(&self.config, self.prompts.decider.clone());
        let decision = decider.decide(&*self.provider, &initial, instruction).await;
        stage = PipelineStage::Decided;
        debug!(
            ?stage,
            should_search = decision.should_search,
            reasoning = %decision.reasoning,
            "search decision made"
        );

        let outcome = match decision.query() {
            None => AgentOutcome::direct(initial),
            Some(query) => {
                info!(query, "web search needed");
                let results = self.search.search(query).await;

                let answer = if results.is_empty() {
                    debug!("search returned nothing, skipping fusion");
                    initial
                } else {
                    let fusion = FusionAgent::new(&self.config, self.prompts.fusion.clone());
                    fusion
                        .fuse(&*self.provider, &initial, &results, instruction)
                        .await
                };
                stage = PipelineStage::Searched;
                debug!(?stage, results = results.len(), "enrichment complete");

                AgentOutcome::enriched(
                    answer,
                    query.to_string(),
                    results,
                    self.config.surfaced_results,
                )
            }
        };

        debug_assert!(outcome.iterations_used() <= MAX_ITERATIONS);
        stage = PipelineStage::Done;
        info!(
            ?stage,
            web_search_used = outcome.web_search_used(),
            iterations = outcome.iterations_used(),
            elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            "analysis complete"
        );

        Ok(outcome)
    }

    /// Checks the model API and the search backend.
    pub async fn health(&self) -> HealthReport {
        let ping = ChatRequest {
            model: self.config.decision_model.clone(),
            messages: vec![user_message("Hello")],
            temperature: None,
            max_tokens: Some(HEALTH_PING_MAX_TOKENS),
            json_mode: false,
        };

        match self.provider.chat(&ping).await {
            Ok(_) => HealthReport {
                openai: ServiceStatus::Connected,
                tavily: self.search.ping().await,
                agent_service: "operational",
                error: None,
            },
            Err(e) => HealthReport {
                openai: ServiceStatus::Error,
                tavily: ServiceStatus::Unknown,
                agent_service: "error",
                error: Some(e.to_string()),
            },
        }
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("provider", &self.provider.name())
            .field("search", &self.search.name())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
