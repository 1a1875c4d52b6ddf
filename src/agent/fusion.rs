//! Fusion agent: merges the initial analysis with web search results.
//!
//! Fusion is an enhancement. Any failure returns the initial analysis
//! unchanged so an answer already obtained is never lost.

use async_trait::async_trait;

use super::config::AgentConfig;
use super::outcome::SearchResult;
use super::prompt::build_fusion_prompt;
use super::provider::LlmProvider;
use super::traits::Agent;

/// Agent that fuses analysis and search snippets into one answer.
pub struct FusionAgent {
    model: String,
    max_tokens: u32,
    system_prompt: String,
}

impl FusionAgent {
    /// Creates a new fusion agent with the given configuration and system prompt.
    #[must_use]
    pub fn new(config: &AgentConfig, system_prompt: String) -> Self {
        Self {
            model: config.fusion_model.clone(),
            max_tokens: config.fusion_max_tokens,
            system_prompt,
        }
    }

    /// Produces the enhanced answer, or `initial_analysis` on failure.
    pub async fn fuse(
        &self,
        provider: &dyn LlmProvider,
        initial_analysis: &str,
        results: &[SearchResult],
        user_instruction: &str,
    ) -> String {
        let user_msg = build_fusion_prompt(initial_analysis, results, user_instruction);

        match self.execute(provider, &user_msg).await {
            Ok(response) if !response.content.trim().is_empty() => response.content,
            Ok(_) => {
                tracing::warn!(model = %self.model, "fusion returned no content, keeping initial analysis");
                initial_analysis.to_string()
            }
            Err(e) => {
                tracing::warn!(error = %e, "fusion failed, keeping initial analysis");
                initial_analysis.to_string()
            }
        }
    }
}

#[async_trait]
impl Agent for FusionAgent {
    fn name(&self) -> &'static str {
        "fusion"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    fn temperature(&self) -> f32 {
        0.3
    }

    fn max_tokens(&self) -> u32 {
        self.max_tokens
    }
}
