//! Vision agent for the initial image analysis.
//!
//! Sends the image inline as a base64 `data:` URI together with the
//! user's instruction and returns the model's free-text answer.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use super::config::AgentConfig;
use super::message::user_image_message;
use super::outcome::AnalysisRequest;
use super::provider::LlmProvider;
use super::traits::Agent;
use crate::error::AgentError;

/// Returned when the model produced no content.
pub const NO_ANALYSIS_SENTINEL: &str = "No analysis received";

/// Agent that produces the initial analysis of an image.
pub struct VisionAgent {
    model: String,
    max_tokens: u32,
    system_prompt: String,
}

impl VisionAgent {
    /// Creates a new vision agent with the given configuration and system prompt.
    #[must_use]
    pub fn new(config: &AgentConfig, system_prompt: String) -> Self {
        Self {
            model: config.vision_model.clone(),
            max_tokens: config.vision_max_tokens,
            system_prompt,
        }
    }

    /// Analyzes the request's image according to its instruction.
    ///
    /// # Errors
    ///
    /// Propagates [`AgentError::Upstream`] from the provider unchanged.
    pub async fn analyze(
        &self,
        provider: &dyn LlmProvider,
        request: &AnalysisRequest,
    ) -> Result<String, AgentError> {
        let message = user_image_message(request.instruction(), Self::data_uri(request));
        let response = self.execute_message(provider, message).await?;

        if response.content.trim().is_empty() {
            tracing::warn!(model = %self.model, "vision model returned no content");
            return Ok(NO_ANALYSIS_SENTINEL.to_string());
        }
        Ok(response.content)
    }

    /// Encodes the image as an inline `data:` URI.
    fn data_uri(request: &AnalysisRequest) -> String {
        format!(
            "data:{};base64,{}",
            request.mime_type(),
            STANDARD.encode(request.image())
        )
    }
}

#[async_trait]
impl Agent for VisionAgent {
    fn name(&self) -> &'static str {
        "vision"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    fn max_tokens(&self) -> u32 {
        self.max_tokens
    }
}
