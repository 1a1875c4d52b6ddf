//! Agent trait definition.
//!
//! The vision, decision and fusion agents all implement this trait,
//! which provides a uniform interface for the orchestrator.

use async_trait::async_trait;

use super::message::{ChatMessage, ChatRequest, ChatResponse, system_message, user_message};
use super::provider::LlmProvider;
use crate::error::AgentError;

/// Response from an agent execution.
#[derive(Debug, Clone)]
pub struct AgentResponse {
    /// The agent's text output.
    pub content: String,
    /// Token usage for this call.
    pub usage: super::message::TokenUsage,
    /// Why the model stopped generating (e.g. `"stop"`, `"length"`).
    pub finish_reason: Option<String>,
}

impl From<ChatResponse> for AgentResponse {
    fn from(response: ChatResponse) -> Self {
        Self {
            content: response.content,
            usage: response.usage,
            finish_reason: response.finish_reason,
        }
    }
}

/// Trait implemented by all agents in the pipeline.
///
/// Agents encapsulate a specific role (vision analysis, search decision,
/// answer fusion) with a fixed system prompt and model configuration.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Agent name for logging and identification.
    fn name(&self) -> &'static str;

    /// Model identifier to use for this agent.
    fn model(&self) -> &str;

    /// System prompt that defines the agent's role and behavior.
    fn system_prompt(&self) -> &str;

    /// Whether to request JSON-formatted output.
    fn json_mode(&self) -> bool {
        false
    }

    /// Sampling temperature (0.0 = deterministic, higher = more creative).
    fn temperature(&self) -> f32 {
        0.0
    }

    /// Maximum tokens for the response.
    fn max_tokens(&self) -> u32 {
        512
    }

    /// Builds the request for the given user message.
    ///
    /// An empty system prompt is omitted so that user-authored
    /// instructions reach the model unframed.
    fn build_request(&self, user: ChatMessage) -> ChatRequest {
        let mut messages = Vec::with_capacity(2);
        if !self.system_prompt().trim().is_empty() {
            messages.push(system_message(self.system_prompt()));
        }
        messages.push(user);

        ChatRequest {
            model: self.model().to_string(),
            messages,
            temperature: Some(self.temperature()),
            max_tokens: Some(self.max_tokens()),
            json_mode: self.json_mode(),
        }
    }

    /// Executes the agent with the given user message.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError`] on API failures.
    async fn execute(
        &self,
        provider: &dyn LlmProvider,
        user_msg: &str,
    ) -> Result<AgentResponse, AgentError> {
        self.execute_message(provider, user_message(user_msg)).await
    }

    /// Executes the agent with a prebuilt user message (e.g. one carrying images).
    ///
    /// # Errors
    ///
    /// Returns [`AgentError`] on API failures.
    async fn execute_message(
        &self,
        provider: &dyn LlmProvider,
        user: ChatMessage,
    ) -> Result<AgentResponse, AgentError> {
        let request = self.build_request(user);
        let response: AgentResponse = provider.chat(&request).await?.into();
        tracing::debug!(
            agent = self.name(),
            model = self.model(),
            prompt_tokens = response.usage.prompt_tokens,
            completion_tokens = response.usage.completion_tokens,
            finish_reason = response.finish_reason.as_deref().unwrap_or("unknown"),
            "agent call complete"
        );
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::message::{Role, TokenUsage};

    struct Metered;

    #[async_trait]
    impl LlmProvider for Metered {
        fn name(&self) -> &'static str {
            "metered"
        }

        async fn chat(&self, _request: &ChatRequest) -> Result<ChatResponse, AgentError> {
            Ok(ChatResponse {
                content: "ok".to_string(),
                usage: TokenUsage {
                    prompt_tokens: 12,
                    completion_tokens: 3,
                    total_tokens: 15,
                },
                finish_reason: Some("stop".to_string()),
            })
        }
    }

    struct Plain {
        prompt: &'static str,
    }

    impl Agent for Plain {
        fn name(&self) -> &'static str {
            "plain"
        }

        fn model(&self) -> &str {
            "m"
        }

        fn system_prompt(&self) -> &str {
            self.prompt
        }
    }

    #[test]
    fn test_build_request_with_system_prompt() {
        let agent = Plain { prompt: "be brief" };
        let request = agent.build_request(user_message("hi"));
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, Role::System);
        assert_eq!(request.model, "m");
        assert_eq!(request.max_tokens, Some(512));
        assert!(!request.json_mode);
    }

    #[test]
    fn test_build_request_omits_blank_system_prompt() {
        let agent = Plain { prompt: "  " };
        let request = agent.build_request(user_message("hi"));
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].role, Role::User);
    }

    #[tokio::test]
    async fn test_execute_carries_usage_and_finish_reason() {
        let agent = Plain { prompt: "be brief" };
        let response = agent
            .execute(&Metered, "hi")
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(response.content, "ok");
        assert_eq!(response.usage.total_tokens, 15);
        assert_eq!(response.finish_reason.as_deref(), Some("stop"));
    }
}
