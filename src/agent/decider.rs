//! Decision agent: should the analysis be enriched with web search?
//!
//! The model is asked for a strict JSON verdict. Anything other than a
//! well-formed verdict (call failure, malformed JSON, schema violation)
//! degrades to [`SearchDecision::fallback`], so this step never aborts
//! a request.

use async_trait::async_trait;
use serde::Deserialize;

use super::config::AgentConfig;
use super::outcome::SearchDecision;
use super::prompt::build_decision_prompt;
use super::provider::LlmProvider;
use super::traits::Agent;
use crate::error::AgentError;

/// Maximum length of a search query forwarded to the search provider.
pub const MAX_SEARCH_QUERY_CHARS: usize = 400;

/// Shape the model must return.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDecision {
    should_search: bool,
    #[serde(default)]
    search_query: Option<String>,
    #[serde(default)]
    reasoning: Option<String>,
}

/// Agent that decides whether web search would improve an answer.
pub struct DeciderAgent {
    model: String,
    max_tokens: u32,
    system_prompt: String,
}

impl DeciderAgent {
    /// Creates a new decision agent with the given configuration and system prompt.
    #[must_use]
    pub fn new(config: &AgentConfig, system_prompt: String) -> Self {
        Self {
            model: config.decision_model.clone(),
            max_tokens: config.decision_max_tokens,
            system_prompt,
        }
    }

    /// Produces a search decision. Never fails.
    pub async fn decide(
        &self,
        provider: &dyn LlmProvider,
        initial_analysis: &str,
        user_instruction: &str,
    ) -> SearchDecision {
        let user_msg = build_decision_prompt(initial_analysis, user_instruction);

        let outcome = match self.execute(provider, &user_msg).await {
            Ok(response) => Self::parse_decision(&response.content),
            Err(e) => Err(e),
        };

        outcome.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "search decision failed, continuing without search");
            SearchDecision::fallback()
        })
    }

    /// Parses and validates the agent's JSON response.
    fn parse_decision(content: &str) -> Result<SearchDecision, AgentError> {
        let json_str = strip_code_fence(content.trim());

        let raw: RawDecision =
            serde_json::from_str(json_str).map_err(|e| AgentError::ResponseParse {
                message: format!("invalid search decision: {e}"),
                content: content.to_string(),
            })?;

        let search_query = raw
            .search_query
            .map(|q| cap_query(q.trim()))
            .filter(|q| !q.is_empty());

        if raw.should_search && search_query.is_none() {
            return Err(AgentError::ResponseParse {
                message: "shouldSearch is true but searchQuery is missing".to_string(),
                content: content.to_string(),
            });
        }

        Ok(SearchDecision {
            should_search: raw.should_search,
            search_query: if raw.should_search { search_query } else { None },
            reasoning: raw.reasoning.unwrap_or_default(),
        })
    }
}

/// Truncates a query to [`MAX_SEARCH_QUERY_CHARS`] characters.
fn cap_query(query: &str) -> String {
    match query.char_indices().nth(MAX_SEARCH_QUERY_CHARS) {
        Some((end, _)) => query[..end].trim_end().to_string(),
        None => query.to_string(),
    }
}

#[async_trait]
impl Agent for DeciderAgent {
    fn name(&self) -> &'static str {
        "decider"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    fn json_mode(&self) -> bool {
        true
    }

    fn temperature(&self) -> f32 {
        0.1
    }

    fn max_tokens(&self) -> u32 {
        self.max_tokens
    }
}

/// Unwraps a markdown code block, with or without a `json` tag in any case.
fn strip_code_fence(text: &str) -> &str {
    let Some(body) = text.strip_prefix("```") else {
        return text;
    };
    let body = body.strip_suffix("```").unwrap_or(body);
    let body = match (body.get(..4), body.get(4..)) {
        (Some(tag), Some(rest)) if tag.eq_ignore_ascii_case("json") => rest,
        _ => body,
    };
    body.trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::message::{ChatRequest, ChatResponse};
    use crate::error::UpstreamKind;
    use test_case::test_case;

    struct FixedProvider(Result<&'static str, UpstreamKind>);

    #[async_trait]
    impl LlmProvider for FixedProvider {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, AgentError> {
            assert!(request.json_mode);
            match self.0 {
                Ok(content) => Ok(ChatResponse {
                    content: content.to_string(),
                    ..ChatResponse::default()
                }),
                Err(kind) => Err(AgentError::Upstream {
                    kind,
                    message: "down".to_string(),
                }),
            }
        }
    }

    fn agent() -> DeciderAgent {
        let config = AgentConfig::builder()
            .api_key("test")
            .build()
            .unwrap_or_else(|_| unreachable!());
        DeciderAgent::new(&config, "decide".to_string())
    }

    #[test]
    fn test_parse_valid_search() {
        let json = r#"{"shouldSearch": true, "searchQuery": "Inception IMDB rating", "reasoning": "ratings change"}"#;
        let d = DeciderAgent::parse_decision(json).unwrap_or_else(|_| SearchDecision::fallback());
        assert!(d.should_search);
        assert_eq!(d.query(), Some("Inception IMDB rating"));
        assert_eq!(d.reasoning, "ratings change");
    }

    #[test]
    fn test_parse_no_search_drops_query() {
        let json = r#"{"shouldSearch": false, "searchQuery": "ignored", "reasoning": "descriptive"}"#;
        let d = DeciderAgent::parse_decision(json).unwrap_or_else(|_| SearchDecision::fallback());
        assert!(!d.should_search);
        assert!(d.search_query.is_none());
        assert_eq!(d.reasoning, "descriptive");
    }

    #[test_case("```json\n{BODY}\n```" ; "lowercase tag")]
    #[test_case("```JSON\n{BODY}\n```" ; "uppercase tag")]
    #[test_case("```Json {BODY}```" ; "mixed case tag on one line")]
    #[test_case("```\n{BODY}\n```" ; "untagged")]
    fn test_parse_code_block(template: &str) {
        let body = r#"{"shouldSearch": true, "searchQuery": "Inception rating", "reasoning": "r"}"#;
        let content = template.replace("{BODY}", body);
        let d = DeciderAgent::parse_decision(&content).unwrap_or_else(|_| SearchDecision::fallback());
        assert_eq!(d.query(), Some("Inception rating"));
    }

    #[test_case("not json at all" ; "free text")]
    #[test_case(r#"{"searchQuery": "q"}"# ; "missing shouldSearch")]
    #[test_case(r#"{"shouldSearch": "yes", "searchQuery": "q"}"# ; "non-bool shouldSearch")]
    #[test_case(r#"{"shouldSearch": true, "searchQuery": null}"# ; "search without query")]
    #[test_case(r#"{"shouldSearch": true, "searchQuery": "   "}"# ; "search with blank query")]
    #[test_case("" ; "empty")]
    fn test_parse_rejects(content: &str) {
        assert!(matches!(
            DeciderAgent::parse_decision(content),
            Err(AgentError::ResponseParse { .. })
        ));
    }

    #[test]
    fn test_query_is_capped() {
        let long = "é".repeat(MAX_SEARCH_QUERY_CHARS + 50);
        let json = format!(r#"{{"shouldSearch": true, "searchQuery": "{long}"}}"#);
        let d = DeciderAgent::parse_decision(&json).unwrap_or_else(|_| SearchDecision::fallback());
        assert_eq!(
            d.query().map(|q| q.chars().count()),
            Some(MAX_SEARCH_QUERY_CHARS)
        );
    }

    #[tokio::test]
    async fn test_decide_absorbs_parse_failure() {
        let provider = FixedProvider(Ok("Sure! I think you should search."));
        let d = agent().decide(&provider, "analysis", "prompt").await;
        assert_eq!(d, SearchDecision::fallback());
    }

    #[tokio::test]
    async fn test_decide_absorbs_call_failure() {
        let provider = FixedProvider(Err(UpstreamKind::Transient));
        let d = agent().decide(&provider, "analysis", "prompt").await;
        assert_eq!(d, SearchDecision::fallback());
    }

    #[tokio::test]
    async fn test_decide_success() {
        let provider = FixedProvider(Ok(
            r#"{"shouldSearch": true, "searchQuery": "Blue Bottle Coffee hours", "reasoning": "hours"}"#,
        ));
        let d = agent().decide(&provider, "a coffee shop", "when is it open?").await;
        assert_eq!(d.query(), Some("Blue Bottle Coffee hours"));
    }

    #[test]
    fn test_agent_properties() {
        let a = agent();
        assert_eq!(a.name(), "decider");
        assert_eq!(a.model(), "gpt-4o-mini");
        assert!(a.json_mode());
        assert!((a.temperature() - 0.1).abs() < f32::EPSILON);
        assert_eq!(a.max_tokens(), 200);
    }
}
