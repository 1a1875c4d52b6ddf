//! Data types flowing through the analysis pipeline.
//!
//! [`AnalysisRequest`] enters the pipeline, [`SearchDecision`] and
//! [`SearchResult`] are intermediate products, and [`AgentOutcome`] is
//! the terminal artifact handed back to the caller.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::AgentError;

/// Default MIME type assumed for image payloads.
pub const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

/// Reasoning recorded when the decision step degraded to "no search".
pub const DECISION_ERROR_REASONING: &str = "error";

/// Most search results an outcome ever carries.
pub const MAX_SURFACED_RESULTS: usize = 3;

/// One inbound analysis call: an image and the instruction to apply to it.
#[derive(Clone)]
pub struct AnalysisRequest {
    image: Vec<u8>,
    mime_type: String,
    instruction: String,
}

impl AnalysisRequest {
    /// Creates a request, validating that both parts are usable.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InvalidRequest`] when the image is empty or
    /// the instruction is blank.
    pub fn new(
        image: Vec<u8>,
        mime_type: Option<&str>,
        instruction: impl Into<String>,
    ) -> Result<Self, AgentError> {
        let instruction = instruction.into();
        if image.is_empty() {
            return Err(AgentError::InvalidRequest {
                message: "image payload is empty".to_string(),
            });
        }
        if instruction.trim().is_empty() {
            return Err(AgentError::InvalidRequest {
                message: "instruction text cannot be empty".to_string(),
            });
        }
        let mime_type = mime_type
            .filter(|m| m.starts_with("image/"))
            .unwrap_or(DEFAULT_IMAGE_MIME)
            .to_string();
        Ok(Self {
            image,
            mime_type,
            instruction,
        })
    }

    /// Raw image bytes.
    #[must_use]
    pub fn image(&self) -> &[u8] {
        &self.image
    }

    /// MIME type used for the inline data URI.
    #[must_use]
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// The user-authored (or rule-derived) instruction.
    #[must_use]
    pub fn instruction(&self) -> &str {
        &self.instruction
    }
}

impl std::fmt::Debug for AnalysisRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisRequest")
            .field("image_bytes", &self.image.len())
            .field("mime_type", &self.mime_type)
            .field("instruction", &self.instruction)
            .finish()
    }
}

/// Verdict of the decision step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchDecision {
    /// Whether enrichment search should run.
    pub should_search: bool,
    /// Query to issue when `should_search` is true.
    #[serde(default)]
    pub search_query: Option<String>,
    /// Model's short explanation.
    #[serde(default)]
    pub reasoning: String,
}

impl SearchDecision {
    /// The safe default used whenever the decision step fails.
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            should_search: false,
            search_query: None,
            reasoning: DECISION_ERROR_REASONING.to_string(),
        }
    }

    /// Returns the query to run, if this decision asks for a search.
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        if self.should_search {
            self.search_query.as_deref()
        } else {
            None
        }
    }
}

/// A single web search hit, in provider-ranked order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Page title.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    /// Page URL.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub url: String,
    /// Snippet extracted by the provider.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub content: String,
}

/// Providers send `null` for fields they could not extract.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Terminal result of one pipeline run.
///
/// Only constructible through [`AgentOutcome::direct`] and
/// [`AgentOutcome::enriched`], which together guarantee that
/// `web_search_used`, `iterations_used == 2` and `search_query.is_some()`
/// always agree, and that `web_results` is present only for enriched
/// outcomes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentOutcome {
    final_answer: String,
    web_search_used: bool,
    search_query: Option<String>,
    web_results: Option<Vec<SearchResult>>,
    iterations_used: u8,
}

impl AgentOutcome {
    /// Outcome of a single-pass run that did not search.
    #[must_use]
    pub const fn direct(final_answer: String) -> Self {
        Self {
            final_answer,
            web_search_used: false,
            search_query: None,
            web_results: None,
            iterations_used: 1,
        }
    }

    /// Outcome of a run that searched.
    ///
    /// Keeps at most `surfaced` results, and never more than
    /// [`MAX_SURFACED_RESULTS`].
    #[must_use]
    pub fn enriched(
        final_answer: String,
        search_query: String,
        mut results: Vec<SearchResult>,
        surfaced: usize,
    ) -> Self {
        results.truncate(surfaced.min(MAX_SURFACED_RESULTS));
        Self {
            final_answer,
            web_search_used: true,
            search_query: Some(search_query),
            web_results: Some(results),
            iterations_used: 2,
        }
    }

    /// The answer returned to the caller.
    #[must_use]
    pub fn final_answer(&self) -> &str {
        &self.final_answer
    }

    /// Whether web search contributed to this outcome.
    #[must_use]
    pub const fn web_search_used(&self) -> bool {
        self.web_search_used
    }

    /// The query issued, if any.
    #[must_use]
    pub fn search_query(&self) -> Option<&str> {
        self.search_query.as_deref()
    }

    /// The surfaced search results, if a search ran.
    #[must_use]
    pub fn web_results(&self) -> Option<&[SearchResult]> {
        self.web_results.as_deref()
    }

    /// Number of pipeline rounds used (1 or 2).
    #[must_use]
    pub const fn iterations_used(&self) -> u8 {
        self.iterations_used
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn result(i: usize) -> SearchResult {
        SearchResult {
            title: format!("t{i}"),
            url: format!("https://example.com/{i}"),
            content: format!("c{i}"),
        }
    }

    #[test]
    fn test_request_rejects_empty_image() {
        let err = AnalysisRequest::new(Vec::new(), None, "describe");
        assert!(matches!(err, Err(AgentError::InvalidRequest { .. })));
    }

    #[test]
    fn test_request_rejects_blank_instruction() {
        let err = AnalysisRequest::new(vec![1, 2, 3], None, "  \n ");
        assert!(matches!(err, Err(AgentError::InvalidRequest { .. })));
    }

    #[test]
    fn test_request_mime_defaults() {
        let req = AnalysisRequest::new(vec![1], Some("application/pdf"), "x")
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(req.mime_type(), DEFAULT_IMAGE_MIME);
        let req =
            AnalysisRequest::new(vec![1], Some("image/png"), "x").unwrap_or_else(|_| unreachable!());
        assert_eq!(req.mime_type(), "image/png");
    }

    #[test]
    fn test_decision_serde_camel_case() {
        let json = r#"{"shouldSearch": true, "searchQuery": "q", "reasoning": "r"}"#;
        let d: SearchDecision = serde_json::from_str(json).unwrap_or_else(|_| SearchDecision::fallback());
        assert!(d.should_search);
        assert_eq!(d.query(), Some("q"));
    }

    #[test]
    fn test_fallback_decision() {
        let d = SearchDecision::fallback();
        assert!(!d.should_search);
        assert_eq!(d.reasoning, "error");
        assert_eq!(d.query(), None);
    }

    #[test]
    fn test_direct_outcome_shape() {
        let o = AgentOutcome::direct("answer".to_string());
        assert!(!o.web_search_used());
        assert_eq!(o.iterations_used(), 1);
        assert!(o.search_query().is_none());
        assert!(o.web_results().is_none());
    }

    #[test]
    fn test_outcome_serializes_camel_case() {
        let o = AgentOutcome::enriched("a".to_string(), "q".to_string(), vec![result(0)], 3);
        let json = serde_json::to_value(&o).unwrap_or_default();
        assert_eq!(json["webSearchUsed"], true);
        assert_eq!(json["iterationsUsed"], 2);
        assert_eq!(json["searchQuery"], "q");
        assert_eq!(json["webResults"][0]["title"], "t0");
    }

    #[test]
    fn test_enriched_caps_oversized_surfaced_count() {
        let results: Vec<SearchResult> = (0..5).map(result).collect();
        let o = AgentOutcome::enriched("a".to_string(), "q".to_string(), results, 10);
        let shown = o.web_results().unwrap_or_default();
        assert_eq!(shown.len(), MAX_SURFACED_RESULTS);
        assert_eq!(shown[0].title, "t0");
    }

    #[test]
    fn test_search_result_null_fields_decode_empty() {
        let json = r#"{"title": "IMDb", "url": null, "content": null}"#;
        let r: SearchResult = serde_json::from_str(json).unwrap_or_else(|_| unreachable!());
        assert_eq!(r.title, "IMDb");
        assert_eq!(r.url, "");
        assert_eq!(r.content, "");
    }

    proptest! {
        #[test]
        fn prop_enriched_outcome_invariants(n in 0usize..12, surfaced in 0usize..64) {
            let results: Vec<SearchResult> = (0..n).map(result).collect();
            let o = AgentOutcome::enriched("a".to_string(), "q".to_string(), results.clone(), surfaced);
            let shown = o.web_results().map_or(usize::MAX, <[SearchResult]>::len);
            prop_assert!(shown <= MAX_SURFACED_RESULTS);
            prop_assert_eq!(shown, n.min(surfaced).min(MAX_SURFACED_RESULTS));
            prop_assert!(o.web_search_used());
            prop_assert_eq!(o.iterations_used(), 2);
            prop_assert!(o.search_query().is_some());
            // provider order preserved
            prop_assert_eq!(o.web_results().unwrap_or_default(), &results[..shown]);
        }
    }
}
