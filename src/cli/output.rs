//! Output formatting for CLI commands.

use std::fmt::Write;

use serde::Serialize;

use crate::agent::{AgentOutcome, HealthReport};
use crate::server::routes::AnalyzeResponse;

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

impl OutputFormat {
    /// Parses a format name; unknown names fall back to text.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }

    /// Serializes `value` as pretty JSON with a trailing newline.
    pub fn to_json<T: Serialize + ?Sized>(self, value: &T) -> String {
        let mut out = serde_json::to_string_pretty(value)
            .unwrap_or_else(|e| format!("{{\"error\": \"serialization failed: {e}\"}}"));
        out.push('\n');
        out
    }
}

/// Formats a pipeline outcome.
///
/// JSON mirrors the HTTP response body of `POST /api/analyze-image`.
pub fn format_outcome(outcome: &AgentOutcome, model: &str, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut out = outcome.final_answer().to_string();
            out.push_str("\n\n---\n");
            match outcome.search_query() {
                Some(query) => {
                    let _ = writeln!(
                        out,
                        "Web search: \"{query}\" | Iterations: {}",
                        outcome.iterations_used()
                    );
                    for (i, r) in outcome.web_results().unwrap_or_default().iter().enumerate() {
                        let _ = writeln!(out, "  [{}] {} <{}>", i + 1, r.title, r.url);
                    }
                }
                None => {
                    let _ = writeln!(
                        out,
                        "Web search: not used | Iterations: {}",
                        outcome.iterations_used()
                    );
                }
            }
            out
        }
        OutputFormat::Json => format.to_json(&AnalyzeResponse::new(outcome, Some(model), None)),
    }
}

/// Formats a health report.
pub fn format_health(report: &HealthReport, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut out = String::new();
            let _ = writeln!(out, "Model API:   {}", report.openai.as_str());
            let _ = writeln!(out, "Web search:  {}", report.tavily.as_str());
            let _ = writeln!(out, "Pipeline:    {}", report.agent_service);
            if let Some(err) = &report.error {
                let _ = writeln!(out, "Error:       {err}");
            }
            out
        }
        OutputFormat::Json => format.to_json(report),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::SearchResult;
    use crate::search::ServiceStatus;

    #[test]
    fn test_parse() {
        assert_eq!(OutputFormat::parse("json"), OutputFormat::Json);
        assert_eq!(OutputFormat::parse("JSON"), OutputFormat::Json);
        assert_eq!(OutputFormat::parse("text"), OutputFormat::Text);
        assert_eq!(OutputFormat::parse("yaml"), OutputFormat::Text);
    }

    #[test]
    fn test_format_direct_text() {
        let outcome = AgentOutcome::direct("A red logo.".to_string());
        let out = format_outcome(&outcome, "gpt-4o", OutputFormat::Text);
        assert!(out.starts_with("A red logo."));
        assert!(out.contains("Web search: not used | Iterations: 1"));
    }

    #[test]
    fn test_format_enriched_json() {
        let results = vec![SearchResult {
            title: "IMDb".to_string(),
            url: "https://imdb.com".to_string(),
            content: "8.8".to_string(),
        }];
        let outcome = AgentOutcome::enriched(
            "Rated 8.8.".to_string(),
            "Inception rating".to_string(),
            results,
            3,
        );
        let out = format_outcome(&outcome, "gpt-4o", OutputFormat::Json);
        let json: serde_json::Value = serde_json::from_str(&out).unwrap_or_default();
        assert_eq!(json["analysis"], "Rated 8.8.");
        assert_eq!(json["status"], "success");
        assert_eq!(json["model"], "gpt-4o");
        assert!(json.get("test").is_none());
        assert_eq!(json["agent"]["webSearchUsed"], true);
        assert_eq!(json["agent"]["iterations"], 2);
        assert_eq!(json["agent"]["searchQuery"], "Inception rating");
        assert_eq!(json["agent"]["webResults"][0]["url"], "https://imdb.com");

        let text = format_outcome(&outcome, "gpt-4o", OutputFormat::Text);
        assert!(text.contains("[1] IMDb <https://imdb.com>"));
    }

    #[test]
    fn test_format_direct_json_matches_http_body() {
        let outcome = AgentOutcome::direct("A red logo.".to_string());
        let out = format_outcome(&outcome, "gpt-4o", OutputFormat::Json);
        let json: serde_json::Value = serde_json::from_str(&out).unwrap_or_default();
        let http = serde_json::to_value(AnalyzeResponse::new(&outcome, Some("gpt-4o"), None))
            .unwrap_or_default();
        assert_eq!(json, http);
        assert!(json["agent"]["webResults"].is_null());
    }

    #[test]
    fn test_format_health_text() {
        let report = HealthReport {
            openai: ServiceStatus::Connected,
            tavily: ServiceStatus::NotConfigured,
            agent_service: "operational",
            error: None,
        };
        let out = format_health(&report, OutputFormat::Text);
        assert!(out.contains("Model API:   connected"));
        assert!(out.contains("Web search:  not_configured"));
    }
}
