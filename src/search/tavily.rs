//! Tavily web search client.
//!
//! Issues an "advanced" search with answer synthesis requested and no
//! domain filters. Every failure is logged and turned into an empty
//! result list.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{SearchResult, ServiceStatus, WebSearch};
use crate::agent::config::AgentConfig;

/// Timeout for the health ping.
const PING_TIMEOUT: Duration = Duration::from_secs(5);

/// Request body for `POST /search`.
#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    search_depth: &'static str,
    include_answer: bool,
    include_domains: Vec<String>,
    exclude_domains: Vec<String>,
    max_results: usize,
}

/// Response body of `POST /search`. Unknown fields are ignored.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

/// Client for the Tavily search API.
pub struct TavilyClient {
    http: reqwest::Client,
    api_key: Option<String>,
    endpoint: String,
    timeout: Duration,
    max_results: usize,
}

impl TavilyClient {
    /// Creates a client from agent configuration.
    ///
    /// The underlying HTTP client is shared by all requests.
    #[must_use]
    pub fn new(config: &AgentConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: config.search_api_key.clone(),
            endpoint: format!("{}/search", config.search_base_url.trim_end_matches('/')),
            timeout: config.search_timeout,
            max_results: config.search_max_results,
        }
    }

    fn request_body<'a>(api_key: &'a str, query: &'a str, max_results: usize) -> SearchRequest<'a> {
        SearchRequest {
            api_key,
            query,
            search_depth: "advanced",
            include_answer: true,
            include_domains: Vec::new(),
            exclude_domains: Vec::new(),
            max_results,
        }
    }

    /// Sends one search request.
    async fn post(
        &self,
        api_key: &str,
        query: &str,
        max_results: usize,
        timeout: Duration,
    ) -> Result<Vec<SearchResult>, reqwest::Error> {
        let response = self
            .http
            .post(&self.endpoint)
            .timeout(timeout)
            .json(&Self::request_body(api_key, query, max_results))
            .send()
            .await?
            .error_for_status()?;

        let body: SearchResponse = response.json().await?;
        Ok(body.results)
    }
}

impl std::fmt::Debug for TavilyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TavilyClient")
            .field("configured", &self.api_key.is_some())
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .field("max_results", &self.max_results)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl WebSearch for TavilyClient {
    fn name(&self) -> &'static str {
        "tavily"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn search(&self, query: &str) -> Vec<SearchResult> {
        let Some(api_key) = self.api_key.as_deref() else {
            tracing::warn!("search API key not provided, skipping web search");
            return Vec::new();
        };

        match self.post(api_key, query, self.max_results, self.timeout).await {
            Ok(mut results) => {
                results.truncate(self.max_results);
                tracing::debug!(query, count = results.len(), "web search complete");
                results
            }
            Err(e) => {
                let reason = if e.is_timeout() { "timeout" } else { "request failed" };
                tracing::warn!(query, error = %e, reason, "web search failed, continuing without results");
                Vec::new()
            }
        }
    }

    async fn ping(&self) -> ServiceStatus {
        let Some(api_key) = self.api_key.as_deref() else {
            return ServiceStatus::NotConfigured;
        };
        match self.post(api_key, "test", 1, PING_TIMEOUT).await {
            Ok(_) => ServiceStatus::Connected,
            Err(e) => {
                tracing::debug!(error = %e, "search health ping failed");
                ServiceStatus::Error
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Json;
    use axum::Router;
    use axum::http::StatusCode;
    use axum::routing::post;
    use serde_json::{Value, json};

    fn config(base_url: &str, key: Option<&str>, timeout: Duration) -> AgentConfig {
        let mut builder = AgentConfig::builder()
            .api_key("test")
            .search_base_url(base_url)
            .search_timeout(timeout);
        if let Some(k) = key {
            builder = builder.search_api_key(k);
        }
        builder.build().unwrap_or_else(|_| unreachable!())
    }

    /// Serves `router` on an ephemeral port and returns its base URL.
    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .unwrap_or_else(|_| unreachable!());
        let addr = listener.local_addr().unwrap_or_else(|_| unreachable!());
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });
        format!("http://{addr}")
    }

    fn six_results() -> Value {
        let results: Vec<Value> = (1..=6)
            .map(|i| json!({"title": format!("r{i}"), "url": format!("https://e.com/{i}"), "content": format!("c{i}"), "score": 0.9}))
            .collect();
        json!({"answer": "synthesized", "query": "q", "results": results, "response_time": 1.2})
    }

    #[tokio::test]
    async fn test_no_key_returns_empty() {
        let client = TavilyClient::new(&config("http://127.0.0.1:9", None, Duration::from_secs(1)));
        assert!(!client.is_configured());
        assert!(client.search("anything").await.is_empty());
        assert_eq!(client.ping().await, ServiceStatus::NotConfigured);
    }

    #[tokio::test]
    async fn test_search_sends_advanced_request_and_keeps_order() {
        let router = Router::new().route(
            "/search",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["api_key"], "tvly-key");
                assert_eq!(body["search_depth"], "advanced");
                assert_eq!(body["include_answer"], true);
                assert_eq!(body["max_results"], 5);
                assert_eq!(body["include_domains"], json!([]));
                assert_eq!(body["exclude_domains"], json!([]));
                Json(six_results())
            }),
        );
        let base = serve(router).await;
        let client = TavilyClient::new(&config(&base, Some("tvly-key"), Duration::from_secs(5)));
        let results = client.search("Inception IMDB rating").await;
        let titles: Vec<&str> = results.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["r1", "r2", "r3", "r4", "r5"]);
    }

    #[tokio::test]
    async fn test_non_success_status_returns_empty() {
        let router = Router::new().route(
            "/search",
            post(|| async { (StatusCode::UNAUTHORIZED, "bad key") }),
        );
        let base = serve(router).await;
        let client = TavilyClient::new(&config(&base, Some("k"), Duration::from_secs(5)));
        assert!(client.search("q").await.is_empty());
        assert_eq!(client.ping().await, ServiceStatus::Error);
    }

    #[tokio::test]
    async fn test_timeout_returns_empty() {
        let router = Router::new().route(
            "/search",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                Json(six_results())
            }),
        );
        let base = serve(router).await;
        let client = TavilyClient::new(&config(&base, Some("k"), Duration::from_millis(100)));
        assert!(client.search("q").await.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_returns_empty() {
        let client = TavilyClient::new(&config("http://127.0.0.1:9", Some("k"), Duration::from_secs(1)));
        assert!(client.search("q").await.is_empty());
    }

    #[tokio::test]
    async fn test_ping_connected() {
        let router = Router::new().route("/search", post(|| async { Json(json!({"results": []})) }));
        let base = serve(router).await;
        let client = TavilyClient::new(&config(&base, Some("k"), Duration::from_secs(5)));
        assert_eq!(client.ping().await, ServiceStatus::Connected);
    }

    #[tokio::test]
    async fn test_null_snippet_keeps_results() {
        let router = Router::new().route(
            "/search",
            post(|| async {
                Json(json!({"results": [
                    {"title": "r1", "url": "https://e.com/1", "content": null},
                    {"title": "r2", "url": "https://e.com/2", "content": "c2"},
                ]}))
            }),
        );
        let base = serve(router).await;
        let client = TavilyClient::new(&config(&base, Some("k"), Duration::from_secs(5)));
        let results = client.search("q").await;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].content, "");
        assert_eq!(results[1].content, "c2");
    }

    #[test]
    fn test_response_missing_fields_default() {
        let body: SearchResponse =
            serde_json::from_str(r#"{"results": [{"url": "https://e.com"}]}"#)
                .unwrap_or_else(|_| SearchResponse { results: Vec::new() });
        assert_eq!(body.results.len(), 1);
        assert_eq!(body.results[0].title, "");
        assert_eq!(body.results[0].url, "https://e.com");
    }
}
