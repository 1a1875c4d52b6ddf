//! HTTP boundary for the analysis pipeline.
//!
//! # Endpoints
//!
//! ```text
//! GET  /api/health          dependency report
//! POST /api/analyze-image   multipart image + prompt → analysis
//! POST /api/test-agent      pipeline smoke test on a built-in image
//! ```
//!
//! Process-wide clients (model provider, search) are created once in
//! [`AppState::from_config`] and shared by every request.

pub mod config;
pub mod error;
pub mod routes;
pub mod upload;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;

use crate::agent::{AgentConfig, Orchestrator, create_provider};
use crate::error::AgentError;
use crate::search::{TavilyClient, WebSearch};

pub use config::ServerConfig;
pub use error::ApiError;

/// Slack above the image ceiling for multipart framing and the prompt field.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The pipeline.
    pub orchestrator: Arc<Orchestrator>,
    /// Server settings.
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Wraps an existing orchestrator.
    #[must_use]
    pub fn new(orchestrator: Orchestrator, config: ServerConfig) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            config: Arc::new(config),
        }
    }

    /// Builds the provider and search clients from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured provider is unsupported.
    pub fn from_config(agent: AgentConfig, server: ServerConfig) -> Result<Self, AgentError> {
        let provider = create_provider(&agent)?;
        let search: Arc<dyn WebSearch> = Arc::new(TavilyClient::new(&agent));
        Ok(Self::new(Orchestrator::new(provider, search, agent), server))
    }
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    let body_limit = state
        .config
        .max_upload_bytes
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    Router::new()
        .route("/api/health", get(routes::health))
        .route("/api/analyze-image", post(routes::analyze_image))
        .route("/api/test-agent", post(routes::test_agent))
        .fallback(routes::not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serves the API until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the listener cannot bind or the server fails.
pub async fn serve(state: AppState) -> anyhow::Result<()> {
    let addr = state.config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let local = listener.local_addr()?;

    log_banner(&state, local.port());
    tracing::info!(%local, "listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await?;

    Ok(())
}

fn log_banner(state: &AppState, port: u16) {
    let agent = state.orchestrator.config();
    tracing::info!("CamGPT backend API running on http://localhost:{port}");
    tracing::info!("Health check: GET http://localhost:{port}/api/health");
    tracing::info!("Image analysis: POST http://localhost:{port}/api/analyze-image");
    tracing::info!(
        vision = %agent.vision_model,
        decision = %agent.decision_model,
        fusion = %agent.fusion_model,
        upload_dir = %state.config.upload_dir.display(),
        "agentic pipeline ready"
    );
    if agent.search_enabled() {
        tracing::info!("web search integration active");
    } else {
        tracing::warn!("TAVILY_API_KEY not set, web search disabled");
    }
}
