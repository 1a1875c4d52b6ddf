//! # camgpt
//!
//! Backend for a camera app that answers questions about photos.
//!
//! Each request runs a bounded two-phase pipeline: a vision model
//! produces an initial analysis, a small decision model judges whether
//! the answer depends on current real-world facts, and if so the answer
//! is enriched with web search results and fused into one response.
//! Decision, search and fusion failures degrade to the initial analysis;
//! only the vision step can fail a request.
//!
//! ## Modules
//!
//! - [`agent`]: pipeline agents, the provider seam and the orchestrator
//! - [`search`]: web search backends
//! - [`server`]: axum HTTP boundary with multipart upload handling
//! - [`cli`]: command-line interface
//! - [`error`]: error types
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use camgpt::agent::{AgentConfig, AnalysisRequest, Orchestrator, create_provider};
//! use camgpt::search::{TavilyClient, WebSearch};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AgentConfig::from_env()?;
//! let provider = create_provider(&config)?;
//! let search: Arc<dyn WebSearch> = Arc::new(TavilyClient::new(&config));
//! let orchestrator = Orchestrator::new(provider, search, config);
//!
//! let image = std::fs::read("poster.jpg")?;
//! let request = AnalysisRequest::new(image, Some("image/jpeg"), "What movie is this?")?;
//! let outcome = orchestrator.analyze(&request).await?;
//! println!("{}", outcome.final_answer());
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod cli;
pub mod error;
pub mod search;
pub mod server;

pub use agent::{AgentOutcome, AnalysisRequest, Orchestrator};
pub use error::{AgentError, CommandError, Result, UpstreamKind};
