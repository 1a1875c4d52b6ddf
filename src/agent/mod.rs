//! Agentic image analysis.
//!
//! A two-phase pipeline: a vision model describes the image, a cheap
//! decision model judges whether the answer depends on current facts,
//! and if so the answer is enriched with web search results and fused
//! into one response. Uses a pluggable provider abstraction backed by
//! OpenAI-compatible APIs.
//!
//! # Architecture
//!
//! ```text
//! AnalysisRequest → Orchestrator
//!   ├── VisionAgent (initial analysis, fatal on failure)
//!   ├── DeciderAgent (JSON verdict, degrades to "no search")
//!   └── if search warranted:
//!       ├── WebSearch (degrades to no results)
//!       └── FusionAgent (degrades to the initial analysis)
//!   → AgentOutcome
//! ```

pub mod client;
pub mod config;
pub mod decider;
pub mod fusion;
pub mod message;
pub mod orchestrator;
pub mod outcome;
pub mod prompt;
pub mod provider;
pub mod providers;
pub mod traits;
pub mod vision;

// Re-export key types
pub use client::create_provider;
pub use config::AgentConfig;
pub use decider::DeciderAgent;
pub use fusion::FusionAgent;
pub use message::{ChatMessage, ChatRequest, ChatResponse, Role, TokenUsage};
pub use orchestrator::{HealthReport, MAX_ITERATIONS, Orchestrator, PipelineStage};
pub use outcome::{
    AgentOutcome, AnalysisRequest, MAX_SURFACED_RESULTS, SearchDecision, SearchResult,
};
pub use prompt::PromptSet;
pub use provider::LlmProvider;
pub use traits::{Agent, AgentResponse};
pub use vision::VisionAgent;
