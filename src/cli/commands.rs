//! CLI command implementations.
//!
//! Contains the business logic for each CLI command. Async work runs on a
//! runtime created per command.

#![allow(clippy::format_push_string)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::agent::prompt::PromptSet;
use crate::agent::{AgentConfig, AnalysisRequest, Orchestrator, create_provider};
use crate::cli::output::{OutputFormat, format_health, format_outcome};
use crate::cli::parser::{Cli, Commands};
use crate::error::{CommandError, Result};
use crate::search::{TavilyClient, WebSearch};
use crate::server::routes::DEFAULT_PROMPT;
use crate::server::upload::mime_for_path;
use crate::server::{AppState, ServerConfig};

/// Parameters for the analyze command.
#[derive(Debug, Clone)]
pub struct AnalyzeParams<'a> {
    /// Image file to analyze.
    pub image: &'a Path,
    /// Instruction text.
    pub prompt: Option<&'a str>,
    /// Vision model override.
    pub vision_model: Option<&'a str>,
    /// Decision model override.
    pub decision_model: Option<&'a str>,
    /// Fusion model override.
    pub fusion_model: Option<&'a str>,
    /// Prompt template directory override.
    pub prompt_dir: Option<&'a Path>,
}

/// Executes the CLI command.
///
/// # Returns
///
/// Result with output string on success.
///
/// # Errors
///
/// Returns an error if the command fails to execute.
pub fn execute(cli: &Cli) -> Result<String> {
    let format = OutputFormat::parse(&cli.format);

    match &cli.command {
        Commands::Serve {
            host,
            port,
            upload_dir,
        } => cmd_serve(host, *port, upload_dir),
        Commands::Analyze {
            image,
            prompt,
            vision_model,
            decision_model,
            fusion_model,
            prompt_dir,
        } => {
            let params = AnalyzeParams {
                image,
                prompt: prompt.as_deref(),
                vision_model: vision_model.as_deref(),
                decision_model: decision_model.as_deref(),
                fusion_model: fusion_model.as_deref(),
                prompt_dir: prompt_dir.as_deref(),
            };
            cmd_analyze(&params, format)
        }
        Commands::Health => cmd_health(format),
        Commands::InitPrompts { dir } => cmd_init_prompts(dir.as_deref(), format),
    }
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().map_err(|e| {
        CommandError::ExecutionFailed(format!("Failed to create async runtime: {e}"))
    })
}

fn agent_config(builder: crate::agent::config::AgentConfigBuilder) -> Result<AgentConfig> {
    builder.from_env().build().map_err(|e| {
        CommandError::ExecutionFailed(format!("Agent configuration error: {e}"))
    })
}

fn orchestrator(config: AgentConfig) -> Result<Orchestrator> {
    let provider = create_provider(&config).map_err(|e| {
        CommandError::ExecutionFailed(format!("Provider creation failed: {e}"))
    })?;
    let search: Arc<dyn WebSearch> = Arc::new(TavilyClient::new(&config));
    Ok(Orchestrator::new(provider, search, config))
}

/// Runs the HTTP server until interrupted.
fn cmd_serve(host: &str, port: u16, upload_dir: &Path) -> Result<String> {
    let agent = agent_config(AgentConfig::builder())?;
    let server = ServerConfig::builder()
        .host(host)
        .port(port)
        .upload_dir(upload_dir)
        .from_env()
        .build();

    let state = AppState::from_config(agent, server).map_err(|e| {
        CommandError::ExecutionFailed(format!("Provider creation failed: {e}"))
    })?;

    runtime()?
        .block_on(crate::server::serve(state))
        .map_err(|e| CommandError::ExecutionFailed(format!("Server error: {e}")))?;

    Ok(String::new())
}

/// Runs the pipeline once on a local file.
fn cmd_analyze(params: &AnalyzeParams<'_>, format: OutputFormat) -> Result<String> {
    let mime_type = mime_for_path(params.image).ok_or_else(|| {
        CommandError::InvalidArgument(format!(
            "unsupported image type: {}",
            params.image.display()
        ))
    })?;
    let bytes = std::fs::read(params.image)?;

    let mut builder = AgentConfig::builder();
    if let Some(model) = params.vision_model {
        builder = builder.vision_model(model);
    }
    if let Some(model) = params.decision_model {
        builder = builder.decision_model(model);
    }
    if let Some(model) = params.fusion_model {
        builder = builder.fusion_model(model);
    }
    if let Some(dir) = params.prompt_dir {
        builder = builder.prompt_dir(dir);
    }
    let config = agent_config(builder)?;
    let model = config.vision_model.clone();

    let prompt = params
        .prompt
        .filter(|p| !p.trim().is_empty())
        .unwrap_or(DEFAULT_PROMPT);
    let request = AnalysisRequest::new(bytes, Some(mime_type), prompt)?;
    let orchestrator = orchestrator(config)?;

    let outcome = runtime()?.block_on(orchestrator.analyze(&request))?;
    Ok(format_outcome(&outcome, &model, format))
}

/// Checks the model and search APIs.
fn cmd_health(format: OutputFormat) -> Result<String> {
    let orchestrator = orchestrator(agent_config(AgentConfig::builder())?)?;
    let report = runtime()?.block_on(orchestrator.health());
    let output = format_health(&report, format);

    if report.is_operational() {
        Ok(output)
    } else {
        Err(CommandError::ExecutionFailed(output.trim_end().to_string()))
    }
}

/// Writes default prompt templates to a directory for customization.
fn cmd_init_prompts(dir: Option<&Path>, format: OutputFormat) -> Result<String> {
    let target_dir = dir
        .map(PathBuf::from)
        .or_else(PromptSet::default_dir)
        .ok_or_else(|| {
            CommandError::ExecutionFailed(
                "Could not determine home directory for default prompt path".to_string(),
            )
        })?;

    let written = PromptSet::write_defaults(&target_dir).map_err(|e| {
        CommandError::ExecutionFailed(format!("Failed to write prompt templates: {e}"))
    })?;

    match format {
        OutputFormat::Text => {
            if written.is_empty() {
                Ok(format!(
                    "All prompt templates already exist in: {}\n",
                    target_dir.display()
                ))
            } else {
                let mut output = format!(
                    "Wrote {} prompt template(s) to: {}\n",
                    written.len(),
                    target_dir.display()
                );
                for path in &written {
                    output.push_str(&format!(
                        "  {}\n",
                        path.file_name()
                            .and_then(|n| n.to_str())
                            .unwrap_or("unknown")
                    ));
                }
                output.push_str("\nEdit these files to customize agent system prompts.\n");
                Ok(output)
            }
        }
        OutputFormat::Json => {
            let json = serde_json::json!({
                "directory": target_dir.to_string_lossy(),
                "written": written.iter().map(|p| p.to_string_lossy().into_owned()).collect::<Vec<_>>(),
                "count": written.len()
            });
            Ok(format.to_json(&json))
        }
    }
}
