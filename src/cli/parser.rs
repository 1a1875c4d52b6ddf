//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::server::config::{DEFAULT_HOST, DEFAULT_PORT, DEFAULT_UPLOAD_DIR};

/// `CamGPT`: agentic image analysis backend.
///
/// Describes an image with a vision model, decides whether the answer
/// needs current facts, and enriches it with web search when it does.
#[derive(Parser, Debug)]
#[command(name = "camgpt")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, default_value = "text", global = true)]
    pub format: String,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP API server.
    #[command(after_help = r#"Examples:
  camgpt serve                         # Listen on 0.0.0.0:8080
  camgpt serve --port 3000             # Custom port
  PORT=9000 camgpt serve               # Port from the environment
"#)]
    Serve {
        /// Address to bind.
        #[arg(long, env = "CAMGPT_HOST", default_value = DEFAULT_HOST)]
        host: String,

        /// Port to listen on.
        #[arg(short, long, env = "PORT", default_value_t = DEFAULT_PORT)]
        port: u16,

        /// Directory uploads are staged in.
        #[arg(long, env = "CAMGPT_UPLOAD_DIR", default_value = DEFAULT_UPLOAD_DIR)]
        upload_dir: PathBuf,
    },

    /// Analyze a local image file once.
    #[command(after_help = r#"Examples:
  camgpt analyze poster.jpg -p "What movie is this and how is it rated?"
  camgpt analyze logo.png                        # Default description prompt
  camgpt --format json analyze menu.jpg | jq '.agent.webSearchUsed'
"#)]
    Analyze {
        /// Path to the image (jpg, png, gif, webp, heic, bmp).
        image: PathBuf,

        /// Instruction to apply to the image.
        #[arg(short, long)]
        prompt: Option<String>,

        /// Override the vision model.
        #[arg(long)]
        vision_model: Option<String>,

        /// Override the decision model.
        #[arg(long)]
        decision_model: Option<String>,

        /// Override the fusion model.
        #[arg(long)]
        fusion_model: Option<String>,

        /// Directory containing custom prompt templates.
        #[arg(long, env = "CAMGPT_PROMPT_DIR")]
        prompt_dir: Option<PathBuf>,
    },

    /// Check connectivity to the model and search APIs.
    Health,

    /// Write default prompt templates to a directory for customization.
    #[command(after_help = r#"Examples:
  camgpt init-prompts                    # Write to ~/.config/camgpt/prompts/
  camgpt init-prompts --dir ./prompts    # Write to a custom directory
"#)]
    InitPrompts {
        /// Target directory (default: ~/.config/camgpt/prompts/).
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_analyze() {
        let cli = Cli::try_parse_from([
            "camgpt",
            "--format",
            "json",
            "analyze",
            "poster.jpg",
            "--prompt",
            "rating?",
            "--fusion-model",
            "gpt-4.1",
        ])
        .unwrap_or_else(|_| unreachable!());
        assert_eq!(cli.format, "json");
        match cli.command {
            Commands::Analyze {
                image,
                prompt,
                fusion_model,
                vision_model,
                ..
            } => {
                assert_eq!(image, PathBuf::from("poster.jpg"));
                assert_eq!(prompt.as_deref(), Some("rating?"));
                assert_eq!(fusion_model.as_deref(), Some("gpt-4.1"));
                assert!(vision_model.is_none());
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_analyze_requires_image() {
        assert!(Cli::try_parse_from(["camgpt", "analyze"]).is_err());
    }

    #[test]
    fn test_global_verbose_after_subcommand() {
        let cli = Cli::try_parse_from(["camgpt", "health", "-v"]).unwrap_or_else(|_| unreachable!());
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Health));
    }
}
