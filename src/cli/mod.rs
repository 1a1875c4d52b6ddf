//! CLI layer for camgpt.
//!
//! Provides the command-line interface using clap, with commands for
//! serving the HTTP API, one-off image analysis and health checks.

pub mod commands;
pub mod output;
pub mod parser;

pub use commands::execute;
pub use output::OutputFormat;
pub use parser::{Cli, Commands};
