//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

use crate::prompts::PromptVars;

/// arxivchat - chat agents for searching arXiv
#[derive(Parser)]
#[command(
    name = "axc",
    about = "Chat agents for searching arXiv, driven by YAML prompt templates",
    version,
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start an interactive chat session (default)
    Chat,

    /// Inspect and render prompt templates
    Prompt {
        /// Template name, e.g. triage_agent or triage/triage_agent
        name: Option<String>,

        /// Variables for rendering, as key=value pairs
        #[arg(long, value_name = "KEY=VALUE", num_args = 1..)]
        vars: Vec<String>,

        /// List available template names
        #[arg(long)]
        list: bool,

        /// Show the resolved record and inheritance chain instead of rendering
        #[arg(long)]
        debug: bool,
    },

    /// List registered agents
    Agents,
}

/// Parse key=value pairs into template variables
///
/// Pairs without an '=' are skipped with a warning.
pub fn parse_vars(pairs: &[String]) -> PromptVars {
    debug!(pair_count = %pairs.len(), "parse_vars: called");
    let mut vars = PromptVars::new();
    for pair in pairs {
        match pair.split_once('=') {
            Some((key, value)) => {
                vars.insert(key.to_string(), serde_json::Value::String(value.to_string()));
            }
            None => {
                tracing::warn!(%pair, "parse_vars: skipping malformed pair, expected key=value");
            }
        }
    }
    vars
}
