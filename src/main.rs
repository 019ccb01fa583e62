//! arxivchat - chat agents for searching arXiv
//!
//! CLI entry point for the chat session, the prompt template viewer, and
//! the agent listing.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{CommandFactory, Parser};
use colored::Colorize;
use eyre::{Context, Result, eyre};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::{debug, info};

use arxivchat::agents::{AgentContext, AgentRegistry, ArxivSearchAgent, Runner, TRIAGE_AGENT, TriageAgent};
use arxivchat::arxiv::ArxivClient;
use arxivchat::cli::{Cli, Command, parse_vars};
use arxivchat::config::Config;
use arxivchat::llm::create_client;
use arxivchat::prompts::{PromptManager, PromptVars};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("arxivchat")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level_str = cli_log_level.or(config_log_level);
    let level = if let Some(s) = level_str {
        match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        }
    } else {
        tracing::Level::INFO
    };

    let log_file = fs::File::create(log_dir.join("arxivchat.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());

    // Setup logging with priority: CLI > config > INFO default
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        None | Some(Command::Chat) => cmd_chat(&config).await,
        Some(Command::Prompt { name, vars, list, debug }) => cmd_prompt(&config, name.as_deref(), &vars, list, debug),
        Some(Command::Agents) => cmd_agents(&config),
    }
}

/// Build the agent registry used by chat and the agent listing
fn build_registry(config: &Config) -> Result<AgentRegistry> {
    let arxiv = Arc::new(ArxivClient::from_config(&config.arxiv)?);

    let mut registry = AgentRegistry::new();
    registry.register_agent(Arc::new(TriageAgent::new()));
    registry.register_agent(Arc::new(ArxivSearchAgent::new(arxiv)));
    Ok(registry)
}

/// Interactive chat session
async fn cmd_chat(config: &Config) -> Result<()> {
    debug!("cmd_chat: called");
    config.validate()?;

    let prompts = Arc::new(PromptManager::new());
    prompts.initialize(&config.prompts.dir);

    let llm = create_client(&config.llm)?;
    let registry = Arc::new(build_registry(config)?);
    let runner = Runner::new(registry, llm, prompts, config.llm.max_tokens);
    let mut context = AgentContext::new();

    println!();
    println!("{}", "arxivchat".bright_cyan().bold());
    println!(
        "Ask about papers on arXiv. {} or {} to quit.",
        "Ctrl+C".yellow(),
        "Ctrl+D".yellow()
    );
    println!();

    let mut rl = DefaultEditor::new().map_err(|e| eyre!("Failed to initialize readline: {}", e))?;

    loop {
        let readline = rl.readline(&format!("{} ", "you>".bright_green()));

        match readline {
            Ok(line) => {
                let input = line.trim();
                if input.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(input);

                match runner.run(TRIAGE_AGENT, &mut context, input).await {
                    Ok(reply) => {
                        println!("{} {}", "bot>".bright_blue(), reply);
                    }
                    Err(e) => {
                        eprintln!("{} {}", "Error:".red(), e);
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("\nChat ended.");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!();
                break;
            }
            Err(err) => {
                return Err(eyre!("Readline error: {}", err));
            }
        }
    }

    Ok(())
}

/// Prompt template viewer
fn cmd_prompt(config: &Config, name: Option<&str>, vars: &[String], list: bool, debug: bool) -> Result<()> {
    // A field value named `debug` collides with tracing's internal
    // `field::debug` import inside the macro expansion, so bind it first.
    let debug_flag = debug;
    debug!(?name, list, debug = debug_flag, "cmd_prompt: called");

    let prompts = PromptManager::new();
    prompts.initialize(&config.prompts.dir);

    if list {
        for template in prompts.list_available_templates()? {
            println!("{}", template);
        }
        return Ok(());
    }

    let Some(name) = name else {
        let mut cmd = Cli::command();
        if let Some(sub) = cmd.find_subcommand_mut("prompt") {
            sub.print_help().context("Failed to print help")?;
        }
        return Ok(());
    };

    if debug {
        let record = prompts.resolve(name)?;
        let chain = prompts.inheritance_chain(name)?;

        println!("{}", "=".repeat(50));
        println!("Template: {}", name.bright_cyan());
        if chain.len() > 1 {
            println!("Inheritance: {}", chain.join(" -> "));
        }
        println!("{}", "=".repeat(50));
        let yaml = serde_yaml::to_string(&record).context("Failed to serialize resolved record")?;
        print!("{}", yaml);
        println!("{}", "=".repeat(50));
        return Ok(());
    }

    let variables: PromptVars = parse_vars(vars);
    let rendered = prompts.get_prompt(name, Some(&variables))?;

    println!("{}", "=".repeat(50));
    println!("Template: {}", name.bright_cyan());
    println!("{}", "=".repeat(50));
    println!("{}", rendered);
    println!("{}", "=".repeat(50));
    Ok(())
}

/// List registered agents
fn cmd_agents(config: &Config) -> Result<()> {
    debug!("cmd_agents: called");
    let registry = build_registry(config)?;
    for name in registry.list_agents() {
        println!("{}", name);
    }
    Ok(())
}
