//! arxivchat - chat agents for searching arXiv
//!
//! A small agent system built around a YAML prompt template store. The
//! triage agent fronts every conversation and hands off to the arXiv search
//! specialist, which calls the arXiv query API through a tool. Prompts are
//! YAML records with single-parent `_extends` inheritance, rendered with
//! Handlebars.
//!
//! # Modules
//!
//! - [`prompts`] - prompt template store, inheritance resolution, rendering
//! - [`agents`] - agent trait, registry, and the run loop
//! - [`llm`] - LLM client trait and the Azure OpenAI implementation
//! - [`arxiv`] - arXiv query API client and Atom feed parsing
//! - [`tools`] - tools agents can call
//! - [`config`] - configuration types and loading
//! - [`cli`] - command-line interface

pub mod agents;
pub mod arxiv;
pub mod cli;
pub mod config;
pub mod llm;
pub mod prompts;
pub mod tools;

// Re-export commonly used types
pub use agents::{Agent, AgentContext, AgentRegistry, ArxivSearchAgent, Runner, TriageAgent};
pub use arxiv::{ArxivClient, ArxivError, Paper, SearchQuery, SortBy};
pub use config::{ArxivConfig, Config, LlmConfig, PromptsConfig};
pub use llm::{AzureOpenAIClient, CompletionRequest, CompletionResponse, LlmClient, LlmError, create_client};
pub use prompts::{PromptManager, PromptVars};
pub use tools::{SearchPapersTool, Tool, ToolResult};
