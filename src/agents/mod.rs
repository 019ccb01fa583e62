//! Chat agents
//!
//! Each agent pairs a prompt template with a set of tools. The triage agent
//! fronts the conversation and hands off to specialists; the runner drives
//! the completion/tool loop until the active agent produces a final reply.

use std::sync::Arc;

use eyre::Result;

mod arxiv_search;
mod context;
mod identity;
mod registry;
mod runner;
mod triage;

pub use arxiv_search::ArxivSearchAgent;
pub use context::AgentContext;
pub use identity::{ARXIV_SEARCH_AGENT, TRIAGE_AGENT, TRIAGE_TASK, task_agents};
pub use registry::AgentRegistry;
pub use runner::Runner;
pub use triage::TriageAgent;

use crate::prompts::PromptManager;
use crate::tools::Tool;

/// A conversational agent
pub trait Agent: Send + Sync {
    /// Registry name (matches handoff targets)
    fn name(&self) -> &'static str;

    /// Prompt template rendered into the system prompt
    fn template_name(&self) -> &'static str;

    /// System prompt for this agent
    fn instructions(&self, prompts: &PromptManager) -> Result<String> {
        prompts.get_prompt(self.template_name(), None)
    }

    /// Tools this agent may call
    fn tools(&self) -> &[Arc<dyn Tool>];

    /// Names of agents this agent may hand the conversation to
    fn handoffs(&self) -> &[&'static str] {
        &[]
    }
}
