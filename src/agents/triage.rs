//! Triage agent
//!
//! First responder for every conversation; answers directly or hands off
//! to a specialist agent.

use std::sync::Arc;

use super::Agent;
use super::identity::{ARXIV_SEARCH_AGENT, TRIAGE_AGENT};
use crate::tools::Tool;

pub struct TriageAgent {
    tools: Vec<Arc<dyn Tool>>,
    handoffs: Vec<&'static str>,
}

impl TriageAgent {
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            handoffs: vec![ARXIV_SEARCH_AGENT],
        }
    }
}

impl Default for TriageAgent {
    fn default() -> Self {
        Self::new()
    }
}

impl Agent for TriageAgent {
    fn name(&self) -> &'static str {
        TRIAGE_AGENT
    }

    fn template_name(&self) -> &'static str {
        "triage/triage_agent"
    }

    fn tools(&self) -> &[Arc<dyn Tool>] {
        &self.tools
    }

    fn handoffs(&self) -> &[&'static str] {
        &self.handoffs
    }
}
