//! Shared conversation state

use crate::llm::Message;

/// Conversation state carried across turns and handoffs
#[derive(Debug, Default)]
pub struct AgentContext {
    pub history: Vec<Message>,
}

impl AgentContext {
    pub fn new() -> Self {
        Self::default()
    }
}
