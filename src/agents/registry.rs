//! Agent registry

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use super::Agent;

/// Registry of agent instances, keyed by name
#[derive(Default)]
pub struct AgentRegistry {
    agents: HashMap<String, Arc<dyn Agent>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        debug!("AgentRegistry::new: called");
        Self::default()
    }

    /// Register an agent; the first registration for a name wins
    pub fn register_agent(&mut self, agent: Arc<dyn Agent>) {
        let name = agent.name();
        if self.agents.contains_key(name) {
            warn!(%name, "register_agent: agent already registered");
            return;
        }
        debug!(%name, "register_agent: registered");
        self.agents.insert(name.to_string(), agent);
    }

    /// Look up an agent by name
    pub fn get_agent(&self, name: &str) -> Option<Arc<dyn Agent>> {
        match self.agents.get(name) {
            Some(agent) => {
                debug!(%name, "get_agent: found");
                Some(Arc::clone(agent))
            }
            None => {
                warn!(%name, "get_agent: not registered");
                None
            }
        }
    }

    /// Names of all registered agents, sorted
    pub fn list_agents(&self) -> Vec<String> {
        let mut names: Vec<String> = self.agents.keys().cloned().collect();
        names.sort();
        debug!(?names, "list_agents: called");
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompts::PromptManager;
    use crate::tools::Tool;
    use eyre::Result;

    struct StubAgent {
        name: &'static str,
    }

    impl Agent for StubAgent {
        fn name(&self) -> &'static str {
            self.name
        }

        fn template_name(&self) -> &'static str {
            "stub/stub"
        }

        fn instructions(&self, _prompts: &PromptManager) -> Result<String> {
            Ok("stub".to_string())
        }

        fn tools(&self) -> &[Arc<dyn Tool>] {
            &[]
        }
    }

    #[test]
    fn test_register_and_get() {
        let mut registry = AgentRegistry::new();
        registry.register_agent(Arc::new(StubAgent { name: "alpha" }));

        assert!(registry.get_agent("alpha").is_some());
        assert!(registry.get_agent("missing").is_none());
    }

    #[test]
    fn test_duplicate_registration_keeps_first() {
        let mut registry = AgentRegistry::new();
        registry.register_agent(Arc::new(StubAgent { name: "alpha" }));
        registry.register_agent(Arc::new(StubAgent { name: "alpha" }));

        assert_eq!(registry.list_agents(), vec!["alpha"]);
    }

    #[test]
    fn test_list_agents_sorted() {
        let mut registry = AgentRegistry::new();
        registry.register_agent(Arc::new(StubAgent { name: "zeta" }));
        registry.register_agent(Arc::new(StubAgent { name: "alpha" }));

        assert_eq!(registry.list_agents(), vec!["alpha", "zeta"]);
    }
}
