//! arXiv search agent

use std::sync::Arc;

use super::Agent;
use super::identity::ARXIV_SEARCH_AGENT;
use crate::arxiv::ArxivClient;
use crate::tools::{SearchPapersTool, Tool};

/// Paper-search specialist
pub struct ArxivSearchAgent {
    tools: Vec<Arc<dyn Tool>>,
}

impl ArxivSearchAgent {
    pub fn new(client: Arc<ArxivClient>) -> Self {
        Self {
            tools: vec![Arc::new(SearchPapersTool::new(client))],
        }
    }
}

impl Agent for ArxivSearchAgent {
    fn name(&self) -> &'static str {
        ARXIV_SEARCH_AGENT
    }

    fn template_name(&self) -> &'static str {
        "arxiv_search/arxiv_search_agent"
    }

    fn tools(&self) -> &[Arc<dyn Tool>] {
        &self.tools
    }
}
