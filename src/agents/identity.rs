//! Agent identity map

pub const TRIAGE_TASK: &str = "triage";
pub const TRIAGE_AGENT: &str = "triage_agent";
pub const ARXIV_SEARCH_AGENT: &str = "arxiv_search_agent";

/// Agents responsible for a given task name
pub fn task_agents(task: &str) -> Vec<&'static str> {
    match task.to_lowercase().as_str() {
        TRIAGE_TASK => vec![TRIAGE_AGENT],
        _ => vec![],
    }
}
