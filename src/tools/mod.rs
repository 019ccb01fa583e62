//! Agent tools
//!
//! Tools the LLM can call during a conversation turn.

mod search_papers;
mod traits;

pub use search_papers::SearchPapersTool;
pub use traits::{Tool, ToolResult};

use crate::llm::ToolDefinition;

/// Build the LLM-facing definition for a tool
pub fn definition_for(tool: &dyn Tool) -> ToolDefinition {
    ToolDefinition::new(tool.name(), tool.description(), tool.input_schema())
}
