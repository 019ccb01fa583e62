//! LLM client module
//!
//! Chat-completion requests against an Azure OpenAI deployment.

use std::sync::Arc;

use tracing::debug;

mod azure;
pub mod client;
mod error;
mod types;

pub use azure::AzureOpenAIClient;
pub use client::LlmClient;
pub use error::LlmError;
#[allow(unused_imports)]
pub use types::Role;
pub use types::{
    CompletionRequest, CompletionResponse, ContentBlock, Message, MessageContent, StopReason, TokenUsage, ToolCall,
    ToolDefinition,
};

use crate::config::LlmConfig;

/// Create an LLM client for the configured deployment.
///
/// The client owns a pooled HTTP connection; construct it once at startup
/// and share the `Arc` across agents rather than building one per call.
pub fn create_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>, LlmError> {
    debug!(deployment = %config.deployment, "create_client: called");
    Ok(Arc::new(AzureOpenAIClient::from_config(config)?))
}
