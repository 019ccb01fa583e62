//! Agent run loop
//!
//! Drives one user turn: repeatedly calls the LLM for the active agent,
//! executes requested tools, and follows handoffs until the active agent
//! produces a final reply.

use std::sync::Arc;

use eyre::{Result, eyre};
use tracing::{debug, warn};

use super::Agent;
use super::context::AgentContext;
use super::registry::AgentRegistry;
use crate::llm::{CompletionRequest, ContentBlock, LlmClient, Message, StopReason, ToolCall, ToolDefinition};
use crate::prompts::PromptManager;
use crate::tools::{ToolResult, definition_for};

/// Upper bound on LLM round-trips in a single user turn
const MAX_TOOL_ROUNDS: u32 = 8;

/// Tool name prefix used to expose handoffs to the LLM
const HANDOFF_PREFIX: &str = "transfer_to_";

pub struct Runner {
    registry: Arc<AgentRegistry>,
    llm: Arc<dyn LlmClient>,
    prompts: Arc<PromptManager>,
    max_tokens: u32,
}

impl Runner {
    pub fn new(
        registry: Arc<AgentRegistry>,
        llm: Arc<dyn LlmClient>,
        prompts: Arc<PromptManager>,
        max_tokens: u32,
    ) -> Self {
        Self {
            registry,
            llm,
            prompts,
            max_tokens,
        }
    }

    /// Process one user input and return the final reply text
    ///
    /// The user message and every intermediate message (tool uses, tool
    /// results, the final reply) are appended to the context history.
    pub async fn run(&self, starting_agent: &str, context: &mut AgentContext, user_input: &str) -> Result<String> {
        debug!(%starting_agent, "run: called");

        let mut agent = self
            .registry
            .get_agent(starting_agent)
            .ok_or_else(|| eyre!("agent '{}' is not registered", starting_agent))?;

        context.history.push(Message::user(user_input));

        for round in 0..MAX_TOOL_ROUNDS {
            debug!(round, agent = %agent.name(), "run: completion round");

            let request = CompletionRequest {
                system_prompt: agent.instructions(&self.prompts)?,
                messages: context.history.clone(),
                tools: self.tool_definitions(agent.as_ref()),
                max_tokens: self.max_tokens,
            };

            let response = self
                .llm
                .complete(request)
                .await
                .map_err(|e| eyre!("LLM error: {}", e))?;

            match response.stop_reason {
                StopReason::ToolUse => {
                    if response.tool_calls.is_empty() {
                        warn!("run: tool_use stop with no tool calls");
                        let reply = response.content.unwrap_or_default();
                        context.history.push(Message::assistant(&reply));
                        return Ok(reply);
                    }

                    let mut blocks: Vec<ContentBlock> = Vec::new();
                    if let Some(ref content) = response.content {
                        blocks.push(ContentBlock::text(content));
                    }
                    for tc in &response.tool_calls {
                        blocks.push(ContentBlock::ToolUse {
                            id: tc.id.clone(),
                            name: tc.name.clone(),
                            input: tc.input.clone(),
                        });
                    }
                    context.history.push(Message::assistant_blocks(blocks));

                    let mut result_blocks: Vec<ContentBlock> = Vec::new();
                    for tc in &response.tool_calls {
                        let result = self.dispatch_tool_call(&mut agent, tc).await;
                        result_blocks.push(ContentBlock::tool_result(&tc.id, &result.content, result.is_error));
                    }
                    context.history.push(Message::user_blocks(result_blocks));
                }
                StopReason::MaxTokens => {
                    warn!("run: response truncated at max tokens");
                    let reply = response.content.unwrap_or_default();
                    context.history.push(Message::assistant(&reply));
                    return Ok(reply);
                }
                StopReason::EndTurn | StopReason::StopSequence => {
                    let reply = response.content.unwrap_or_default();
                    context.history.push(Message::assistant(&reply));
                    return Ok(reply);
                }
            }
        }

        Err(eyre!("tool round limit ({}) reached without a final reply", MAX_TOOL_ROUNDS))
    }

    /// Execute a tool call, switching the active agent on handoff
    async fn dispatch_tool_call(&self, agent: &mut Arc<dyn Agent>, tc: &ToolCall) -> ToolResult {
        debug!(tool = %tc.name, "dispatch_tool_call: called");

        if let Some(target) = tc.name.strip_prefix(HANDOFF_PREFIX) {
            if !agent.handoffs().contains(&target) {
                return ToolResult::error(format!("handoff to '{target}' is not allowed"));
            }
            return match self.registry.get_agent(target) {
                Some(next) => {
                    debug!(from = %agent.name(), to = %target, "dispatch_tool_call: handoff");
                    *agent = next;
                    ToolResult::success(format!("Transferred to {target}"))
                }
                None => ToolResult::error(format!("agent '{target}' is not registered")),
            };
        }

        match agent.tools().iter().find(|t| t.name() == tc.name) {
            Some(tool) => tool.execute(tc.input.clone()).await,
            None => {
                warn!(tool = %tc.name, "dispatch_tool_call: unknown tool");
                ToolResult::error(format!("unknown tool '{}'", tc.name))
            }
        }
    }

    /// Tool definitions for the active agent, handoffs included
    fn tool_definitions(&self, agent: &dyn Agent) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> = agent.tools().iter().map(|t| definition_for(t.as_ref())).collect();

        for target in agent.handoffs() {
            defs.push(ToolDefinition::new(
                format!("{HANDOFF_PREFIX}{target}"),
                format!("Hand the conversation off to the {target} agent."),
                serde_json::json!({ "type": "object", "properties": {} }),
            ));
        }

        defs
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use serde_json::Value;

    use super::*;
    use crate::llm::client::mock::MockLlmClient;
    use crate::llm::{CompletionResponse, TokenUsage};
    use crate::tools::Tool;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &'static str {
            "echo"
        }

        fn description(&self) -> &'static str {
            "Echo the input back"
        }

        fn input_schema(&self) -> Value {
            serde_json::json!({ "type": "object" })
        }

        async fn execute(&self, input: Value) -> ToolResult {
            ToolResult::success(input["text"].as_str().unwrap_or("").to_string())
        }
    }

    struct EchoAgent {
        tools: Vec<Arc<dyn Tool>>,
        handoffs: Vec<&'static str>,
    }

    impl EchoAgent {
        fn new(handoffs: Vec<&'static str>) -> Self {
            Self {
                tools: vec![Arc::new(EchoTool)],
                handoffs,
            }
        }
    }

    impl Agent for EchoAgent {
        fn name(&self) -> &'static str {
            "echo_agent"
        }

        fn template_name(&self) -> &'static str {
            "echo/echo_agent"
        }

        fn instructions(&self, _prompts: &PromptManager) -> Result<String> {
            Ok("You echo things.".to_string())
        }

        fn tools(&self) -> &[Arc<dyn Tool>] {
            &self.tools
        }

        fn handoffs(&self) -> &[&'static str] {
            &self.handoffs
        }
    }

    struct FinalAgent;

    impl Agent for FinalAgent {
        fn name(&self) -> &'static str {
            "final_agent"
        }

        fn template_name(&self) -> &'static str {
            "final/final_agent"
        }

        fn instructions(&self, _prompts: &PromptManager) -> Result<String> {
            Ok("You finish conversations.".to_string())
        }

        fn tools(&self) -> &[Arc<dyn Tool>] {
            &[]
        }
    }

    fn text_response(text: &str) -> CompletionResponse {
        CompletionResponse {
            content: Some(text.to_string()),
            tool_calls: vec![],
            stop_reason: StopReason::EndTurn,
            usage: TokenUsage::default(),
        }
    }

    fn tool_response(name: &str, input: Value) -> CompletionResponse {
        CompletionResponse {
            content: None,
            tool_calls: vec![ToolCall {
                id: "call_1".to_string(),
                name: name.to_string(),
                input,
            }],
            stop_reason: StopReason::ToolUse,
            usage: TokenUsage::default(),
        }
    }

    fn runner_with(responses: Vec<CompletionResponse>, agents: Vec<Arc<dyn Agent>>) -> (Runner, Arc<MockLlmClient>) {
        let mut registry = AgentRegistry::new();
        for agent in agents {
            registry.register_agent(agent);
        }
        let llm = Arc::new(MockLlmClient::new(responses));
        let runner = Runner::new(
            Arc::new(registry),
            llm.clone(),
            Arc::new(PromptManager::new()),
            1024,
        );
        (runner, llm)
    }

    #[tokio::test]
    async fn test_run_plain_reply() {
        let (runner, llm) = runner_with(
            vec![text_response("Hello there")],
            vec![Arc::new(EchoAgent::new(vec![]))],
        );

        let mut context = AgentContext::new();
        let reply = runner.run("echo_agent", &mut context, "hi").await.unwrap();

        assert_eq!(reply, "Hello there");
        assert_eq!(llm.call_count(), 1);
        assert_eq!(context.history.len(), 2);
    }

    #[tokio::test]
    async fn test_run_tool_round_trip() {
        let (runner, llm) = runner_with(
            vec![
                tool_response("echo", serde_json::json!({ "text": "ping" })),
                text_response("The tool said ping"),
            ],
            vec![Arc::new(EchoAgent::new(vec![]))],
        );

        let mut context = AgentContext::new();
        let reply = runner.run("echo_agent", &mut context, "use the tool").await.unwrap();

        assert_eq!(reply, "The tool said ping");
        assert_eq!(llm.call_count(), 2);
        // user, assistant tool use, tool result, final assistant
        assert_eq!(context.history.len(), 4);
    }

    #[tokio::test]
    async fn test_run_handoff_switches_agent() {
        let (runner, llm) = runner_with(
            vec![
                tool_response("transfer_to_final_agent", serde_json::json!({})),
                text_response("Handled by the specialist"),
            ],
            vec![
                Arc::new(EchoAgent::new(vec!["final_agent"])),
                Arc::new(FinalAgent),
            ],
        );

        let mut context = AgentContext::new();
        let reply = runner.run("echo_agent", &mut context, "route me").await.unwrap();

        assert_eq!(reply, "Handled by the specialist");
        assert_eq!(llm.call_count(), 2);
    }

    #[tokio::test]
    async fn test_run_handoff_not_allowed() {
        let (runner, _) = runner_with(
            vec![
                tool_response("transfer_to_final_agent", serde_json::json!({})),
                text_response("Recovered"),
            ],
            vec![Arc::new(EchoAgent::new(vec![])), Arc::new(FinalAgent)],
        );

        let mut context = AgentContext::new();
        let reply = runner.run("echo_agent", &mut context, "route me").await.unwrap();

        // Handoff rejected; the model sees the error result and replies itself
        assert_eq!(reply, "Recovered");
    }

    #[tokio::test]
    async fn test_run_unknown_agent() {
        let (runner, _) = runner_with(vec![], vec![]);
        let mut context = AgentContext::new();
        let result = runner.run("ghost", &mut context, "hi").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_run_unknown_tool_reported_to_model() {
        let (runner, _) = runner_with(
            vec![
                tool_response("nonexistent", serde_json::json!({})),
                text_response("Sorry, no such tool"),
            ],
            vec![Arc::new(EchoAgent::new(vec![]))],
        );

        let mut context = AgentContext::new();
        let reply = runner.run("echo_agent", &mut context, "hi").await.unwrap();
        assert_eq!(reply, "Sorry, no such tool");
    }
}
