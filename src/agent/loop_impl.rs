//! Agent loop - core message processing

use std::sync::Arc;

use tracing::{debug, info};

use crate::error::Error;
use crate::Result;

use super::context::Context;
use super::llm::LlmClient;
use super::message::{Message, Response, ToolCallRequest};

/// The agent loop processes messages through LLM and tool execution
pub struct AgentLoop {
    client: Arc<dyn LlmClient>,
    max_iterations: usize,
}

impl AgentLoop {
    /// Create a new agent loop
    pub fn new(client: Arc<dyn LlmClient>, max_iterations: usize) -> Self {
        Self {
            client,
            max_iterations,
        }
    }

    /// Run the agent loop for a single message
    pub async fn run(&self, history: &[Message], message: Message, ctx: &Context) -> Result<Response> {
        let mut messages = ctx.build_messages(history, &message.content);

        info!("Starting agent loop with message: {}", message.content);

        for iteration in 0..self.max_iterations {
            debug!("Iteration {}/{}", iteration + 1, self.max_iterations);

            let tools = ctx.tool_runner.definitions();

            let response = self.client.chat(&messages, &tools).await?;

            if !response.has_tool_calls() {
                let content = response.content.unwrap_or_default();
                info!("Agent completed with response: {} chars", content.len());
                return Ok(Response::new(content));
            }

            messages.push(Message::assistant_with_tools(
                response.content.clone().unwrap_or_default(),
                response.tool_calls.clone(),
            ));

            for tool_call in &response.tool_calls {
                let result = self.execute_tool(ctx, tool_call).await;
                messages.push(Message::tool_result(&tool_call.id, result));
            }
        }

        Err(Error::MaxIterations)
    }

    async fn execute_tool(&self, ctx: &Context, tool_call: &ToolCallRequest) -> String {
        debug!("Executing tool: {} with args: {}", tool_call.name, tool_call.arguments);

        let tctx = ctx.tool_context();
        match ctx
            .tool_runner
            .execute(&tool_call.name, &tctx, tool_call.arguments.clone())
            .await
        {
            Ok(result) => {
                debug!("Tool {} succeeded: {} chars", tool_call.name, result.len());
                result
            }
            Err(e) => {
                // Tool failures go back to the model as text, never panic.
                let error_msg = format!("Error: {}", e);
                debug!("Tool {} failed: {}", tool_call.name, error_msg);
                error_msg
            }
        }
    }
}
