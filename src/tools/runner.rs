//! Tool runner - manages and executes tools

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;
use crate::Result;

use super::{Tool, ToolContext};

/// Tool definition for LLM
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Tool runner manages registered tools and executes them
#[derive(Default)]
pub struct ToolRunner {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRunner {
    /// Create an empty tool runner
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        self.tools.insert(tool.name().to_string(), Arc::new(tool));
    }

    /// Register an already-shared tool (remote tools arrive as `Arc`s)
    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Get tool definitions for LLM
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.to_definition()).collect()
    }

    /// Execute a tool by name
    pub async fn execute(&self, name: &str, ctx: &ToolContext, params: Value) -> Result<String> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| Error::Tool(format!("Unknown tool: {}", name)))?;

        tool.execute(ctx, params).await
    }

    /// Check if a tool exists
    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// List registered tool names
    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::DummyTool;

    #[tokio::test]
    async fn test_tool_runner_register_and_execute() {
        let mut runner = ToolRunner::new();
        runner.register(DummyTool {
            name: "test_tool".to_string(),
            result: "success".to_string(),
        });

        assert!(runner.has("test_tool"));

        let ctx = ToolContext::default();
        let result = runner
            .execute("test_tool", &ctx, serde_json::json!({}))
            .await
            .unwrap();
        assert_eq!(result, "success");
    }

    #[tokio::test]
    async fn test_tool_runner_unknown_tool() {
        let runner = ToolRunner::new();
        let ctx = ToolContext::default();
        let result = runner.execute("unknown", &ctx, serde_json::json!({})).await;
        assert!(result.is_err());
    }
}
