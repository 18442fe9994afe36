//! Tools module - agent capabilities
//!
//! Tools are actions the agent can take. Local tools run in-process;
//! remote tools are discovered from the tool-set endpoint and dispatched
//! over HTTP (see [`crate::toolset`]).

mod runner;

pub mod oauth;

pub use runner::{ToolDefinition, ToolRunner};

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::session::SessionState;
use crate::Result;

/// Per-call context handed to every tool and transport invocation.
///
/// Carries the conversation's session state (when there is one) and a
/// shared HTTP client. Passed explicitly by reference; nothing is ambient.
#[derive(Clone)]
pub struct ToolContext {
    session: Option<SessionState>,
    http: Client,
}

impl ToolContext {
    /// Context bound to a conversation.
    pub fn new(session: SessionState, http: Client) -> Self {
        Self {
            session: Some(session),
            http,
        }
    }

    /// Context without a conversation (e.g., startup-time tool discovery).
    pub fn detached(http: Client) -> Self {
        Self {
            session: None,
            http,
        }
    }

    /// Session state, if this call is bound to a conversation.
    pub fn session(&self) -> Option<&SessionState> {
        self.session.as_ref()
    }

    /// Shared HTTP client.
    pub fn http(&self) -> &Client {
        &self.http
    }
}

impl Default for ToolContext {
    fn default() -> Self {
        Self::detached(Client::new())
    }
}

/// Tool trait - interface for all agent tools
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name used in function calls
    fn name(&self) -> &str;

    /// Description of what the tool does
    fn description(&self) -> &str;

    /// JSON Schema for parameters
    fn parameters(&self) -> Value;

    /// Execute the tool with given parameters
    async fn execute(&self, ctx: &ToolContext, params: Value) -> Result<String>;

    /// Convert to tool definition for LLM
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters(),
        }
    }
}

/// Dummy tool for testing
#[cfg(test)]
pub struct DummyTool {
    pub name: String,
    pub result: String,
}

#[cfg(test)]
#[async_trait]
impl Tool for DummyTool {
    fn name(&self) -> &str {
        &self.name
    }
    fn description(&self) -> &str {
        "Dummy tool for testing"
    }
    fn parameters(&self) -> Value {
        serde_json::json!({"type": "object"})
    }

    async fn execute(&self, _ctx: &ToolContext, _params: Value) -> Result<String> {
        Ok(self.result.clone())
    }
}
