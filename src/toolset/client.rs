//! Remote tool-set client.
//!
//! Speaks MCP-style JSON-RPC over HTTP to the streaming tool-set endpoint.
//! All requests — initialize, discovery, and tool calls — are dispatched
//! through the configured [`Transport`], so the bearer relay applies to
//! the whole tool-set without this client knowing about authentication.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use reqwest::header::ACCEPT;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::error::Error;
use crate::tools::{Tool, ToolContext};
use crate::Result;

use super::protocol::{
    first_sse_data, CallToolResult, RpcRequest, RpcResponse, ToolDescriptor, ToolsListResult,
    PROTOCOL_VERSION,
};
use super::transport::Transport;

const ACCEPT_TYPES: &str = "application/json, text/event-stream";

/// Client for one remote tool-set endpoint.
pub struct ToolsetClient {
    endpoint: String,
    http: Client,
    transport: Arc<dyn Transport>,
    next_id: AtomicU64,
}

impl ToolsetClient {
    pub fn new(endpoint: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        Self {
            endpoint: endpoint.into(),
            http: Client::new(),
            transport,
            next_id: AtomicU64::new(1),
        }
    }

    async fn dispatch(&self, rpc: &RpcRequest, ctx: &ToolContext) -> Result<Option<Value>> {
        let request = self
            .http
            .post(&self.endpoint)
            .header(ACCEPT, ACCEPT_TYPES)
            .json(rpc)
            .build()?;

        let response = self.transport.send(request, ctx).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Toolset(format!(
                "tool-set endpoint returned {}",
                status
            )));
        }

        // Notifications have no response payload worth parsing.
        if rpc.id.is_none() {
            return Ok(None);
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        let body = response.text().await?;

        let payload = if content_type.contains("text/event-stream") {
            first_sse_data(&body).ok_or_else(|| {
                Error::Toolset("event stream contained no data event".to_string())
            })?
        } else {
            body
        };

        let parsed: RpcResponse = serde_json::from_str(&payload)?;

        if let Some(error) = parsed.error {
            return Err(Error::Toolset(format!(
                "RPC error {}: {}",
                error.code, error.message
            )));
        }

        let result = parsed
            .result
            .ok_or_else(|| Error::Toolset("response carried neither result nor error".to_string()))?;
        Ok(Some(result))
    }

    async fn call(&self, method: &str, params: Value, ctx: &ToolContext) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let rpc = RpcRequest::call(id, method, params);
        debug!(method, id, "Dispatching tool-set request");

        self.dispatch(&rpc, ctx)
            .await?
            .ok_or_else(|| Error::Toolset("missing result".to_string()))
    }

    /// Run the protocol handshake.
    pub async fn initialize(&self, ctx: &ToolContext) -> Result<()> {
        self.call(
            "initialize",
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {},
                "clientInfo": {
                    "name": "datalyst",
                    "version": env!("CARGO_PKG_VERSION")
                }
            }),
            ctx,
        )
        .await?;

        let note = RpcRequest::notification("notifications/initialized");
        self.dispatch(&note, ctx).await?;
        Ok(())
    }

    /// List the tools the remote tool-set advertises.
    pub async fn list_tools(&self, ctx: &ToolContext) -> Result<Vec<ToolDescriptor>> {
        let result = self.call("tools/list", json!({}), ctx).await?;
        let listed: ToolsListResult = serde_json::from_value(result)?;
        Ok(listed.tools)
    }

    /// Invoke a remote tool and return its text content.
    pub async fn call_tool(&self, name: &str, arguments: Value, ctx: &ToolContext) -> Result<String> {
        let result = self
            .call(
                "tools/call",
                json!({"name": name, "arguments": arguments}),
                ctx,
            )
            .await?;

        let call_result: CallToolResult = serde_json::from_value(result)?;
        if call_result.is_error {
            return Err(Error::Toolset(format!(
                "remote tool '{}' failed: {}",
                name,
                call_result.text()
            )));
        }

        Ok(call_result.text())
    }

    /// Handshake, then adapt every advertised tool to the local [`Tool`] trait.
    pub async fn discover(self: &Arc<Self>, ctx: &ToolContext) -> Result<Vec<Arc<dyn Tool>>> {
        self.initialize(ctx).await?;
        let descriptors = self.list_tools(ctx).await?;
        info!(count = descriptors.len(), "Discovered remote tools");

        Ok(descriptors
            .into_iter()
            .map(|descriptor| {
                Arc::new(RemoteTool {
                    client: Arc::clone(self),
                    descriptor,
                }) as Arc<dyn Tool>
            })
            .collect())
    }
}

/// A remote tool-set tool adapted to the local tool interface.
pub struct RemoteTool {
    client: Arc<ToolsetClient>,
    descriptor: ToolDescriptor,
}

#[async_trait::async_trait]
impl Tool for RemoteTool {
    fn name(&self) -> &str {
        &self.descriptor.name
    }

    fn description(&self) -> &str {
        self.descriptor.description.as_deref().unwrap_or("")
    }

    fn parameters(&self) -> Value {
        self.descriptor.input_schema.clone()
    }

    async fn execute(&self, ctx: &ToolContext, params: Value) -> Result<String> {
        self.client.call_tool(&self.descriptor.name, params, ctx).await
    }
}
