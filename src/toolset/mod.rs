//! Remote tool-set integration.
//!
//! A tool-set is a collection of tools served behind one streaming HTTP
//! JSON-RPC endpoint. This module provides:
//! - the [`Transport`] trait and the [`BearerRelay`] decorator that
//!   attaches the conversation's authorization code to outgoing requests
//! - the [`ToolsetClient`] that discovers and invokes remote tools

mod client;
mod protocol;
mod transport;

pub use client::{RemoteTool, ToolsetClient};
pub use protocol::{CallToolResult, RpcRequest, RpcResponse, ToolDescriptor};
pub use transport::{BearerRelay, HttpTransport, Transport};
