//! Agent module — core agent logic.
//!
//! This module contains:
//! - Message types (Message, Response)
//! - LLM client trait and the Gemini implementation
//! - Agent loop for processing messages
//! - Context builder for prompts

mod context;
mod loop_impl;
mod message;

pub mod llm;

// Re-exports for convenience
pub use context::Context;
pub use llm::{GeminiClient, LlmClient, LlmResponse, Usage};
pub use loop_impl::AgentLoop;
pub use message::{Message, Response, Role, ToolCallRequest};
