//! Context for agent interactions.
//!
//! Holds everything one conversation turn needs: the tool registry, the
//! conversation's session state, and a shared HTTP client. History
//! windowing keeps the prompt from growing without bound.

use std::sync::Arc;

use reqwest::Client;

use crate::config::Config;
use crate::session::SessionState;
use crate::tools::{ToolContext, ToolRunner};

use super::message::Message;

/// Maximum history messages to include in prompt (prevents unbounded growth).
const MAX_HISTORY_MESSAGES: usize = 40;

/// Context holds all state for an agent interaction.
pub struct Context {
    pub tool_runner: Arc<ToolRunner>,
    pub session: SessionState,
    pub config: Config,
    http: Client,
}

impl Context {
    /// Create a new context bound to one conversation.
    pub fn new(
        config: &Config,
        tool_runner: Arc<ToolRunner>,
        session: SessionState,
        http: Client,
    ) -> Self {
        Self {
            tool_runner,
            session,
            config: config.clone(),
            http,
        }
    }

    /// Create a test context with an empty tool registry.
    #[cfg(test)]
    pub fn test() -> Self {
        Self {
            tool_runner: Arc::new(ToolRunner::new()),
            session: SessionState::new(),
            config: Config::default(),
            http: Client::new(),
        }
    }

    /// Per-call context handed to tools and the tool-set transport.
    pub fn tool_context(&self) -> ToolContext {
        ToolContext::new(self.session.clone(), self.http.clone())
    }

    /// Build the system prompt.
    pub fn build_system_prompt(&self) -> String {
        let now = chrono::Local::now().format("%Y-%m-%d %H:%M (%A)");

        format!(
            r#"# Datalyst

You are a data analyst assistant. You answer questions by querying the
connected datastore tools and summarizing what you find.

## Current Time
{}

## OAuth Tools
Some tools require an OAuth authorization code:
- `prepare_oauth_auth_code` — call this first, with the code the user provides
- `user_oauth_data` — fetches the user's profile with the prepared code

Once a code is prepared, datastore tools are authenticated automatically.

Always be accurate and concise. Prefer running a tool over guessing."#,
            now
        )
    }

    /// Build messages list for LLM call with history windowing.
    pub fn build_messages(&self, history: &[Message], current: &str) -> Vec<Message> {
        let windowed_history = if history.len() > MAX_HISTORY_MESSAGES {
            &history[history.len() - MAX_HISTORY_MESSAGES..]
        } else {
            history
        };

        let mut messages = Vec::with_capacity(windowed_history.len() + 2);
        messages.push(Message::system(self.build_system_prompt()));
        messages.extend(windowed_history.iter().cloned());
        messages.push(Message::user(current));

        messages
    }
}
