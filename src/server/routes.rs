//! HTTP route handlers for the web launcher.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::agent::Message;

use super::AppState;

/// Request body for `POST /api/chat`.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Conversation to continue; a fresh one is created when omitted.
    pub session_id: Option<String>,
    pub message: String,
}

/// Response body for `POST /api/chat`.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub session_id: String,
    pub reply: String,
}

/// The extra route registered ahead of the built-in surface.
pub async fn hello_handler() -> &'static str {
    "Hello from the new path!"
}

/// Health check handler.
pub async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "sessions": state.sessions.count(),
    }))
}

/// Chat API handler — runs one agent turn for the session.
pub async fn chat_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, (StatusCode, Json<serde_json::Value>)> {
    let session_id = request
        .session_id
        .unwrap_or_else(|| format!("web:{}", uuid::Uuid::new_v4()));

    let session = state.sessions.get_or_create(&session_id);
    let history = session.history();

    info!(%session_id, "Handling chat request");

    let ctx = state.context_for(&session);
    let user_message = Message::user(&request.message);

    let response = state
        .agent
        .run(&history, user_message.clone(), &ctx)
        .await
        .map_err(|e| {
            error!(%session_id, "Agent run failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": e.to_string()})),
            )
        })?;

    session.record_exchange(user_message, Message::assistant(response.content.clone()));

    Ok(Json(ChatResponse {
        session_id,
        reply: response.content,
    }))
}

/// Minimal embedded chat page.
pub async fn index_handler() -> Html<&'static str> {
    Html(CHAT_PAGE)
}

const CHAT_PAGE: &str = r#"<!doctype html>
<html>
<head>
<meta charset="utf-8">
<title>Datalyst</title>
<style>
  body { font-family: sans-serif; max-width: 720px; margin: 2rem auto; }
  #log { border: 1px solid #ccc; padding: 1rem; min-height: 280px; white-space: pre-wrap; }
  #form { display: flex; gap: .5rem; margin-top: 1rem; }
  #input { flex: 1; padding: .5rem; }
</style>
</head>
<body>
<h1>Datalyst</h1>
<div id="log"></div>
<form id="form">
  <input id="input" autocomplete="off" placeholder="Ask the data analyst...">
  <button>Send</button>
</form>
<script>
let sessionId = null;
const log = document.getElementById('log');
document.getElementById('form').addEventListener('submit', async (e) => {
  e.preventDefault();
  const input = document.getElementById('input');
  const message = input.value.trim();
  if (!message) return;
  input.value = '';
  log.textContent += 'You: ' + message + '\n';
  const res = await fetch('/api/chat', {
    method: 'POST',
    headers: {'content-type': 'application/json'},
    body: JSON.stringify({session_id: sessionId, message}),
  });
  const data = await res.json();
  if (res.ok) {
    sessionId = data.session_id;
    log.textContent += 'Bot: ' + data.reply + '\n\n';
  } else {
    log.textContent += 'Error: ' + (data.error || res.status) + '\n\n';
  }
});
</script>
</body>
</html>
"#;
