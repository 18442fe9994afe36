//! Per-conversation session state.
//!
//! Every conversation owns a small key/value store that tools and the
//! tool-set transport can read. The store is passed explicitly into each
//! tool and transport call — there is no ambient/global context.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use serde_json::Value;
use thiserror::Error;

use crate::agent::Message;
use crate::Result;

/// State key under which the OAuth authorization code is stored.
pub const AUTHORIZATION_CODE_KEY: &str = "authorization_code";

/// Errors from typed state lookups.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("state key '{0}' not found")]
    Missing(String),

    #[error("state key '{0}' holds a {1}, expected a string")]
    WrongType(String, &'static str),
}

/// Conversation-scoped key/value store.
///
/// Cheap to clone; all clones share the same underlying map.
#[derive(Clone, Default)]
pub struct SessionState {
    values: Arc<RwLock<HashMap<String, Value>>>,
}

impl SessionState {
    /// Create an empty session state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a value by key.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.values.read().ok()?.get(key).cloned()
    }

    /// Get a string value by key.
    ///
    /// Distinguishes "absent" from "present but not a string" so callers
    /// can report the failure precisely.
    pub fn get_str(&self, key: &str) -> std::result::Result<String, StateError> {
        let value = self
            .get(key)
            .ok_or_else(|| StateError::Missing(key.to_string()))?;

        match value {
            Value::String(s) => Ok(s),
            other => Err(StateError::WrongType(key.to_string(), json_type_name(&other))),
        }
    }

    /// Set a value, overwriting any previous one.
    pub fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut values = self
            .values
            .write()
            .map_err(|_| crate::error::Error::Other("session state lock poisoned".to_string()))?;
        values.insert(key.to_string(), value);
        Ok(())
    }

    /// Check whether a key is present.
    pub fn contains(&self, key: &str) -> bool {
        self.values
            .read()
            .map(|v| v.contains_key(key))
            .unwrap_or(false)
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A single conversation: its state store plus message history.
#[derive(Clone, Default)]
pub struct Session {
    pub state: SessionState,
    pub history: Arc<Mutex<Vec<Message>>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the conversation history.
    pub fn history(&self) -> Vec<Message> {
        self.history.lock().map(|h| h.clone()).unwrap_or_default()
    }

    /// Append a user/assistant exchange to the history.
    pub fn record_exchange(&self, user: Message, assistant: Message) {
        if let Ok(mut history) = self.history.lock() {
            history.push(user);
            history.push(assistant);
        }
    }
}

/// Registry of sessions keyed by session id.
///
/// The web launcher uses one entry per conversation; the CLI uses a single
/// entry for its whole run.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the session for an id, creating it on first use.
    pub fn get_or_create(&self, id: &str) -> Session {
        if let Ok(sessions) = self.sessions.read() {
            if let Some(session) = sessions.get(id) {
                return session.clone();
            }
        }

        let session = Session::new();
        if let Ok(mut sessions) = self.sessions.write() {
            // Another caller may have raced us; keep the first entry.
            return sessions
                .entry(id.to_string())
                .or_insert_with(|| session.clone())
                .clone();
        }
        session
    }

    /// Number of live sessions.
    pub fn count(&self) -> usize {
        self.sessions.read().map(|s| s.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_and_get_str() {
        let state = SessionState::new();
        state.set(AUTHORIZATION_CODE_KEY, json!("abc123")).unwrap();

        assert_eq!(state.get_str(AUTHORIZATION_CODE_KEY).unwrap(), "abc123");
    }

    #[test]
    fn test_get_str_missing() {
        let state = SessionState::new();
        let err = state.get_str(AUTHORIZATION_CODE_KEY).unwrap_err();
        assert!(matches!(err, StateError::Missing(_)));
    }

    #[test]
    fn test_get_str_wrong_type() {
        let state = SessionState::new();
        state.set(AUTHORIZATION_CODE_KEY, json!(42)).unwrap();

        let err = state.get_str(AUTHORIZATION_CODE_KEY).unwrap_err();
        assert_eq!(
            err,
            StateError::WrongType(AUTHORIZATION_CODE_KEY.to_string(), "number")
        );
    }

    #[test]
    fn test_set_overwrites() {
        let state = SessionState::new();
        state.set(AUTHORIZATION_CODE_KEY, json!("first")).unwrap();
        state.set(AUTHORIZATION_CODE_KEY, json!("second")).unwrap();

        assert_eq!(state.get_str(AUTHORIZATION_CODE_KEY).unwrap(), "second");
    }

    #[test]
    fn test_clones_share_storage() {
        let state = SessionState::new();
        let clone = state.clone();
        clone.set("k", json!("v")).unwrap();

        assert_eq!(state.get_str("k").unwrap(), "v");
    }

    #[test]
    fn test_store_get_or_create_reuses_session() {
        let store = SessionStore::new();
        let a = store.get_or_create("web:1");
        a.state.set("k", json!("v")).unwrap();

        let b = store.get_or_create("web:1");
        assert_eq!(b.state.get_str("k").unwrap(), "v");
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn test_store_isolates_sessions() {
        let store = SessionStore::new();
        store
            .get_or_create("web:1")
            .state
            .set("k", json!("v"))
            .unwrap();

        let other = store.get_or_create("web:2");
        assert!(other.state.get("k").is_none());
        assert_eq!(store.count(), 2);
    }
}
