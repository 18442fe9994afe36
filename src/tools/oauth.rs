//! OAuth handshake tools.
//!
//! Two cooperating tools complete the authorization handshake:
//! `prepare_oauth_auth_code` stores a code in session state, and
//! `user_oauth_data` reads it back and performs an authenticated fetch
//! against the user-info endpoint. Once a code is stored, the bearer
//! relay transport also attaches it to every outgoing tool-set request.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::Error;
use crate::session::AUTHORIZATION_CODE_KEY;
use crate::Result;

use super::{Tool, ToolContext};

/// Arguments accepted by [`PrepareAuthCodeTool`].
#[derive(Debug, Deserialize)]
struct AuthorizationCodeArgs {
    authorization_code: String,
}

/// Stores an OAuth authorization code in the conversation's session state.
pub struct PrepareAuthCodeTool;

#[async_trait]
impl Tool for PrepareAuthCodeTool {
    fn name(&self) -> &str {
        "prepare_oauth_auth_code"
    }

    fn description(&self) -> &str {
        "You need to call this tool before executing oauth2 tools to prepare the authorization code"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "authorization_code": {
                    "type": "string",
                    "description": "OAuth authorization code to store for this conversation"
                }
            },
            "required": ["authorization_code"]
        })
    }

    async fn execute(&self, ctx: &ToolContext, params: Value) -> Result<String> {
        let args: AuthorizationCodeArgs = serde_json::from_value(params)
            .map_err(|e| Error::Tool(format!("Invalid arguments: {}", e)))?;

        let session = ctx
            .session()
            .ok_or_else(|| Error::Tool("No session state for this call".to_string()))?;

        session.set(AUTHORIZATION_CODE_KEY, json!(args.authorization_code))?;

        debug!("Authorization code stored in session state");
        Ok("Success".to_string())
    }
}

/// Fetches OAuth user data using the prepared authorization code.
pub struct UserInfoTool {
    userinfo_url: String,
}

impl UserInfoTool {
    pub fn new(userinfo_url: impl Into<String>) -> Self {
        Self {
            userinfo_url: userinfo_url.into(),
        }
    }
}

#[async_trait]
impl Tool for UserInfoTool {
    fn name(&self) -> &str {
        "user_oauth_data"
    }

    fn description(&self) -> &str {
        "This tool is used to fetch oauth user data. This tool will use prepared authorization code"
    }

    fn parameters(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, ctx: &ToolContext, _params: Value) -> Result<String> {
        let session = ctx
            .session()
            .ok_or_else(|| Error::Tool("No session state for this call".to_string()))?;

        // Absent or non-string codes are explicit failures here, unlike the
        // relay transport which silently passes through.
        let code = session.get_str(AUTHORIZATION_CODE_KEY)?;

        let response = ctx
            .http()
            .get(&self.userinfo_url)
            .header("Authorization", format!("Bearer {}", code))
            .send()
            .await?;

        let body = response.text().await?;
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionState;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn ctx_with_session() -> (ToolContext, SessionState) {
        let session = SessionState::new();
        let ctx = ToolContext::new(session.clone(), reqwest::Client::new());
        (ctx, session)
    }

    /// Serve a single canned HTTP response, returning the raw request bytes.
    async fn one_shot_server(
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<Vec<u8>>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 8192];
            let n = socket.read(&mut buf).await.unwrap();
            buf.truncate(n);
            let response = format!(
                "HTTP/1.1 200 OK\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            buf
        });
        (format!("http://{}", addr), handle)
    }

    #[tokio::test]
    async fn test_prepare_stores_code() {
        let (ctx, session) = ctx_with_session();

        let result = PrepareAuthCodeTool
            .execute(&ctx, serde_json::json!({"authorization_code": "xyz"}))
            .await
            .unwrap();

        assert_eq!(result, "Success");
        assert_eq!(session.get_str(AUTHORIZATION_CODE_KEY).unwrap(), "xyz");
    }

    #[tokio::test]
    async fn test_prepare_rejects_missing_argument() {
        let (ctx, _) = ctx_with_session();

        let result = PrepareAuthCodeTool
            .execute(&ctx, serde_json::json!({}))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_prepare_overwrites_previous_code() {
        let (ctx, session) = ctx_with_session();

        PrepareAuthCodeTool
            .execute(&ctx, serde_json::json!({"authorization_code": "old"}))
            .await
            .unwrap();
        PrepareAuthCodeTool
            .execute(&ctx, serde_json::json!({"authorization_code": "new"}))
            .await
            .unwrap();

        assert_eq!(session.get_str(AUTHORIZATION_CODE_KEY).unwrap(), "new");
    }

    #[tokio::test]
    async fn test_user_info_fails_without_code() {
        let (ctx, _) = ctx_with_session();
        let tool = UserInfoTool::new("http://127.0.0.1:1/userinfo");

        let result = tool.execute(&ctx, serde_json::json!({})).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_user_info_fails_on_non_string_code() {
        let (ctx, session) = ctx_with_session();
        session.set(AUTHORIZATION_CODE_KEY, json!(123)).unwrap();
        let tool = UserInfoTool::new("http://127.0.0.1:1/userinfo");

        let result = tool.execute(&ctx, serde_json::json!({})).await;
        assert!(matches!(result, Err(Error::State(_))));
    }

    #[tokio::test]
    async fn test_user_info_sends_bearer_header() {
        let (ctx, session) = ctx_with_session();
        session
            .set(AUTHORIZATION_CODE_KEY, json!("abc123"))
            .unwrap();

        let (url, handle) = one_shot_server("{\"email\":\"a@b.c\"}").await;
        let tool = UserInfoTool::new(format!("{}/userinfo", url));

        let body = tool.execute(&ctx, serde_json::json!({})).await.unwrap();
        assert!(body.contains("a@b.c"));

        let request = String::from_utf8(handle.await.unwrap()).unwrap();
        assert!(request.to_lowercase().contains("authorization: bearer abc123"));
    }
}
