//! HTTP transport layer for the remote tool-set.
//!
//! The tool-set client never touches authentication itself. Every request
//! it builds is handed to a [`Transport`], and the [`BearerRelay`]
//! decorator attaches the conversation's OAuth authorization code as a
//! bearer token when one is present in session state.

use async_trait::async_trait;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{Client, Request, Response};
use tracing::trace;

use crate::session::AUTHORIZATION_CODE_KEY;
use crate::tools::ToolContext;
use crate::Result;

/// Transport over which tool-set requests are dispatched.
///
/// The per-call [`ToolContext`] is passed explicitly so decorators can
/// consult conversation state without any ambient lookup.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: Request, ctx: &ToolContext) -> Result<Response>;
}

/// Plain transport over a shared `reqwest` client.
#[derive(Clone, Default)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: Request, _ctx: &ToolContext) -> Result<Response> {
        Ok(self.client.execute(request).await?)
    }
}

/// Decorator that relays the session's authorization code as a bearer token.
///
/// If the context carries a session and a string value is stored under
/// `authorization_code`, the header is set on a clone of the request and
/// the clone is dispatched. On any lookup failure (no session, missing
/// key, non-string value) the request is forwarded unmodified; this layer
/// never raises an error of its own.
pub struct BearerRelay<T: Transport> {
    inner: T,
}

impl<T: Transport> BearerRelay<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }
}

impl Default for BearerRelay<HttpTransport> {
    fn default() -> Self {
        Self::new(HttpTransport::default())
    }
}

impl<T: Transport> BearerRelay<T> {
    fn authorization_code(ctx: &ToolContext) -> Option<String> {
        ctx.session()?.get_str(AUTHORIZATION_CODE_KEY).ok()
    }

    /// Build the request to actually dispatch: a clone with the bearer
    /// header when a code is available, the original otherwise.
    fn prepare(request: Request, ctx: &ToolContext) -> Request {
        let Some(code) = Self::authorization_code(ctx) else {
            return request;
        };

        let Ok(header) = HeaderValue::from_str(&format!("Bearer {}", code)) else {
            trace!("Authorization code is not a valid header value, passing through");
            return request;
        };

        // A streaming body cannot be cloned; forward the original untouched.
        let Some(mut authed) = request.try_clone() else {
            return request;
        };

        authed.headers_mut().insert(AUTHORIZATION, header);
        authed
    }
}

#[async_trait]
impl<T: Transport> Transport for BearerRelay<T> {
    async fn send(&self, request: Request, ctx: &ToolContext) -> Result<Response> {
        let request = Self::prepare(request, ctx);
        self.inner.send(request, ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionState;
    use reqwest::header::HeaderMap;
    use serde_json::json;
    use std::sync::Mutex;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    /// Transport that records what it was asked to send and answers with a
    /// canned 200 response.
    #[derive(Default)]
    struct RecordingTransport {
        seen: Mutex<Vec<HeaderMap>>,
    }

    impl RecordingTransport {
        fn headers(&self) -> Vec<HeaderMap> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn send(&self, request: Request, _ctx: &ToolContext) -> Result<Response> {
            self.seen.lock().unwrap().push(request.headers().clone());
            let response = http::Response::builder().status(200).body("ok").unwrap();
            Ok(Response::from(response))
        }
    }

    fn request() -> Request {
        Client::new()
            .get("http://toolset.invalid/mcp")
            .build()
            .unwrap()
    }

    fn ctx_with_code(code: serde_json::Value) -> ToolContext {
        let session = SessionState::new();
        session.set(AUTHORIZATION_CODE_KEY, code).unwrap();
        ToolContext::new(session, Client::new())
    }

    #[tokio::test]
    async fn test_header_injected_when_code_present() {
        let relay = BearerRelay::new(RecordingTransport::default());
        let ctx = ctx_with_code(json!("abc123"));

        relay.send(request(), &ctx).await.unwrap();

        let seen = relay.inner.headers();
        assert_eq!(
            seen[0].get(AUTHORIZATION).unwrap().to_str().unwrap(),
            "Bearer abc123"
        );
    }

    #[tokio::test]
    async fn test_original_request_not_mutated() {
        let relay = BearerRelay::new(RecordingTransport::default());
        let ctx = ctx_with_code(json!("abc123"));

        let original = request();
        // Snapshot the caller's view of the request before dispatch.
        let callers_copy = original.try_clone().unwrap();

        relay.send(original, &ctx).await.unwrap();

        assert!(callers_copy.headers().get(AUTHORIZATION).is_none());
        // The dispatched request is a different object carrying the header.
        assert!(relay.inner.headers()[0].get(AUTHORIZATION).is_some());
    }

    #[tokio::test]
    async fn test_pass_through_on_missing_key() {
        let relay = BearerRelay::new(RecordingTransport::default());
        let session = SessionState::new();
        let ctx = ToolContext::new(session, Client::new());

        relay.send(request(), &ctx).await.unwrap();

        assert!(relay.inner.headers()[0].get(AUTHORIZATION).is_none());
    }

    #[tokio::test]
    async fn test_pass_through_on_wrong_type() {
        let relay = BearerRelay::new(RecordingTransport::default());
        let ctx = ctx_with_code(json!(42));

        // No error raised and no header added.
        relay.send(request(), &ctx).await.unwrap();

        assert!(relay.inner.headers()[0].get(AUTHORIZATION).is_none());
    }

    #[tokio::test]
    async fn test_pass_through_without_session() {
        let relay = BearerRelay::new(RecordingTransport::default());
        let ctx = ToolContext::detached(Client::new());

        relay.send(request(), &ctx).await.unwrap();

        assert!(relay.inner.headers()[0].get(AUTHORIZATION).is_none());
    }

    #[tokio::test]
    async fn test_default_relay_dispatches_over_http() {
        // One-shot local server standing in for the tool-set endpoint.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 8192];
            let n = socket.read(&mut buf).await.unwrap();
            buf.truncate(n);
            socket
                .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 2\r\nconnection: close\r\n\r\nok")
                .await
                .unwrap();
            String::from_utf8(buf).unwrap()
        });

        let relay = BearerRelay::default();
        let ctx = ctx_with_code(json!("xyz"));
        let request = Client::new()
            .get(format!("http://{}/mcp", addr))
            .build()
            .unwrap();

        let response = relay.send(request, &ctx).await.unwrap();
        assert_eq!(response.status(), 200);

        let raw = server.await.unwrap();
        assert!(raw.to_lowercase().contains("authorization: bearer xyz"));
    }

    #[tokio::test]
    async fn test_prepare_tool_round_trip() {
        use crate::tools::oauth::PrepareAuthCodeTool;
        use crate::tools::Tool;

        let session = SessionState::new();
        let ctx = ToolContext::new(session, Client::new());

        PrepareAuthCodeTool
            .execute(&ctx, json!({"authorization_code": "xyz"}))
            .await
            .unwrap();

        let relay = BearerRelay::new(RecordingTransport::default());
        relay.send(request(), &ctx).await.unwrap();

        assert_eq!(
            relay.inner.headers()[0]
                .get(AUTHORIZATION)
                .unwrap()
                .to_str()
                .unwrap(),
            "Bearer xyz"
        );
    }
}
