//! Web launcher — serves the chat UI and API.
//!
//! Route registration is explicit composition: custom routes are added
//! first, then the built-in surface is merged in. There is no launcher
//! inheritance; extending the surface means another `.route()` call in
//! [`register_custom_routes`].

mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use reqwest::Client;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::agent::{AgentLoop, Context};
use crate::config::Config;
use crate::session::{Session, SessionStore};
use crate::tools::ToolRunner;
use crate::Result;

pub use routes::{ChatRequest, ChatResponse};

/// Shared state for all HTTP handlers.
pub struct AppState {
    pub agent: AgentLoop,
    pub config: Config,
    pub tool_runner: Arc<ToolRunner>,
    pub sessions: SessionStore,
    pub http: Client,
}

impl AppState {
    pub fn new(agent: AgentLoop, config: Config, tool_runner: Arc<ToolRunner>) -> Self {
        Self {
            agent,
            config,
            tool_runner,
            sessions: SessionStore::new(),
            http: Client::new(),
        }
    }

    /// Build an agent context bound to one session.
    pub fn context_for(&self, session: &Session) -> Context {
        Context::new(
            &self.config,
            self.tool_runner.clone(),
            session.state.clone(),
            self.http.clone(),
        )
    }
}

/// The web launcher.
pub struct Launcher {
    state: Arc<AppState>,
    port: u16,
}

impl Launcher {
    pub fn new(state: AppState) -> Self {
        let port = state.config.server.port;
        Self {
            state: Arc::new(state),
            port,
        }
    }

    /// Serve until the process is stopped.
    pub async fn run(&self) -> Result<()> {
        let addr = SocketAddr::from(([127, 0, 0, 1], self.port));
        let app = routes(self.state.clone());

        info!("Web launcher listening on http://{}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app)
            .await
            .map_err(|e| crate::error::Error::Other(e.to_string()))?;

        Ok(())
    }
}

/// Build the full router: custom routes first, then the built-in surface.
pub fn routes(state: Arc<AppState>) -> Router {
    register_custom_routes(Router::new())
        .merge(builtin_routes())
        .layer(cors_layer())
        .with_state(state)
}

/// Extra routes layered on top of the built-in surface.
fn register_custom_routes(router: Router<Arc<AppState>>) -> Router<Arc<AppState>> {
    router.route("/hello", get(routes::hello_handler))
}

/// The built-in WebUI/API surface.
fn builtin_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(routes::index_handler))
        .route("/health", get(routes::health_handler))
        .route("/api/chat", post(routes::chat_handler))
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::llm::FakeLlmClient;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_state() -> Arc<AppState> {
        let client = Arc::new(FakeLlmClient::new(vec!["Forty-two."]));
        let agent = AgentLoop::new(client, 5);
        Arc::new(AppState::new(
            agent,
            Config::default(),
            Arc::new(ToolRunner::new()),
        ))
    }

    #[tokio::test]
    async fn test_hello_route() {
        let app = routes(test_state());

        let response = app
            .oneshot(Request::get("/hello").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"Hello from the new path!");
    }

    #[tokio::test]
    async fn test_health_route() {
        let app = routes(test_state());

        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn test_index_serves_chat_page() {
        let app = routes(test_state());

        let response = app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert!(std::str::from_utf8(&body).unwrap().contains("Datalyst"));
    }

    #[tokio::test]
    async fn test_chat_creates_session_and_replies() {
        let state = test_state();
        let app = routes(state.clone());

        let request = Request::post("/api/chat")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"message": "What is the answer?"}"#))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["reply"], "Forty-two.");
        assert!(json["session_id"].as_str().unwrap().starts_with("web:"));
        assert_eq!(state.sessions.count(), 1);
    }

    #[tokio::test]
    async fn test_chat_error_surfaces_as_500() {
        // Fake model with no responses left: the agent run fails.
        let client = Arc::new(FakeLlmClient::new(vec![]));
        let agent = AgentLoop::new(client, 5);
        let state = Arc::new(AppState::new(
            agent,
            Config::default(),
            Arc::new(ToolRunner::new()),
        ));
        let app = routes(state);

        let request = Request::post("/api/chat")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"message": "hi"}"#))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
