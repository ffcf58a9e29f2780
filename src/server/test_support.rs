//! In-process stand-in for the OpenClaw gateway.

use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::post;

use crate::config::{GatewayConfig, Settings};

#[derive(Debug, Clone)]
pub struct Recorded {
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: Bytes,
}

/// Canned reply: status, content type, body.
#[derive(Debug, Clone)]
pub struct Canned {
    pub status: StatusCode,
    pub content_type: &'static str,
    pub body: &'static str,
    pub delay: Option<std::time::Duration>,
}

impl Canned {
    pub fn json(body: &'static str) -> Self {
        Self {
            status: StatusCode::OK,
            content_type: "application/json",
            body,
            delay: None,
        }
    }

    pub fn sse(body: &'static str) -> Self {
        Self {
            status: StatusCode::OK,
            content_type: "text/event-stream",
            body,
            delay: None,
        }
    }

    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn content_type(mut self, content_type: &'static str) -> Self {
        self.content_type = content_type;
        self
    }
}

#[derive(Clone)]
struct MockState {
    canned: Canned,
    seen: Arc<Mutex<Vec<Recorded>>>,
}

pub struct MockGateway {
    pub base_url: String,
    seen: Arc<Mutex<Vec<Recorded>>>,
}

impl MockGateway {
    pub async fn start(canned: Canned) -> Self {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let state = MockState {
            canned,
            seen: seen.clone(),
        };
        let app = Router::new()
            .route("/v1/chat/completions", post(mock_chat))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            seen,
        }
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.seen.lock().unwrap().clone()
    }

    pub fn gateway_config(&self, token: &str) -> GatewayConfig {
        GatewayConfig {
            base_url: self.base_url.clone(),
            token: token.to_string(),
            timeout_secs: 5,
        }
    }

    pub fn settings(&self, token: &str) -> Settings {
        Settings {
            gateway: self.gateway_config(token),
            ..Settings::default()
        }
    }
}

async fn mock_chat(State(state): State<MockState>, headers: HeaderMap, body: Bytes) -> Response {
    let header_str = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    state.seen.lock().unwrap().push(Recorded {
        authorization: header_str(header::AUTHORIZATION),
        content_type: header_str(header::CONTENT_TYPE),
        body,
    });

    if let Some(delay) = state.canned.delay {
        tokio::time::sleep(delay).await;
    }
    (
        state.canned.status,
        [(header::CONTENT_TYPE, state.canned.content_type)],
        state.canned.body,
    )
        .into_response()
}

/// Address nothing listens on.
pub async fn closed_port_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}
