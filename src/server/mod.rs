pub mod chat_request;
pub mod handlers;
pub mod inspector;
pub mod keywords;
pub mod relay;
pub(crate) mod request_logging;
pub mod resolver;
pub mod streaming;
pub mod synth;
pub mod util;

#[cfg(test)]
pub(crate) mod test_support;

use axum::Router;
use axum::extract::Request;
use axum::http::{Method, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::Response;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Settings;
use crate::error::Result as AppResult;
use crate::server::keywords::KeywordTable;
use crate::server::relay::UpstreamRelay;
use crate::server::util::mask_key;

/// Read-only state shared by every request.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Settings,
    pub keywords: KeywordTable,
    pub relay: UpstreamRelay,
}

impl AppState {
    pub fn new(config: Settings) -> AppResult<Self> {
        let relay = UpstreamRelay::new(config.gateway.clone())?;
        Ok(Self {
            config,
            keywords: KeywordTable::builtin(),
            relay,
        })
    }
}

pub fn create_app(config: Settings) -> AppResult<Router> {
    tracing::info!("Upstream gateway: {}", config.gateway.base_url);
    if config.gateway.has_token() {
        tracing::info!("Gateway token: {}", mask_key(&config.gateway.token));
    } else {
        tracing::warn!("OPENCLAW_GATEWAY_TOKEN is not set; chat requests will fail with 500");
    }
    if !config.server.static_api_key.is_empty() {
        tracing::info!("Static API key required for chat requests");
    }
    if !config.models.keywords_enabled {
        tracing::info!("Keyword commands disabled");
    }

    let app_state = AppState::new(config)?;
    let mut app = handlers::routes().with_state(Arc::new(app_state));

    // Chat clients run in the browser; any origin may call the shim.
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_origin(Any);
    app = app
        .layer(cors)
        .layer(middleware::from_fn(preflight_no_content))
        .layer(TraceLayer::new_for_http());

    Ok(app)
}

// CorsLayer answers every OPTIONS request itself with 200; clients expect 204.
async fn preflight_no_content(req: Request, next: Next) -> Response {
    let is_options = req.method() == Method::OPTIONS;
    let mut resp = next.run(req).await;
    if is_options && resp.status() == StatusCode::OK {
        *resp.status_mut() = StatusCode::NO_CONTENT;
    }
    resp
}
