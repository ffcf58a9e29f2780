use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::server::AppState;

mod chat;
mod meta;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(meta::health))
        // Some clients validate the base URL with POST /v1
        .route(
            "/v1",
            get(meta::service_descriptor).post(chat::chat_completions),
        )
        .route(
            "/v1/",
            get(meta::service_descriptor).post(chat::chat_completions),
        )
        .route("/v1/chat/completions", post(chat::chat_completions))
        .route("/v1/models", get(meta::list_models))
        .route("/models", get(meta::list_models))
        .fallback(meta::not_found)
        .method_not_allowed_fallback(meta::not_found)
}
