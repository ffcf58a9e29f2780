use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use std::sync::Arc;

use crate::error::ShimError;
use crate::server::chat_request::{ParsedBody, parse_body};
use crate::server::request_logging::{ChatPath, log_chat_request};
use crate::server::resolver::{Resolution, resolve};
use crate::server::synth::{ACK_TEXT, LocalAnswer};
use crate::server::util::is_authorized;
use crate::server::AppState;

pub async fn chat_completions(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if !is_authorized(&headers, &app_state.config.server.static_api_key) {
        tracing::warn!("Rejected chat request with invalid API key");
        return ShimError::Unauthorized.into_response();
    }

    let start_time = Utc::now();
    let default_model = app_state.config.models.default_model.as_str();

    let (path, model, stream, response) = match parse_body(&body) {
        // Connection checks send no messages; acknowledge without bothering the gateway.
        ParsedBody::Degenerate { model, stream } => {
            let model = model.unwrap_or_else(|| default_model.to_string());
            let response = LocalAnswer::new(model.clone(), ACK_TEXT).respond(stream);
            (ChatPath::LocalOk, Some(model), stream, response)
        }
        ParsedBody::Opaque { stream } => {
            let response = forward(&app_state, body, stream).await;
            (ChatPath::Passthrough, None, stream, response)
        }
        ParsedBody::Chat(request) => {
            let stream = request.wants_stream();
            match resolve(
                &request,
                &app_state.keywords,
                app_state.config.models.keywords_enabled,
            ) {
                Resolution::Help => {
                    let model = request
                        .model
                        .clone()
                        .filter(|m| !m.is_empty())
                        .unwrap_or_else(|| default_model.to_string());
                    let response =
                        LocalAnswer::new(model.clone(), app_state.keywords.help_text())
                            .respond(stream);
                    (ChatPath::LocalHelp, Some(model), stream, response)
                }
                Resolution::Rewrite {
                    request: rewritten,
                    keyword,
                    model,
                } => {
                    tracing::info!(keyword = %keyword, model, "Keyword command routed");
                    let response = match serde_json::to_vec(&rewritten) {
                        Ok(encoded) => forward(&app_state, Bytes::from(encoded), stream).await,
                        Err(e) => ShimError::Json(e).into_response(),
                    };
                    (ChatPath::Rewrite, Some(model.to_string()), stream, response)
                }
                // The inbound bytes go upstream untouched, not a re-serialization.
                Resolution::Passthrough => {
                    let response = forward(&app_state, body, stream).await;
                    (ChatPath::Passthrough, request.model, stream, response)
                }
            }
        }
    };

    log_chat_request(start_time, path, model.as_deref(), stream, response.status());
    response
}

async fn forward(app_state: &AppState, body: Bytes, stream: bool) -> Response {
    app_state
        .relay
        .forward(body, stream)
        .await
        .unwrap_or_else(IntoResponse::into_response)
}
