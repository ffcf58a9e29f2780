use axum::body::{Body, Bytes};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::Response;

use crate::config::GatewayConfig;
use crate::error::{Result, ShimError};
use crate::http_client::gateway_client;
use crate::server::streaming::{self, EVENT_STREAM};
use crate::server::util::mask_key;

/// One-shot forwarder to the gateway's chat completions endpoint.
#[derive(Debug, Clone)]
pub struct UpstreamRelay {
    client: reqwest::Client,
    gateway: GatewayConfig,
}

impl UpstreamRelay {
    pub fn new(gateway: GatewayConfig) -> Result<Self> {
        let client = gateway_client(&gateway)
            .map_err(|e| ShimError::Config(format!("failed to build gateway client: {}", e)))?;
        Ok(Self { client, gateway })
    }

    pub fn gateway(&self) -> &GatewayConfig {
        &self.gateway
    }

    /// POSTs `body` upstream and turns the reply into the caller's response.
    ///
    /// Event-stream replies, and any reply to a caller that asked for streaming, are
    /// relayed chunk by chunk and always end with exactly one `data: [DONE]`. Everything
    /// else is buffered and written back with an exact `Content-Length`.
    pub async fn forward(&self, body: Bytes, wants_stream: bool) -> Result<Response> {
        if !self.gateway.has_token() {
            return Err(ShimError::MissingGatewayToken);
        }

        let url = self.gateway.chat_completions_url();
        tracing::debug!(
            "Forwarding {} bytes to {} (token {})",
            body.len(),
            url,
            mask_key(&self.gateway.token)
        );

        let upstream = self
            .client
            .post(&url)
            .header(header::CONTENT_TYPE, "application/json")
            .bearer_auth(&self.gateway.token)
            .body(body)
            .send()
            .await?;

        let status = upstream.status();
        if !status.is_success() {
            let body = upstream.bytes().await.unwrap_or_else(|e| {
                tracing::warn!("Failed to read upstream error body: {}", e);
                Bytes::new()
            });
            return Err(ShimError::UpstreamHttp { status, body });
        }

        let content_type = upstream
            .headers()
            .get(header::CONTENT_TYPE)
            .cloned()
            .unwrap_or_else(|| HeaderValue::from_static("application/json"));

        if wants_stream || is_event_stream(&content_type) {
            let relayed = streaming::relay_stream(upstream.bytes_stream());
            return Ok(streaming::event_stream_response(
                status,
                content_type,
                Body::from_stream(relayed),
            ));
        }

        let data = upstream.bytes().await?;
        Ok(buffered_response(status, content_type, data))
    }
}

fn is_event_stream(content_type: &HeaderValue) -> bool {
    content_type
        .to_str()
        .map(|ct| ct.trim_start().to_ascii_lowercase().starts_with(EVENT_STREAM))
        .unwrap_or(false)
}

fn buffered_response(status: StatusCode, content_type: HeaderValue, data: Bytes) -> Response {
    let len = HeaderValue::from(data.len());
    let mut resp = Response::new(Body::from(data));
    *resp.status_mut() = status;
    resp.headers_mut().insert(header::CONTENT_TYPE, content_type);
    resp.headers_mut().insert(header::CONTENT_LENGTH, len);
    resp
}
