use axum::body::Bytes;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// Longest slice of a non-JSON upstream error body echoed back to the caller.
const UPSTREAM_BODY_PREVIEW_CHARS: usize = 1000;

#[derive(Debug, Error)]
pub enum ShimError {
    #[error("not found")]
    NotFound,

    #[error("unsupported endpoint")]
    UnsupportedEndpoint,

    #[error("invalid API key")]
    Unauthorized,

    #[error("OPENCLAW_GATEWAY_TOKEN is not set")]
    MissingGatewayToken,

    #[error("upstream returned HTTP {status}")]
    UpstreamHttp { status: StatusCode, body: Bytes },

    #[error("upstream connection failed: {0}")]
    UpstreamConnection(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, ShimError>;

/// Value of `error.type` in the JSON envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidRequestError,
    AuthenticationError,
    ServerError,
    UpstreamHttpError,
    UpstreamConnectionError,
}

#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(rename = "type")]
    pub kind: ErrorKind,
}

impl ErrorEnvelope {
    pub fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            error: ErrorBody {
                message: message.into(),
                kind,
            },
        }
    }
}

impl ShimError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ShimError::NotFound | ShimError::UnsupportedEndpoint => StatusCode::NOT_FOUND,
            ShimError::Unauthorized => StatusCode::UNAUTHORIZED,
            ShimError::UpstreamHttp { status, .. } => *status,
            ShimError::UpstreamConnection(_) => StatusCode::BAD_GATEWAY,
            ShimError::MissingGatewayToken
            | ShimError::Json(_)
            | ShimError::Config(_)
            | ShimError::Io(_)
            | ShimError::Toml(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ShimError::NotFound | ShimError::UnsupportedEndpoint => ErrorKind::InvalidRequestError,
            ShimError::Unauthorized => ErrorKind::AuthenticationError,
            ShimError::UpstreamHttp { .. } => ErrorKind::UpstreamHttpError,
            ShimError::UpstreamConnection(_) => ErrorKind::UpstreamConnectionError,
            ShimError::MissingGatewayToken
            | ShimError::Json(_)
            | ShimError::Config(_)
            | ShimError::Io(_)
            | ShimError::Toml(_) => ErrorKind::ServerError,
        }
    }
}

fn envelope_response(status: StatusCode, envelope: &ErrorEnvelope) -> Response {
    let body = serde_json::to_vec(envelope).unwrap_or_else(|_| b"{}".to_vec());
    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}

impl IntoResponse for ShimError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match self {
            // JSON error bodies from the gateway are passed through untouched.
            ShimError::UpstreamHttp { body, .. } => {
                if serde_json::from_slice::<serde_json::Value>(&body).is_ok() {
                    return (status, [(header::CONTENT_TYPE, "application/json")], body)
                        .into_response();
                }
                let text = String::from_utf8_lossy(&body);
                let preview: String = text.chars().take(UPSTREAM_BODY_PREVIEW_CHARS).collect();
                envelope_response(
                    status,
                    &ErrorEnvelope::new(preview, ErrorKind::UpstreamHttpError),
                )
            }
            other => {
                let kind = other.kind();
                envelope_response(status, &ErrorEnvelope::new(other.to_string(), kind))
            }
        }
    }
}
