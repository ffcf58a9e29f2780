use axum::http::StatusCode;
use chrono::{DateTime, Utc};

/// How a chat request was answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatPath {
    LocalOk,
    LocalHelp,
    Rewrite,
    Passthrough,
}

impl ChatPath {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatPath::LocalOk => "local_ok",
            ChatPath::LocalHelp => "local_help",
            ChatPath::Rewrite => "rewrite",
            ChatPath::Passthrough => "passthrough",
        }
    }
}

// 记录聊天请求日志（包含响应耗时）
pub fn log_chat_request(
    start_time: DateTime<Utc>,
    path: ChatPath,
    model: Option<&str>,
    stream: bool,
    status: StatusCode,
) {
    let response_time_ms = (Utc::now() - start_time).num_milliseconds();

    if status.is_success() {
        tracing::info!(
            path = path.as_str(),
            model = model.unwrap_or("-"),
            stream,
            status = status.as_u16(),
            response_time_ms,
            "chat completion"
        );
    } else {
        tracing::warn!(
            path = path.as_str(),
            model = model.unwrap_or("-"),
            stream,
            status = status.as_u16(),
            response_time_ms,
            "chat completion failed"
        );
    }
}
