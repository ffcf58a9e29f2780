use std::convert::Infallible;

use axum::body::{Body, Bytes};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::server::streaming::{self, EVENT_STREAM};

/// Text returned when a client probes the endpoint with an empty or invalid payload.
pub const ACK_TEXT: &str = "OK";

const FINISH_STOP: &str = "stop";

#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletion {
    pub id: String,
    pub object: &'static str,
    pub created: i64,
    pub model: String,
    pub choices: Vec<Choice>,
    pub usage: Usage,
}

#[derive(Debug, Clone, Serialize)]
pub struct Choice {
    pub index: u32,
    pub message: AssistantMessage,
    pub finish_reason: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssistantMessage {
    pub role: &'static str,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionChunk {
    pub id: String,
    pub object: &'static str,
    pub created: i64,
    pub model: String,
    pub choices: Vec<ChunkChoice>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChunkChoice {
    pub index: u32,
    pub delta: Delta,
    pub finish_reason: Option<&'static str>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Delta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// A locally produced assistant answer, renderable as JSON or as an event stream.
#[derive(Debug, Clone)]
pub struct LocalAnswer {
    id: String,
    created: i64,
    model: String,
    text: String,
}

impl LocalAnswer {
    pub fn new(model: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: format!("chatcmpl_proxy_{}", Uuid::new_v4()),
            created: Utc::now().timestamp(),
            model: model.into(),
            text: text.into(),
        }
    }

    pub fn completion(&self) -> ChatCompletion {
        ChatCompletion {
            id: self.id.clone(),
            object: "chat.completion",
            created: self.created,
            model: self.model.clone(),
            choices: vec![Choice {
                index: 0,
                message: AssistantMessage {
                    role: "assistant",
                    content: self.text.clone(),
                },
                finish_reason: FINISH_STOP,
            }],
            usage: Usage {
                prompt_tokens: 1,
                completion_tokens: 1,
                total_tokens: 2,
            },
        }
    }

    /// Full text in one delta, then an empty delta carrying the finish reason.
    pub fn chunks(&self) -> [ChatCompletionChunk; 2] {
        let chunk = |delta: Delta, finish_reason: Option<&'static str>| ChatCompletionChunk {
            id: self.id.clone(),
            object: "chat.completion.chunk",
            created: self.created,
            model: self.model.clone(),
            choices: vec![ChunkChoice {
                index: 0,
                delta,
                finish_reason,
            }],
        };

        [
            chunk(
                Delta {
                    role: Some("assistant"),
                    content: Some(self.text.clone()),
                },
                None,
            ),
            chunk(Delta::default(), Some(FINISH_STOP)),
        ]
    }

    /// Wire frames of the streamed form, termination marker included.
    pub fn frames(&self) -> Vec<Bytes> {
        let mut frames: Vec<Bytes> = self
            .chunks()
            .iter()
            .filter_map(|c| serde_json::to_string(c).ok())
            .map(|json| streaming::data_frame(&json))
            .collect();
        frames.push(streaming::done_frame());
        frames
    }

    pub fn respond(self, stream: bool) -> Response {
        if !stream {
            return (StatusCode::OK, Json(self.completion())).into_response();
        }

        let frames = tokio_stream::iter(self.frames().into_iter().map(Ok::<_, Infallible>));
        streaming::event_stream_response(
            StatusCode::OK,
            HeaderValue::from_static(EVENT_STREAM),
            Body::from_stream(frames),
        )
    }
}
