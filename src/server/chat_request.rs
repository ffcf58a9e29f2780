use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Chat completion request as received from the client.
///
/// Notes:
/// - Only `model`, `messages` and `stream` are interpreted by the shim.
/// - Every other field lands in `extra` and is re-serialized unchanged, so options the
///   shim does not know about (`temperature`, `tools`, vendor extensions) still reach
///   the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub messages: Vec<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    /// `content` and anything else the message carries, in arrival order.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Message {
    /// Plain-text content; `None` for multimodal arrays, null, or a missing field.
    pub fn text(&self) -> Option<&str> {
        self.fields.get("content").and_then(Value::as_str)
    }

    pub fn with_text(&self, text: impl Into<String>) -> Self {
        let mut fields = self.fields.clone();
        fields.insert("content".to_string(), Value::String(text.into()));
        Self {
            role: self.role.clone(),
            fields,
        }
    }
}

impl ChatRequest {
    pub fn wants_stream(&self) -> bool {
        self.stream.unwrap_or(false)
    }
}

/// What the handler could make of a raw request body.
#[derive(Debug)]
pub enum ParsedBody {
    /// `messages` missing, not an array, or empty.
    Degenerate {
        model: Option<String>,
        stream: bool,
    },
    /// Non-empty message list that maps onto [`ChatRequest`].
    Chat(ChatRequest),
    /// Non-empty message list the shim cannot interpret; forwarded as-is.
    Opaque { stream: bool },
}

/// Parses a request body, treating malformed JSON as an empty object.
pub fn parse_body(raw: &[u8]) -> ParsedBody {
    let value: Value = if raw.iter().all(u8::is_ascii_whitespace) {
        Value::Object(Map::new())
    } else {
        serde_json::from_slice(raw).unwrap_or_else(|e| {
            tracing::debug!("Treating malformed request body as empty object: {}", e);
            Value::Object(Map::new())
        })
    };

    let model = value
        .get("model")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .map(str::to_string);
    let stream = value.get("stream").is_some_and(is_truthy);

    match value.get("messages") {
        Some(Value::Array(items)) if !items.is_empty() => {}
        _ => return ParsedBody::Degenerate { model, stream },
    }

    match serde_json::from_value::<ChatRequest>(value) {
        Ok(request) => ParsedBody::Chat(request),
        Err(e) => {
            tracing::debug!("Request does not match chat schema, forwarding as-is: {}", e);
            ParsedBody::Opaque { stream }
        }
    }
}

fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
