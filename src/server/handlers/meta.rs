use axum::{
    extract::State,
    http::Method,
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

use crate::error::ShimError;
use crate::server::AppState;

#[derive(Debug, Clone, Serialize)]
pub struct Health {
    pub ok: bool,
    pub gateway: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceDescriptor {
    pub object: &'static str,
    pub id: &'static str,
    pub chat_completions: &'static str,
    pub models: &'static str,
}

// 模型列表（OpenAI 兼容）
#[derive(Debug, Clone, Serialize)]
pub struct ModelListResponse {
    pub object: String,
    pub data: Vec<Model>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Model {
    pub id: String,
    pub object: String,
    pub created: u64,
    pub owned_by: String,
}

pub async fn health(State(app_state): State<Arc<AppState>>) -> Json<Health> {
    Json(Health {
        ok: true,
        gateway: app_state.relay.gateway().base_url.clone(),
    })
}

pub async fn service_descriptor() -> Json<ServiceDescriptor> {
    Json(ServiceDescriptor {
        object: "service",
        id: "openclaw-typingmind-proxy",
        chat_completions: "/v1/chat/completions",
        models: "/v1/models",
    })
}

/// Advertises the single configured model; keyword routing stays invisible to clients.
pub async fn list_models(State(app_state): State<Arc<AppState>>) -> Json<ModelListResponse> {
    Json(ModelListResponse {
        object: "list".to_string(),
        data: vec![Model {
            id: app_state.config.models.default_model.clone(),
            object: "model".to_string(),
            created: Utc::now().timestamp().max(0) as u64,
            owned_by: "openclaw".to_string(),
        }],
    })
}

pub async fn not_found(method: Method) -> Response {
    if method == Method::POST {
        ShimError::UnsupportedEndpoint.into_response()
    } else {
        ShimError::NotFound.into_response()
    }
}

#[cfg(test)]
mod tests {
    use crate::config::Settings;
    use crate::server::create_app;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    async fn call(settings: Settings, req: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
        let app = create_app(settings).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, headers, body.to_vec())
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn health_reports_gateway() {
        let mut settings = Settings::default();
        settings.gateway.base_url = "http://gw:1".into();
        let (status, _, body) = call(settings, get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        let v: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(v, json!({"ok": true, "gateway": "http://gw:1"}));
    }

    #[tokio::test]
    async fn service_descriptor_on_both_v1_paths() {
        for path in ["/v1", "/v1/"] {
            let (status, _, body) = call(Settings::default(), get(path)).await;
            assert_eq!(status, StatusCode::OK);
            let v: Value = serde_json::from_slice(&body).unwrap();
            assert_eq!(v["object"], "service");
            assert_eq!(v["chat_completions"], "/v1/chat/completions");
            assert_eq!(v["models"], "/v1/models");
        }
    }

    #[tokio::test]
    async fn models_lists_exactly_the_default_model() {
        for path in ["/v1/models", "/models"] {
            let (status, _, body) = call(Settings::default(), get(path)).await;
            assert_eq!(status, StatusCode::OK);
            let v: Value = serde_json::from_slice(&body).unwrap();
            assert_eq!(v["object"], "list");
            let data = v["data"].as_array().unwrap();
            assert_eq!(data.len(), 1);
            assert_eq!(data[0]["id"], "openclaw:main");
            assert_eq!(data[0]["owned_by"], "openclaw");
        }
    }

    #[tokio::test]
    async fn unknown_paths_are_404_envelopes() {
        let (status, _, body) = call(Settings::default(), get("/nope")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let v: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            v,
            json!({"error": {"message": "not found", "type": "invalid_request_error"}})
        );

        let post = Request::builder()
            .method("POST")
            .uri("/v2/chat")
            .body(Body::empty())
            .unwrap();
        let (status, _, body) = call(Settings::default(), post).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let v: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(v["error"]["message"], "unsupported endpoint");
    }

    #[tokio::test]
    async fn wrong_method_on_known_path_is_404() {
        let (status, _, _) = call(Settings::default(), get("/v1/chat/completions")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn options_is_204_with_cors_headers() {
        let req = Request::builder()
            .method("OPTIONS")
            .uri("/v1/chat/completions")
            .header(header::ORIGIN, "https://chat.example")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap();
        let (status, headers, _) = call(Settings::default(), req).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        let methods = headers[header::ACCESS_CONTROL_ALLOW_METHODS].to_str().unwrap();
        assert!(methods.contains("POST"));
    }

    #[tokio::test]
    async fn plain_responses_carry_allow_origin() {
        let req = Request::builder()
            .uri("/health")
            .header(header::ORIGIN, "https://chat.example")
            .body(Body::empty())
            .unwrap();
        let (_, headers, _) = call(Settings::default(), req).await;
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }
}
