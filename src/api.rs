//! REST API server for the research assistant
//!
//! Exposes the conversation driver over HTTP. Each conversation id gets its
//! own driver instance (state plus history) behind its own lock, so
//! conversations never share mutable state.

use axum::{extract::State, http::StatusCode, routing::get, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tower_http::cors::CorsLayer;
use tracing::info;
use uuid::Uuid;

use crate::driver::Driver;
use crate::error::AgentError;
use crate::llm::ChatBackend;
use crate::providers::Providers;

/// =============================
/// Request Models
/// =============================

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub conversation_id: Option<String>,
    pub message: String,
}

/// =============================
/// Response Wrapper
/// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        Self {
            success: true,
            data: serde_json::to_value(data).ok(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    backend: Arc<dyn ChatBackend>,
    providers: Providers,
    sessions: Arc<RwLock<HashMap<Uuid, Arc<Mutex<Driver>>>>>,
}

impl ApiState {
    pub fn new(backend: Arc<dyn ChatBackend>, providers: Providers) -> Self {
        Self {
            backend,
            providers,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    async fn session(&self, conversation_id: Uuid) -> Arc<Mutex<Driver>> {
        if let Some(session) = self.sessions.read().await.get(&conversation_id) {
            return session.clone();
        }

        let mut sessions = self.sessions.write().await;
        sessions
            .entry(conversation_id)
            .or_insert_with(|| {
                Arc::new(Mutex::new(Driver::new(
                    self.backend.clone(),
                    &self.providers,
                )))
            })
            .clone()
    }
}

/// =============================
/// Helpers
/// =============================

fn stable_uuid_from_string(input: &str) -> Uuid {
    use sha2::{Digest, Sha256};

    let hash = Sha256::digest(input.as_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&hash[..16]);

    // Set UUID version (4) and variant (RFC4122) bits.
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;

    Uuid::from_bytes(bytes)
}

fn resolve_conversation_id(value: Option<&str>) -> Uuid {
    match value {
        Some(v) if !v.trim().is_empty() => {
            Uuid::parse_str(v).unwrap_or_else(|_| stable_uuid_from_string(v))
        }
        _ => Uuid::new_v4(),
    }
}

/// =============================
/// Health Endpoint
/// =============================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Chat Endpoint
/// =============================

async fn chat_handler(
    State(state): State<ApiState>,
    Json(req): Json<ChatRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    if req.message.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("message must not be empty".into())),
        );
    }

    let conversation_id = resolve_conversation_id(req.conversation_id.as_deref());
    info!(%conversation_id, "chat request");

    let session = state.session(conversation_id).await;
    let mut driver = session.lock().await;

    match driver.user_turn(&req.message).await {
        Ok(replies) => (
            StatusCode::OK,
            Json(ApiResponse::success(serde_json::json!({
                "conversation_id": conversation_id.to_string(),
                "reply": replies.join("\n"),
                "replies": replies,
                "state": driver.state(),
            }))),
        ),
        Err(err @ AgentError::RoutingInvalid(_)) => (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(format!("Turn abandoned: {}", err))),
        ),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Chat failed: {}", err))),
        ),
    }
}

/// =============================
/// Router
/// =============================

pub fn create_router(backend: Arc<dyn ChatBackend>, providers: Providers) -> Router {
    let state = ApiState::new(backend, providers);

    Router::new()
        .route("/health", get(health))
        .route("/api/chat", post(chat_handler))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    backend: Arc<dyn ChatBackend>,
    providers: Providers,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(backend, providers);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::llm::ScriptedBackend;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn test_router(replies: &[&str]) -> Router {
        let backend = Arc::new(ScriptedBackend::new(replies.iter().copied()));
        let providers = Providers::new(&Config::default()).unwrap();
        create_router(backend, providers)
    }

    #[test]
    fn stable_uuid_is_deterministic() {
        let a = stable_uuid_from_string("conversation-42");
        let b = stable_uuid_from_string("conversation-42");
        let c = stable_uuid_from_string("conversation-43");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.get_version_num(), 4);
    }

    #[tokio::test]
    async fn health_endpoint_responds() {
        let router = test_router(&[]);

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn chat_turn_runs_through_the_driver() {
        let router = test_router(&[
            "stock_lookup",
            r#"{"action":"done","payload":"CRM","text":"Salesforce trades as CRM."}"#,
            "no_further_task",
        ]);

        let request = Request::builder()
            .method("POST")
            .uri("/api/chat")
            .header("content-type", "application/json")
            .body(Body::from(
                r#"{"conversation_id":"my-session","message":"What's Salesforce's ticker?"}"#,
            ))
            .unwrap();

        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["reply"], "Salesforce trades as CRM.");
        assert_eq!(body["data"]["state"]["ticker"], "CRM");
    }

    #[tokio::test]
    async fn empty_message_is_rejected() {
        let router = test_router(&[]);

        let request = Request::builder()
            .method("POST")
            .uri("/api/chat")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"message":"   "}"#))
            .unwrap();

        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
