//! HTTP 处理器：只做会话解析、服务调用和错误 → 状态码的映射，
//! 不包含任何会话逻辑

use crate::chat::settings::SettingsPatch;
use crate::error::ChatError;
use crate::server::AppState;
use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::chat::session::DEFAULT_SESSION;

/// 可选的会话标识头；缺失的客户端共享默认会话
const SESSION_HEADER: &str = "x-session-id";

fn session_id(headers: &HeaderMap) -> &str {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or(DEFAULT_SESSION)
}

/// 错误种类 → HTTP 状态码
fn error_status(err: &ChatError) -> StatusCode {
    match err {
        ChatError::Validation(_) => StatusCode::BAD_REQUEST,
        ChatError::Provider(_) => StatusCode::BAD_GATEWAY,
        ChatError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        ChatError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        ChatError::MissingCredential => StatusCode::SERVICE_UNAVAILABLE,
        ChatError::Cancelled => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[derive(Deserialize)]
pub struct SendMessageRequest {
    #[serde(default)]
    pub message: String,
}

#[derive(Deserialize, Default)]
pub struct SaveConversationRequest {
    #[serde(default)]
    pub filename: Option<String>,
}

/// GET `/` — UI 模板渲染不在范围内，返回模板原本接收的数据
pub async fn index(State(state): State<Arc<AppState>>, headers: HeaderMap) -> impl IntoResponse {
    let session = state.registry.session(session_id(&headers)).await;
    let svc = session.lock().await;
    Json(json!({
        "models": svc.available_models(),
        "config": svc.config(),
        "languages": svc.available_languages(),
    }))
}

/// POST `/send_message`
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<SendMessageRequest>,
) -> impl IntoResponse {
    let session = state.registry.session(session_id(&headers)).await;
    let mut svc = session.lock().await;
    match svc.send_message(&req.message, &CancellationToken::new()).await {
        Ok(reply) => (StatusCode::OK, Json(json!(reply))),
        Err(e) => (error_status(&e), Json(json!({ "error": e.to_string() }))),
    }
}

/// POST `/update_config`
pub async fn update_config(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(patch): Json<SettingsPatch>,
) -> impl IntoResponse {
    let session = state.registry.session(session_id(&headers)).await;
    let mut svc = session.lock().await;
    match svc.update_config(&patch) {
        Ok(config) => (
            StatusCode::OK,
            Json(json!({ "status": "success", "config": config })),
        ),
        Err(e) => (
            error_status(&e),
            Json(json!({ "status": "error", "message": e.to_string() })),
        ),
    }
}

/// POST `/clear_history`
pub async fn clear_history(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let session = state.registry.session(session_id(&headers)).await;
    session.lock().await.clear_history();
    Json(json!({ "status": "success" }))
}

/// POST `/save_conversation` — 请求体可整体缺省
pub async fn save_conversation(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> impl IntoResponse {
    let filename = serde_json::from_slice::<SaveConversationRequest>(&body)
        .ok()
        .and_then(|req| req.filename);
    let session = state.registry.session(session_id(&headers)).await;
    let svc = session.lock().await;
    match svc.save_conversation(filename).await {
        Ok(filename) => {
            info!(filename = %filename, "conversation exported");
            (
                StatusCode::OK,
                Json(json!({ "status": "success", "filename": filename })),
            )
        }
        Err(e) => (
            error_status(&e),
            Json(json!({ "status": "error", "message": e.to_string() })),
        ),
    }
}

/// GET `/get_config`
pub async fn get_config(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let session = state.registry.session(session_id(&headers)).await;
    let config = session.lock().await.config();
    Json(json!({ "status": "success", "config": config }))
}

/// GET `/get_available_languages`
pub async fn get_available_languages(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let session = state.registry.session(session_id(&headers)).await;
    let languages = session.lock().await.available_languages();
    Json(json!({ "status": "success", "languages": languages }))
}

/// GET `/get_available_models`
pub async fn get_available_models(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let session = state.registry.session(session_id(&headers)).await;
    let models = session.lock().await.available_models();
    Json(json!({ "status": "success", "models": models }))
}
