//! 入站 HTTP 层：路由表与共享状态

pub mod handlers;

use crate::chat::client::CompletionBackend;
use crate::chat::session::SessionRegistry;
use axum::Router;
use axum::routing::{get, post};
use std::path::PathBuf;
use std::sync::Arc;

pub struct AppState {
    pub registry: SessionRegistry,
}

impl AppState {
    pub fn new(backend: Arc<dyn CompletionBackend>, export_dir: impl Into<PathBuf>) -> Self {
        Self {
            registry: SessionRegistry::new(backend, export_dir),
        }
    }
}

/// 与上游前端兼容的路由表
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/send_message", post(handlers::send_message))
        .route("/update_config", post(handlers::update_config))
        .route("/clear_history", post(handlers::clear_history))
        .route("/save_conversation", post(handlers::save_conversation))
        .route("/get_config", get(handlers::get_config))
        .route("/get_available_languages", get(handlers::get_available_languages))
        .route("/get_available_models", get(handlers::get_available_models))
        .with_state(state)
}
