//! 会话注册表：session id → 独立的 `ChatService`
//!
//! 取代上游实现的进程级全局会话。每个会话由自己的异步 Mutex 串行化
//! （单写者），不同会话互不阻塞；没有携带 id 的客户端共享 `"default"`
//! 会话，保持上游单一转录的可观测行为。

use crate::chat::client::CompletionBackend;
use crate::chat::service::ChatService;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

/// 未携带 `x-session-id` 的客户端落入的会话
pub const DEFAULT_SESSION: &str = "default";

pub struct SessionRegistry {
    backend: Arc<dyn CompletionBackend>,
    export_dir: PathBuf,
    sessions: RwLock<HashMap<String, Arc<Mutex<ChatService>>>>,
}

impl SessionRegistry {
    pub fn new(backend: Arc<dyn CompletionBackend>, export_dir: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            export_dir: export_dir.into(),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// 取出指定会话，首次访问时创建
    pub async fn session(&self, id: &str) -> Arc<Mutex<ChatService>> {
        {
            let sessions = self.sessions.read().await;
            if let Some(session) = sessions.get(id) {
                return session.clone();
            }
        }
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(id.to_string())
            .or_insert_with(|| {
                debug!(session = %id, "creating new chat session");
                Arc::new(Mutex::new(ChatService::new(
                    self.backend.clone(),
                    self.export_dir.clone(),
                )))
            })
            .clone()
    }

    /// 生成一个新的随机会话 id（注册表条目按需创建）
    pub fn generate_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
