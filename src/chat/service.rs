//! 会话编排：校验 → 记录 → 组装请求 → 调用 provider → 记录回复
//!
//! 一个 `ChatService` 只服务一个会话，配置与记录都归它所有；
//! 多会话隔离由 [`session`](crate::chat::session) 模块负责。

use crate::chat::client::CompletionBackend;
use crate::chat::history::Transcript;
use crate::chat::request::build_request;
use crate::chat::settings::{AVAILABLE_MODELS, ChatSettings, SettingsPatch};
use crate::chat::types::{ChatReply, Message};
use crate::chat::prompts;
use crate::error::{ChatError, PersistenceError, Result, ValidationError};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub struct ChatService {
    settings: ChatSettings,
    transcript: Transcript,
    backend: Arc<dyn CompletionBackend>,
    /// 会话导出目录
    export_dir: PathBuf,
}

impl ChatService {
    pub fn new(backend: Arc<dyn CompletionBackend>, export_dir: impl Into<PathBuf>) -> Self {
        Self {
            settings: ChatSettings::default(),
            transcript: Transcript::new(),
            backend,
            export_dir: export_dir.into(),
        }
    }

    /// 发送一条用户消息并返回标准化结果。
    ///
    /// 成功时记录增长恰好两条（user、assistant）；provider 失败时只留下
    /// user 一条（错误不作为 assistant 消息记录）；取消时回滚 user 消息，
    /// 记录恢复到调用前的状态。
    pub async fn send_message(
        &mut self,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<ChatReply> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ValidationError::EmptyMessage.into());
        }

        self.transcript.append(Message::user(text));
        let request = build_request(&self.settings, &self.transcript.snapshot());

        info!(
            model = %self.settings.model,
            turns = self.transcript.len(),
            "sending message to provider"
        );

        match self.backend.complete(&request, cancel).await {
            Ok(reply) => {
                self.transcript.append(Message::assistant(reply.content.clone()));
                Ok(reply)
            }
            Err(ChatError::Cancelled) => {
                // 取消不能静默留下孤立的 user 轮次
                self.transcript.truncate_last();
                warn!("provider call cancelled, user turn rolled back");
                Err(ChatError::Cancelled)
            }
            Err(e) => {
                warn!(error = %e, "provider call failed, user turn kept");
                Err(e)
            }
        }
    }

    /// 原子化应用一次配置更新，返回更新后的配置
    pub fn update_config(&mut self, patch: &SettingsPatch) -> Result<ChatSettings> {
        let updated = self.settings.apply(patch)?;
        info!(model = %updated.model, language = %updated.language, "config updated");
        Ok(updated)
    }

    pub fn clear_history(&mut self) {
        self.transcript.clear();
        info!("conversation history cleared");
    }

    /// 把当前记录快照导出为 JSON 文件，返回文件名。
    /// 纯副作用操作，不改变记录本身。
    pub async fn save_conversation(&self, filename: Option<String>) -> Result<String> {
        let filename = filename.unwrap_or_else(|| {
            let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
            format!("conversation_{timestamp}.json")
        });

        let snapshot = self.transcript.snapshot();
        let json = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| PersistenceError::Serialization(e.to_string()))?;

        tokio::fs::create_dir_all(&self.export_dir)
            .await
            .map_err(|e| PersistenceError::Io(format!("failed to create export dir: {e}")))?;
        let path = self.export_dir.join(&filename);
        tokio::fs::write(&path, json)
            .await
            .map_err(|e| PersistenceError::Io(format!("failed to write {}: {e}", path.display())))?;

        info!(path = %path.display(), messages = snapshot.len(), "conversation saved");
        Ok(filename)
    }

    // ── 只读访问器 ───────────────────────────────────────────────────────────

    pub fn config(&self) -> ChatSettings {
        self.settings.clone()
    }

    pub fn history(&self) -> Vec<Message> {
        self.transcript.snapshot()
    }

    pub fn available_models(&self) -> Vec<&'static str> {
        AVAILABLE_MODELS.to_vec()
    }

    pub fn available_languages(&self) -> Vec<&'static str> {
        prompts::available_languages()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::types::Role;
    use crate::error::ProviderError;
    use crate::testing::MockBackend;

    fn service(mock: Arc<MockBackend>) -> (ChatService, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        (ChatService::new(mock, dir.path()), dir)
    }

    #[tokio::test]
    async fn test_send_message_appends_two_turns() {
        let mock = Arc::new(MockBackend::new().with_reply("olá!"));
        let (mut svc, _dir) = service(mock.clone());

        let reply = svc
            .send_message("hi", &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(reply.content, "olá!");

        let history = svc.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0], Message::user("hi"));
        assert_eq!(history[1], Message::assistant("olá!"));
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_message_rejected_before_append() {
        let mock = Arc::new(MockBackend::new());
        let (mut svc, _dir) = service(mock.clone());

        for text in ["", "   ", "\n\t"] {
            let err = svc
                .send_message(text, &CancellationToken::new())
                .await
                .unwrap_err();
            assert!(matches!(
                err,
                ChatError::Validation(ValidationError::EmptyMessage)
            ));
        }
        assert!(svc.history().is_empty());
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_provider_error_keeps_user_turn_only() {
        let mock = Arc::new(MockBackend::new().with_error(ChatError::Provider(
            ProviderError::Api {
                status: 500,
                message: "boom".to_string(),
            },
        )));
        let (mut svc, _dir) = service(mock);

        let err = svc
            .send_message("hi", &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Provider(_)));

        let history = svc.history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].role, Role::User);
    }

    #[tokio::test]
    async fn test_cancellation_rolls_back_user_turn() {
        let mock = Arc::new(
            MockBackend::new()
                .with_reply("r1")
                .with_error(ChatError::Cancelled),
        );
        let (mut svc, _dir) = service(mock);
        svc.send_message("primeira", &CancellationToken::new())
            .await
            .unwrap();

        let before = svc.history();
        let err = svc
            .send_message("cancelada", &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Cancelled));
        assert_eq!(svc.history(), before);
    }

    #[tokio::test]
    async fn test_full_history_resent_each_turn() {
        let mock = Arc::new(MockBackend::new().with_reply("r1").with_reply("r2"));
        let (mut svc, _dir) = service(mock.clone());
        let cancel = CancellationToken::new();

        svc.send_message("um", &cancel).await.unwrap();
        svc.send_message("dois", &cancel).await.unwrap();

        let last = mock.last_request().unwrap();
        // system + (user, assistant, user)
        assert_eq!(last.messages.len(), 4);
        assert_eq!(last.messages[0].role, Role::System);
        assert_eq!(last.messages[3].content, "dois");
    }

    #[tokio::test]
    async fn test_clear_history() {
        let mock = Arc::new(MockBackend::new().with_reply("r"));
        let (mut svc, _dir) = service(mock);
        svc.send_message("oi", &CancellationToken::new())
            .await
            .unwrap();
        svc.clear_history();
        assert!(svc.history().is_empty());
    }

    #[tokio::test]
    async fn test_save_conversation_roundtrip() {
        let mock = Arc::new(MockBackend::new().with_reply("resposta"));
        let (mut svc, dir) = service(mock);
        svc.send_message("pergunta", &CancellationToken::new())
            .await
            .unwrap();

        let filename = svc.save_conversation(None).await.unwrap();
        assert!(filename.starts_with("conversation_"));
        assert!(filename.ends_with(".json"));

        let raw = std::fs::read_to_string(dir.path().join(&filename)).unwrap();
        let reloaded: Vec<Message> = serde_json::from_str(&raw).unwrap();
        assert_eq!(reloaded, svc.history());
    }

    #[tokio::test]
    async fn test_save_conversation_explicit_filename() {
        let mock = Arc::new(MockBackend::new());
        let (svc, dir) = service(mock);

        let filename = svc
            .save_conversation(Some("minha_conversa.json".to_string()))
            .await
            .unwrap();
        assert_eq!(filename, "minha_conversa.json");
        assert!(dir.path().join("minha_conversa.json").exists());
    }

    #[test]
    fn test_accessors() {
        let mock = Arc::new(MockBackend::new());
        let svc = ChatService::new(mock, ".");
        assert_eq!(svc.config(), ChatSettings::default());
        assert_eq!(svc.available_models().len(), 5);
        assert!(svc.available_languages().contains(&"pt-br"));
    }
}
