//! Mock 补全后端，用于在不发起真实 HTTP 请求的情况下测试
//! [`ChatService`](crate::chat::ChatService) 等注入了
//! `Arc<dyn CompletionBackend>` 的组件。
//!
//! 按顺序返回预设的响应；队列耗尽后返回 `EmptyResponse` 错误。
//! 所有调用都被记录，可通过 [`call_count`](MockBackend::call_count) /
//! [`last_request`](MockBackend::last_request) 检查。

use crate::chat::client::CompletionBackend;
use crate::chat::types::{ChatReply, CompletionRequest};
use crate::error::{ChatError, ProviderError, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

/// 预设响应的枚举（回复或错误）
enum MockResponse {
    Reply(ChatReply),
    Err(ChatError),
}

/// 可脚本化的 Mock 补全后端
pub struct MockBackend {
    responses: Arc<Mutex<VecDeque<MockResponse>>>,
    /// 每次调用收到的请求体，按顺序记录
    calls: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// 追加一条无引用的成功回复
    pub fn with_reply(self, content: impl Into<String>) -> Self {
        self.push(MockResponse::Reply(ChatReply::new(content.into(), vec![])));
        self
    }

    /// 追加一条带引用 URL 的成功回复
    pub fn with_cited_reply(
        self,
        content: impl Into<String>,
        urls: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.push(MockResponse::Reply(ChatReply::new(
            content.into(),
            urls.into_iter().map(Into::into).collect(),
        )));
        self
    }

    /// 追加一条错误响应（用于测试错误处理路径）
    pub fn with_error(self, err: ChatError) -> Self {
        self.push(MockResponse::Err(err));
        self
    }

    /// 追加一条网络错误的便捷方法
    pub fn with_network_error(self, msg: impl Into<String>) -> Self {
        self.with_error(ChatError::Provider(ProviderError::Network(msg.into())))
    }

    fn push(&self, response: MockResponse) {
        self.responses.lock().unwrap().push_back(response);
    }

    /// 已发生的调用总次数
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// 最后一次调用收到的请求体（若从未调用则返回 `None`）
    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.calls.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl CompletionBackend for MockBackend {
    async fn complete(
        &self,
        request: &CompletionRequest,
        _cancel: &CancellationToken,
    ) -> Result<ChatReply> {
        // 记录本次调用
        self.calls.lock().unwrap().push(request.clone());

        // 返回下一个预设响应
        match self.responses.lock().unwrap().pop_front() {
            Some(MockResponse::Reply(reply)) => Ok(reply),
            Some(MockResponse::Err(e)) => Err(e),
            None => Err(ChatError::Provider(ProviderError::EmptyResponse)),
        }
    }
}
