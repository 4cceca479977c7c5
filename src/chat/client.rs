//! Perplexity 补全 API 客户端
//!
//! provider/transport 错误一律在此边界转换为 [`ProviderError`]，
//! 绝不向上抛出未映射的 reqwest 错误。

use crate::chat::types::{ChatReply, CompletionRequest, CompletionResponse};
use crate::error::{ChatError, ProviderError, Result};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::HeaderMap;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// 固定的 provider 端点
pub const COMPLETION_URL: &str = "https://api.perplexity.ai/chat/completions";

/// 单次出站调用的超时上限
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// 补全后端接口，测试时注入 Mock 实现
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// 发起一次补全调用；`cancel` 触发时返回 [`ChatError::Cancelled`]
    async fn complete(
        &self,
        request: &CompletionRequest,
        cancel: &CancellationToken,
    ) -> Result<ChatReply>;
}

/// 基于 reqwest 的默认实现
pub struct CompletionClient {
    client: Client,
    api_key: String,
    url: String,
}

impl CompletionClient {
    /// 创建客户端；凭证为空时立即失败，不等到第一次请求
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ChatError::MissingCredential);
        }
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_key,
            url: COMPLETION_URL.to_string(),
        })
    }

    fn assemble_headers(&self) -> Result<HeaderMap> {
        let mut header_map = HeaderMap::new();
        header_map.insert(
            "Authorization",
            format!("Bearer {}", self.api_key).parse().map_err(|_| {
                ChatError::Provider(ProviderError::Network(
                    "Invalid Authorization header".to_string(),
                ))
            })?,
        );
        header_map.insert(
            "Content-Type",
            "application/json".parse().map_err(|_| {
                ChatError::Provider(ProviderError::Network(
                    "Invalid Content-Type header".to_string(),
                ))
            })?,
        );
        Ok(header_map)
    }

    async fn post(&self, request: &CompletionRequest) -> Result<ChatReply> {
        let response = self
            .client
            .post(&self.url)
            .headers(self.assemble_headers()?)
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ProviderError::Api { status, message }.into());
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        debug!(model = ?completion.model, choices = completion.choices.len(), "completion response");
        extract_reply(completion)
    }
}

#[async_trait]
impl CompletionBackend for CompletionClient {
    async fn complete(
        &self,
        request: &CompletionRequest,
        cancel: &CancellationToken,
    ) -> Result<ChatReply> {
        tokio::select! {
            _ = cancel.cancelled() => Err(ChatError::Cancelled),
            result = self.post(request) => result,
        }
    }
}

/// 取第一个 choice 的文本内容，引用从 1 开始编号、保持 provider 顺序
fn extract_reply(completion: CompletionResponse) -> Result<ChatReply> {
    let citations = completion.citations.unwrap_or_default();
    let content = completion
        .choices
        .into_iter()
        .next()
        .map(|c| c.message.content)
        .ok_or(ProviderError::EmptyResponse)?;
    Ok(ChatReply::new(content, citations))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::types::{Choice, Message};

    fn response(content: &str, citations: Option<Vec<&str>>) -> CompletionResponse {
        serde_json::from_value(serde_json::json!({
            "id": "resp-1",
            "choices": [{"message": {"role": "assistant", "content": content}}],
            "citations": citations,
        }))
        .unwrap()
    }

    #[test]
    fn test_missing_credential_fails_at_construction() {
        assert!(matches!(
            CompletionClient::new(""),
            Err(ChatError::MissingCredential)
        ));
        assert!(matches!(
            CompletionClient::new("   "),
            Err(ChatError::MissingCredential)
        ));
        assert!(CompletionClient::new("pplx-test").is_ok());
    }

    #[test]
    fn test_extract_reply_with_citations() {
        let reply = extract_reply(response("resposta", Some(vec!["u1", "u2"]))).unwrap();
        assert_eq!(reply.content, "resposta");
        let citations = reply.citations.unwrap();
        assert_eq!(citations[0].index, 1);
        assert_eq!(citations[0].url, "u1");
        assert_eq!(citations[1].index, 2);
        assert_eq!(citations[1].url, "u2");
    }

    #[test]
    fn test_extract_reply_without_citations() {
        let reply = extract_reply(response("resposta", None)).unwrap();
        assert!(reply.citations.is_none());
        let reply = extract_reply(response("resposta", Some(vec![]))).unwrap();
        assert!(reply.citations.is_none());
    }

    #[test]
    fn test_extract_reply_empty_choices() {
        let empty: CompletionResponse = serde_json::from_value(serde_json::json!({
            "id": "resp-2",
            "choices": [],
        }))
        .unwrap();
        assert!(matches!(
            extract_reply(empty),
            Err(ChatError::Provider(ProviderError::EmptyResponse))
        ));
    }

    // 序列化往返用于确认 Choice 在响应中的形状
    #[test]
    fn test_choice_decodes_assistant_message() {
        let choice: Choice = serde_json::from_value(serde_json::json!({
            "message": {"role": "assistant", "content": "olá"},
            "finish_reason": "stop",
            "index": 0
        }))
        .unwrap();
        assert_eq!(choice.message, Message::assistant("olá"));
    }
}
