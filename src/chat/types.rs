//! Perplexity Chat Completions API 类型定义

use serde::{Deserialize, Serialize};

/// 消息角色
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// 对话消息，对应 messages 数组中的单条记录
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// `/chat/completions` 请求体
///
/// `max_tokens` 和 `search_recency_filter` 为 None 时整个键被省略，
/// 与发送 null 在 API 侧语义不同，不能合并。
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub temperature: f64,
    pub top_p: f64,
    pub top_k: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    pub presence_penalty: f64,
    pub frequency_penalty: f64,
    pub return_citations: bool,
    pub return_related_questions: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_recency_filter: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CompletionResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub choices: Vec<Choice>,
    /// 引用来源 URL 列表（仅 online 模型返回）
    #[serde(default)]
    pub citations: Option<Vec<String>>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(flatten)]
    extra: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Choice {
    pub message: Message,
    #[serde(default)]
    pub finish_reason: Option<String>,
    #[serde(default)]
    index: Option<u32>,
}

/// 带 1 起始展示序号的引用
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Citation {
    pub index: usize,
    pub url: String,
}

/// 一次成功补全的标准化结果
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub content: String,
    /// 无引用时为 None（不序列化），而非空列表
    #[serde(skip_serializing_if = "Option::is_none")]
    pub citations: Option<Vec<Citation>>,
}

impl ChatReply {
    /// 从 provider 返回的 URL 列表构造引用，序号从 1 开始、保持原顺序；
    /// 空列表归一化为 None
    pub fn new(content: String, citation_urls: Vec<String>) -> Self {
        let citations: Vec<Citation> = citation_urls
            .into_iter()
            .enumerate()
            .map(|(i, url)| Citation { index: i + 1, url })
            .collect();
        Self {
            content,
            citations: if citations.is_empty() {
                None
            } else {
                Some(citations)
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_lowercase() {
        let msg = Message::user("hi");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["content"], "hi");
    }

    #[test]
    fn test_citations_enumerated_from_one() {
        let reply = ChatReply::new(
            "answer".to_string(),
            vec!["u1".to_string(), "u2".to_string()],
        );
        assert_eq!(
            reply.citations,
            Some(vec![
                Citation {
                    index: 1,
                    url: "u1".to_string()
                },
                Citation {
                    index: 2,
                    url: "u2".to_string()
                },
            ])
        );
    }

    #[test]
    fn test_empty_citations_become_none() {
        let reply = ChatReply::new("answer".to_string(), vec![]);
        assert!(reply.citations.is_none());
        let json = serde_json::to_value(&reply).unwrap();
        assert!(json.get("citations").is_none());
    }

    #[test]
    fn test_response_tolerates_unknown_fields() {
        let raw = r#"{
            "id": "abc",
            "choices": [{"message": {"role": "assistant", "content": "olá"}, "finish_reason": "stop"}],
            "citations": ["https://example.com"],
            "usage": {"prompt_tokens": 10}
        }"#;
        let resp: CompletionResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(resp.choices.len(), 1);
        assert_eq!(resp.choices[0].message.content, "olá");
        assert_eq!(resp.citations.as_deref(), Some(&["https://example.com".to_string()][..]));
    }
}
