//! 会话配置：类型化字段 + 默认值 + 原子化的部分更新
//!
//! 更新策略：先校验 patch 中的全部字段，全部通过才一次性应用，
//! 任何一个字段非法则整个更新被拒绝并返回字段级错误列表。
//! 唯一的例外是 `language`：不受支持的语言被静默忽略（该字段跳过，
//! 其余字段照常生效），与上游实现保持一致。

use crate::chat::prompts;
use crate::error::{FieldError, Result, ValidationError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// 可用模型列表（provider 侧定义）
pub const AVAILABLE_MODELS: &[&str] = &[
    "llama-3.1-sonar-small-128k-chat",
    "llama-3.1-sonar-large-128k-chat",
    "llama-3.1-sonar-small-128k-online",
    "llama-3.1-sonar-large-128k-online",
    "llama-3.1-sonar-huge-128k-online",
];

/// 搜索时效过滤窗口
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RecencyFilter {
    Month,
    Week,
    Day,
    Hour,
}

impl RecencyFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecencyFilter::Month => "month",
            RecencyFilter::Week => "week",
            RecencyFilter::Day => "day",
            RecencyFilter::Hour => "hour",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "month" => Some(RecencyFilter::Month),
            "week" => Some(RecencyFilter::Week),
            "day" => Some(RecencyFilter::Day),
            "hour" => Some(RecencyFilter::Hour),
            _ => None,
        }
    }
}

impl fmt::Display for RecencyFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 单个会话的完整配置，字段恒为合法取值
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChatSettings {
    pub model: String,
    /// 采样温度，0..=2
    pub temperature: f64,
    /// 0..=1
    pub top_p: f64,
    pub top_k: u32,
    /// None = 使用 provider 默认值
    pub max_tokens: Option<u32>,
    pub presence_penalty: f64,
    pub frequency_penalty: f64,
    pub return_citations: bool,
    pub return_related_questions: bool,
    pub search_recency_filter: Option<RecencyFilter>,
    /// 系统提示词语言键
    pub language: String,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            model: "llama-3.1-sonar-small-128k-online".to_string(),
            temperature: 0.2,
            top_p: 0.9,
            top_k: 0,
            max_tokens: None,
            presence_penalty: 0.0,
            frequency_penalty: 1.0,
            return_citations: true,
            return_related_questions: false,
            search_recency_filter: None,
            language: prompts::DEFAULT_LANGUAGE.to_string(),
        }
    }
}

/// 部分配置更新，字段保持原始 JSON 值，应用时再做类型转换。
/// 未列出的键在反序列化阶段直接丢弃。
#[derive(Debug, Deserialize, Clone, Default)]
pub struct SettingsPatch {
    #[serde(default)]
    pub model: Option<Value>,
    #[serde(default)]
    pub temperature: Option<Value>,
    #[serde(default)]
    pub top_p: Option<Value>,
    #[serde(default)]
    pub top_k: Option<Value>,
    #[serde(default)]
    pub max_tokens: Option<Value>,
    #[serde(default)]
    pub presence_penalty: Option<Value>,
    #[serde(default)]
    pub frequency_penalty: Option<Value>,
    #[serde(default)]
    pub return_citations: Option<Value>,
    #[serde(default)]
    pub return_related_questions: Option<Value>,
    #[serde(default)]
    pub search_recency_filter: Option<Value>,
    #[serde(default)]
    pub language: Option<Value>,
}

impl ChatSettings {
    /// 原子化应用一次部分更新：全部字段校验通过才生效。
    /// 返回应用后的配置副本。
    pub fn apply(&mut self, patch: &SettingsPatch) -> Result<ChatSettings> {
        let mut candidate = self.clone();
        let mut errors: Vec<FieldError> = Vec::new();

        if let Some(v) = &patch.model {
            match coerce_string(v) {
                Some(model) if AVAILABLE_MODELS.contains(&model.as_str()) => {
                    candidate.model = model;
                }
                _ => errors.push(FieldError {
                    field: "model",
                    message: format!("must be one of {:?}", AVAILABLE_MODELS),
                }),
            }
        }

        if let Some(v) = &patch.temperature {
            match coerce_f64(v) {
                Some(t) if (0.0..=2.0).contains(&t) => candidate.temperature = t,
                _ => errors.push(FieldError {
                    field: "temperature",
                    message: "must be a number in 0..=2".to_string(),
                }),
            }
        }

        if let Some(v) = &patch.top_p {
            match coerce_f64(v) {
                Some(p) if (0.0..=1.0).contains(&p) => candidate.top_p = p,
                _ => errors.push(FieldError {
                    field: "top_p",
                    message: "must be a number in 0..=1".to_string(),
                }),
            }
        }

        if let Some(v) = &patch.top_k {
            match coerce_u32(v) {
                Some(k) => candidate.top_k = k,
                None => errors.push(FieldError {
                    field: "top_k",
                    message: "must be a non-negative integer".to_string(),
                }),
            }
        }

        if let Some(v) = &patch.max_tokens {
            if is_none_marker(v) {
                candidate.max_tokens = None;
            } else {
                match coerce_u32(v) {
                    Some(n) if n > 0 => candidate.max_tokens = Some(n),
                    _ => errors.push(FieldError {
                        field: "max_tokens",
                        message: "must be a positive integer or \"none\"".to_string(),
                    }),
                }
            }
        }

        if let Some(v) = &patch.presence_penalty {
            match coerce_f64(v) {
                Some(p) => candidate.presence_penalty = p,
                None => errors.push(FieldError {
                    field: "presence_penalty",
                    message: "must be a number".to_string(),
                }),
            }
        }

        if let Some(v) = &patch.frequency_penalty {
            match coerce_f64(v) {
                Some(p) => candidate.frequency_penalty = p,
                None => errors.push(FieldError {
                    field: "frequency_penalty",
                    message: "must be a number".to_string(),
                }),
            }
        }

        if let Some(v) = &patch.return_citations {
            match coerce_bool(v) {
                Some(b) => candidate.return_citations = b,
                None => errors.push(FieldError {
                    field: "return_citations",
                    message: "must be a boolean".to_string(),
                }),
            }
        }

        if let Some(v) = &patch.return_related_questions {
            match coerce_bool(v) {
                Some(b) => candidate.return_related_questions = b,
                None => errors.push(FieldError {
                    field: "return_related_questions",
                    message: "must be a boolean".to_string(),
                }),
            }
        }

        if let Some(v) = &patch.search_recency_filter {
            if is_none_marker(v) {
                candidate.search_recency_filter = None;
            } else {
                match coerce_string(v).and_then(|s| RecencyFilter::parse(&s)) {
                    Some(filter) => candidate.search_recency_filter = Some(filter),
                    None => errors.push(FieldError {
                        field: "search_recency_filter",
                        message: "must be one of month/week/day/hour or \"none\"".to_string(),
                    }),
                }
            }
        }

        if let Some(v) = &patch.language {
            match coerce_string(v) {
                Some(lang) if prompts::is_supported(&lang) => candidate.language = lang,
                // 不受支持的语言忽略该字段，更新的其余部分照常生效
                other => {
                    tracing::debug!(language = ?other, "ignoring unsupported language");
                }
            }
        }

        if !errors.is_empty() {
            return Err(ValidationError::InvalidFields(errors).into());
        }

        *self = candidate.clone();
        Ok(candidate)
    }
}

// ── wire 值类型转换 ───────────────────────────────────────────────────────────

fn coerce_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

fn coerce_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn coerce_u32(v: &Value) -> Option<u32> {
    match v {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn coerce_bool(v: &Value) -> Option<bool> {
    match v {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.to_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// `"none"`（不区分大小写）表示清除可选字段
fn is_none_marker(v: &Value) -> bool {
    matches!(v, Value::String(s) if s.eq_ignore_ascii_case("none"))
}
