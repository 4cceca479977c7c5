//! 语言 → 系统提示词静态表
//!
//! `language` 配置项以这里的键为合法取值；未知语言在构建请求时
//! 回退到 [`FALLBACK_LANGUAGE`]。

/// 未知语言的回退键
pub const FALLBACK_LANGUAGE: &str = "en";

/// 新会话的默认语言
pub const DEFAULT_LANGUAGE: &str = "pt-br";

const SYSTEM_PROMPTS: &[(&str, &str)] = &[
    (
        "pt-br",
        "Você é um assistente prestativo. Responda sempre em português do Brasil de forma clara e natural.",
    ),
    (
        "en",
        "You are a helpful assistant. Always respond in English in a clear and natural way.",
    ),
];

/// 判断语言键是否受支持
pub fn is_supported(language: &str) -> bool {
    SYSTEM_PROMPTS.iter().any(|(key, _)| *key == language)
}

/// 按语言取系统提示词，未知语言回退到英语
pub fn system_prompt(language: &str) -> &'static str {
    SYSTEM_PROMPTS
        .iter()
        .find(|(key, _)| *key == language)
        .or_else(|| SYSTEM_PROMPTS.iter().find(|(key, _)| *key == FALLBACK_LANGUAGE))
        .map(|(_, prompt)| *prompt)
        .expect("fallback language must exist in the prompt table")
}

/// 受支持的语言键列表（表内顺序）
pub fn available_languages() -> Vec<&'static str> {
    SYSTEM_PROMPTS.iter().map(|(key, _)| *key).collect()
}
