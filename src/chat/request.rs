//! 出站请求组装：系统提示词 + 会话记录 + 当前配置

use crate::chat::prompts;
use crate::chat::settings::ChatSettings;
use crate::chat::types::{CompletionRequest, Message};

/// 组装一次补全请求。
///
/// 系统消息按 `settings.language` 从静态表选取并置于 messages 首位；
/// `max_tokens` 与 `search_recency_filter` 仅在有值时进入请求体
/// （省略键与发送 null 在 provider 侧语义不同）。
pub fn build_request(settings: &ChatSettings, history: &[Message]) -> CompletionRequest {
    let mut messages = Vec::with_capacity(history.len() + 1);
    messages.push(Message::system(prompts::system_prompt(&settings.language)));
    messages.extend_from_slice(history);

    CompletionRequest {
        model: settings.model.clone(),
        messages,
        temperature: settings.temperature,
        top_p: settings.top_p,
        top_k: settings.top_k,
        max_tokens: settings.max_tokens,
        presence_penalty: settings.presence_penalty,
        frequency_penalty: settings.frequency_penalty,
        return_citations: settings.return_citations,
        return_related_questions: settings.return_related_questions,
        search_recency_filter: settings
            .search_recency_filter
            .map(|f| f.as_str().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::settings::RecencyFilter;
    use crate::chat::types::Role;

    #[test]
    fn test_system_message_prepended() {
        let settings = ChatSettings::default();
        let history = vec![Message::user("oi"), Message::assistant("olá")];
        let req = build_request(&settings, &history);

        assert_eq!(req.messages.len(), 3);
        assert_eq!(req.messages[0].role, Role::System);
        assert!(req.messages[0].content.contains("português"));
        assert_eq!(req.messages[1].content, "oi");
        assert_eq!(req.messages[2].content, "olá");
    }

    #[test]
    fn test_unknown_language_uses_english_prompt() {
        let settings = ChatSettings {
            language: "fr".to_string(),
            ..ChatSettings::default()
        };
        let req = build_request(&settings, &[]);
        assert!(req.messages[0].content.contains("English"));
    }

    #[test]
    fn test_absent_max_tokens_omitted_from_body() {
        let settings = ChatSettings::default();
        let req = build_request(&settings, &[]);
        let json = serde_json::to_value(&req).unwrap();

        assert!(json.get("max_tokens").is_none());
        assert!(json.get("search_recency_filter").is_none());
        // 非可选参数必须始终在场
        assert_eq!(json["temperature"], 0.2);
        assert_eq!(json["top_k"], 0);
        assert_eq!(json["return_citations"], true);
    }

    #[test]
    fn test_present_max_tokens_included_verbatim() {
        let settings = ChatSettings {
            max_tokens: Some(512),
            search_recency_filter: Some(RecencyFilter::Day),
            ..ChatSettings::default()
        };
        let json = serde_json::to_value(build_request(&settings, &[])).unwrap();
        assert_eq!(json["max_tokens"], 512);
        assert_eq!(json["search_recency_filter"], "day");
    }
}
