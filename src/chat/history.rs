//! 会话记录：按到达顺序保存的角色消息序列
//!
//! 无容量上限，不做淘汰：每一轮都会把完整记录重发给 provider，
//! 负载与费用随会话长度线性增长，长会话应通过 `clear` / 导出来控制。

use crate::chat::types::Message;

/// 追加式的对话记录，顺序即轮次顺序，从不重排或去重
#[derive(Debug, Default, Clone)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// 只读快照（owned 副本）
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.clone()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// 回滚最近一条消息，用于取消进行中的请求
    pub fn truncate_last(&mut self) -> Option<Message> {
        self.messages.pop()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::types::Role;

    #[test]
    fn test_append_preserves_order() {
        let mut t = Transcript::new();
        t.append(Message::user("primeira"));
        t.append(Message::assistant("resposta"));
        t.append(Message::user("segunda"));

        let snapshot = t.snapshot();
        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot[0].role, Role::User);
        assert_eq!(snapshot[1].role, Role::Assistant);
        assert_eq!(snapshot[2].content, "segunda");
    }

    #[test]
    fn test_clear_empties_transcript() {
        let mut t = Transcript::new();
        t.append(Message::user("oi"));
        t.clear();
        assert!(t.is_empty());
        assert!(t.snapshot().is_empty());
    }

    #[test]
    fn test_snapshot_is_detached_copy() {
        let mut t = Transcript::new();
        t.append(Message::user("oi"));
        let snapshot = t.snapshot();
        t.clear();
        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn test_truncate_last_rolls_back_one_turn() {
        let mut t = Transcript::new();
        t.append(Message::user("oi"));
        t.append(Message::user("cancelada"));
        let popped = t.truncate_last().unwrap();
        assert_eq!(popped.content, "cancelada");
        assert_eq!(t.len(), 1);
    }
}
