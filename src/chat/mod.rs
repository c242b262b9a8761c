//! Conversation model for the streaming chat client
//!
//! This module defines the chat message types and the [`MessageStore`], an
//! explicit, append-only conversation list. Stream sessions mutate the store
//! through it rather than capturing UI state, so exactly one writer exists
//! for the lifetime of a session.

pub mod stream;

use serde::{Deserialize, Serialize};

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A document the server cites as having contributed to an answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDocument {
    pub id: i64,
    pub name: String,
}

/// One entry in a conversation.
///
/// Assistant messages are created empty and receive their content
/// incrementally while a stream session is open. `sources` stays `None`
/// until a non-empty sources event arrives; absence (not an empty list) is
/// the "no sources" signal. `thinking_time` is set once, from the stream's
/// completion event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<SourceDocument>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking_time: Option<f64>,
}

impl ChatMessage {
    /// Create a user message with the given content.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            sources: None,
            thinking_time: None,
        }
    }

    /// Create an empty assistant message, ready to receive streamed tokens.
    pub fn assistant() -> Self {
        Self {
            role: Role::Assistant,
            content: String::new(),
            sources: None,
            thinking_time: None,
        }
    }
}

/// Append-only conversation list.
///
/// The open assistant message (the one actively receiving tokens) is always
/// located by scanning from the end of the list, never by a stored index,
/// so callers must preserve append order.
#[derive(Debug, Default)]
pub struct MessageStore {
    messages: Vec<ChatMessage>,
}

impl MessageStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message to the conversation.
    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// All messages in append order.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// The most recent assistant message, scanning from the end.
    pub fn last_assistant(&self) -> Option<&ChatMessage> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::Assistant)
    }

    /// Mutable access to the most recent assistant message.
    pub fn last_assistant_mut(&mut self) -> Option<&mut ChatMessage> {
        self.messages
            .iter_mut()
            .rev()
            .find(|m| m.role == Role::Assistant)
    }

    /// Drop the whole conversation.
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Phrases the backend emits when retrieval found nothing useful.
///
/// The server answers in Chinese; these are the exact phrases the original
/// deployment produces. Substring matching against model output is fragile
/// and this stays a display heuristic only: it gates a hint about the
/// data-intake workflow and never alters message state.
const NO_ANSWER_PHRASES: [&str; 9] = [
    "未找到答案",
    "找不到答案",
    "未找到",
    "找不到",
    "抱歉，未找到",
    "抱歉，找不到",
    "没有找到",
    "暂无答案",
    "无法找到",
];

/// Whether a completed assistant answer amounts to "no answer found".
pub fn is_no_answer(content: &str) -> bool {
    if content.trim().is_empty() {
        return false;
    }
    NO_ANSWER_PHRASES.iter().any(|p| content.contains(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_has_content_and_no_metadata() {
        let msg = ChatMessage::user("hello");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "hello");
        assert!(msg.sources.is_none());
        assert!(msg.thinking_time.is_none());
    }

    #[test]
    fn test_assistant_message_starts_empty() {
        let msg = ChatMessage::assistant();
        assert_eq!(msg.role, Role::Assistant);
        assert!(msg.content.is_empty());
    }

    #[test]
    fn test_store_preserves_append_order() {
        let mut store = MessageStore::new();
        store.push(ChatMessage::user("one"));
        store.push(ChatMessage::assistant());
        store.push(ChatMessage::user("two"));

        let contents: Vec<&str> = store
            .messages()
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(contents, vec!["one", "", "two"]);
    }

    #[test]
    fn test_last_assistant_mut_finds_most_recent() {
        let mut store = MessageStore::new();
        store.push(ChatMessage::user("q1"));
        let mut first = ChatMessage::assistant();
        first.content = "a1".to_string();
        store.push(first);
        store.push(ChatMessage::user("q2"));
        store.push(ChatMessage::assistant());

        let open = store.last_assistant_mut().unwrap();
        assert!(open.content.is_empty());
        open.content.push_str("a2");

        assert_eq!(store.messages()[3].content, "a2");
        assert_eq!(store.messages()[1].content, "a1");
    }

    #[test]
    fn test_last_assistant_mut_skips_trailing_user_message() {
        let mut store = MessageStore::new();
        store.push(ChatMessage::assistant());
        store.push(ChatMessage::user("follow-up"));

        let open = store.last_assistant_mut().unwrap();
        assert_eq!(open.role, Role::Assistant);
    }

    #[test]
    fn test_last_assistant_none_when_no_assistant_messages() {
        let mut store = MessageStore::new();
        store.push(ChatMessage::user("hello"));
        assert!(store.last_assistant().is_none());
        assert!(store.last_assistant_mut().is_none());
    }

    #[test]
    fn test_clear_empties_store() {
        let mut store = MessageStore::new();
        store.push(ChatMessage::user("hello"));
        assert!(!store.is_empty());
        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_source_document_deserializes_from_stream_payload() {
        let json = r#"{"id": 7, "name": "annual_report.pdf"}"#;
        let doc: SourceDocument = serde_json::from_str(json).unwrap();
        assert_eq!(doc.id, 7);
        assert_eq!(doc.name, "annual_report.pdf");
    }

    #[test]
    fn test_is_no_answer_matches_known_phrases() {
        assert!(is_no_answer("抱歉，未找到相关答案。"));
        assert!(is_no_answer("知识库中没有找到该企业的数据"));
        assert!(is_no_answer("暂无答案"));
    }

    #[test]
    fn test_is_no_answer_rejects_normal_answers() {
        assert!(!is_no_answer("该企业2024年范围一排放总量为1234吨。"));
        assert!(!is_no_answer("Here is the summary you asked for."));
    }

    #[test]
    fn test_is_no_answer_rejects_empty_content() {
        assert!(!is_no_answer(""));
        assert!(!is_no_answer("   "));
    }
}
