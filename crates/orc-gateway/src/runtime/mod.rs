//! The turn loop and its supporting pieces: active-agent resolution, tool
//! dispatch, Home Assistant tool handlers, and per-session concurrency
//! control (spec §4.5).

pub mod agent;
pub mod cancel;
pub mod ha_tools;
pub mod session_lock;
pub mod tools;
pub mod turn;

pub use turn::{run_turn, TurnOutcome, MAX_TOOL_LOOPS};

use orc_domain::tool::{ContentPart, Message, MessageContent, Role, ToolCall};
use orc_sessions::types::{Role as TurnRole, Turn};

/// Convert a session's turn history into provider-agnostic messages, with
/// the active agent's instruction prepended as the system message.
pub(super) fn transcript_to_messages(instruction: &str, turns: &[Turn]) -> Vec<Message> {
    let mut messages = Vec::with_capacity(turns.len() + 1);
    messages.push(Message::system(instruction));
    for turn in turns {
        let role = match turn.role {
            TurnRole::User => Role::User,
            TurnRole::Assistant => Role::Assistant,
        };
        messages.push(Message { role, content: MessageContent::Text(turn.content.clone()) });
    }
    messages
}

/// Build the assistant-side message representing a model turn that made
/// tool calls: free text (if any) followed by one `tool_use` part per call.
pub(super) fn build_assistant_tool_message(text: &str, tool_calls: &[ToolCall]) -> Message {
    let mut parts = Vec::new();
    if !text.is_empty() {
        parts.push(ContentPart::Text { text: text.to_string() });
    }
    for call in tool_calls {
        parts.push(ContentPart::ToolUse { id: call.call_id.clone(), name: call.tool_name.clone(), input: call.arguments.clone() });
    }
    Message { role: Role::Assistant, content: MessageContent::Parts(parts) }
}

/// Truncate `s` to at most `max` bytes on a UTF-8 boundary, appending `...`
/// when truncated.
pub(super) fn truncate_str(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) && end > 0 {
        end -= 1;
    }
    format!("{}...", &s[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn turn(id: u64, role: TurnRole, content: &str) -> Turn {
        Turn { id, role, content: content.to_string(), agent_name: None, timestamp: Utc::now() }
    }

    #[test]
    fn transcript_to_messages_prepends_system_instruction() {
        let turns = vec![turn(0, TurnRole::User, "hi")];
        let msgs = transcript_to_messages("be helpful", &turns);
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0].role, Role::System);
        assert_eq!(msgs[1].role, Role::User);
    }

    #[test]
    fn transcript_to_messages_preserves_order() {
        let turns = vec![
            turn(0, TurnRole::User, "question"),
            turn(1, TurnRole::Assistant, "answer"),
            turn(2, TurnRole::User, "follow up"),
        ];
        let msgs = transcript_to_messages("", &turns);
        assert_eq!(msgs.len(), 4);
        assert_eq!(msgs[1].role, Role::User);
        assert_eq!(msgs[2].role, Role::Assistant);
        assert_eq!(msgs[3].role, Role::User);
    }

    #[test]
    fn build_tool_msg_text_and_tools() {
        let calls = vec![ToolCall { call_id: "tc_a".into(), tool_name: "read".into(), arguments: serde_json::json!({}) }];
        let msg = build_assistant_tool_message("thinking...", &calls);
        match &msg.content {
            MessageContent::Parts(parts) => {
                assert_eq!(parts.len(), 2);
                assert!(matches!(&parts[0], ContentPart::Text { .. }));
                assert!(matches!(&parts[1], ContentPart::ToolUse { .. }));
            }
            _ => panic!("expected Parts content"),
        }
    }

    #[test]
    fn build_tool_msg_empty_text_not_included() {
        let msg = build_assistant_tool_message("", &[]);
        match &msg.content {
            MessageContent::Parts(parts) => assert!(parts.is_empty()),
            _ => panic!("expected Parts content"),
        }
    }

    #[test]
    fn truncate_str_within_limit() {
        assert_eq!(truncate_str("hello", 10), "hello");
    }

    #[test]
    fn truncate_str_multibyte_utf8_no_split() {
        let s = "h\u{00e9}llo";
        assert_eq!(truncate_str(s, 2), "h...");
    }

    #[test]
    fn truncate_str_emoji_boundary() {
        let s = "\u{1F600}abc";
        assert_eq!(truncate_str(s, 3), "...");
    }
}
