//! Chat panel: an in-memory transcript with single-flight sends.
//!
//! `send` appends the user's message immediately, then posts it. The reply
//! (or, on failure, a fixed apology) is appended when the request completes.
//! A failed turn stays in the transcript. Only one send is in flight at a
//! time, so transcript order is send order.

use serde::Serialize;

use super::format;
use super::{Applied, ViewController};
use crate::api::types::ToolResult;
use crate::runtime::{Completion, MountId, Payload, Request, RequestKind, Runtime, Ticket};

/// Assistant text appended when a send fails.
pub const SEND_FAILURE_TEXT: &str =
    "Sorry, I encountered an error. Please make sure the backend is running.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One transcript entry. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    /// ISO-8601 timestamp: local for user and failure messages, the
    /// server's for replies.
    pub timestamp: String,
    pub tool_results: Vec<ToolResult>,
    pub pattern_detected: Option<String>,
    pub memories_used: Option<u32>,
}

impl ChatMessage {
    fn local(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: format::now_timestamp(),
            tool_results: Vec::new(),
            pattern_detected: None,
            memories_used: None,
        }
    }
}

/// Result of [`ChatController::send`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// User message appended and request issued.
    Dispatched,
    /// Empty or whitespace-only input; nothing happened.
    Empty,
    /// A send is already in flight; nothing happened.
    Busy,
}

pub struct ChatController {
    mount: MountId,
    transcript: Vec<ChatMessage>,
    /// Sequence of the in-flight send, if any.
    pending: Option<u64>,
    last_seq: u64,
    revision: u64,
}

impl ChatController {
    /// Mount an empty transcript. Chat issues no requests on mount.
    pub fn mount(mount: MountId) -> Self {
        Self {
            mount,
            transcript: Vec::new(),
            pending: None,
            last_seq: 0,
            revision: 0,
        }
    }

    pub fn send(&mut self, text: &str, rt: &mut dyn Runtime) -> SendOutcome {
        if text.trim().is_empty() {
            return SendOutcome::Empty;
        }
        if self.pending.is_some() {
            return SendOutcome::Busy;
        }

        self.push(ChatMessage::local(Role::User, text));

        self.last_seq += 1;
        self.pending = Some(self.last_seq);
        rt.issue(Ticket {
            mount: self.mount,
            seq: self.last_seq,
            request: Request::Chat {
                message: text.to_string(),
            },
        });
        SendOutcome::Dispatched
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Bumped on every transcript mutation; renderers scroll to the newest
    /// message whenever it changes.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Index of the message the view should be scrolled to.
    pub fn scroll_anchor(&self) -> Option<usize> {
        self.transcript.len().checked_sub(1)
    }

    pub fn view_model(&self) -> ChatPanel {
        ChatPanel {
            messages: self
                .transcript
                .iter()
                .map(|m| ChatLine {
                    role: m.role,
                    content: m.content.clone(),
                    time: format::clock_time(&m.timestamp),
                    tools: m.tool_results.iter().map(|t| t.tool.clone()).collect(),
                    pattern_detected: m.pattern_detected.clone(),
                    memories_used: m.memories_used,
                })
                .collect(),
            pending: self.is_pending(),
            revision: self.revision,
            scroll_anchor: self.scroll_anchor(),
        }
    }

    fn push(&mut self, message: ChatMessage) {
        self.transcript.push(message);
        self.revision += 1;
    }
}

impl ViewController for ChatController {
    fn mount_id(&self) -> MountId {
        self.mount
    }

    fn on_completion(&mut self, completion: Completion) -> Applied {
        if completion.kind != RequestKind::Chat || self.pending != Some(completion.seq) {
            return Applied::Stale;
        }
        self.pending = None;

        let message = match completion.result {
            Ok(Payload::Chat(reply)) => ChatMessage {
                role: Role::Assistant,
                content: reply.response,
                timestamp: reply.timestamp,
                tool_results: reply.tool_results,
                pattern_detected: reply.pattern_detected,
                memories_used: reply.memories_used,
            },
            _ => ChatMessage::local(Role::Assistant, SEND_FAILURE_TEXT),
        };
        self.push(message);
        Applied::Changed
    }
}

/// Render-ready chat panel.
#[derive(Debug, Clone, Serialize)]
pub struct ChatPanel {
    pub messages: Vec<ChatLine>,
    pub pending: bool,
    pub revision: u64,
    pub scroll_anchor: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatLine {
    pub role: Role,
    pub content: String,
    pub time: String,
    pub tools: Vec<String>,
    pub pattern_detected: Option<String>,
    pub memories_used: Option<u32>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::RequestFailed;
    use crate::api::types::ChatReply;
    use crate::runtime::recording::RecordingRuntime;

    fn reply(text: &str) -> Payload {
        Payload::Chat(ChatReply {
            response: text.to_string(),
            timestamp: "2025-01-31T12:00:00".to_string(),
            tool_results: vec![ToolResult {
                tool: "search_web".to_string(),
                extra: Default::default(),
            }],
            pattern_detected: None,
            memories_used: Some(2),
        })
    }

    fn complete(chat: &mut ChatController, seq: u64, result: Result<Payload, RequestFailed>) -> Applied {
        chat.on_completion(Completion {
            mount: chat.mount_id(),
            seq,
            kind: RequestKind::Chat,
            result,
        })
    }

    #[test]
    fn blank_input_issues_nothing() {
        let mut rt = RecordingRuntime::new();
        let mut chat = ChatController::mount(MountId(1));
        for text in ["", "   ", "\n\t "] {
            assert_eq!(chat.send(text, &mut rt), SendOutcome::Empty);
        }
        assert!(rt.tickets.is_empty());
        assert!(chat.transcript().is_empty());
        assert_eq!(chat.revision(), 0);
    }

    #[test]
    fn second_send_while_pending_is_refused() {
        let mut rt = RecordingRuntime::new();
        let mut chat = ChatController::mount(MountId(1));
        assert_eq!(chat.send("first", &mut rt), SendOutcome::Dispatched);
        assert_eq!(chat.send("second", &mut rt), SendOutcome::Busy);
        assert_eq!(rt.tickets.len(), 1);
        assert_eq!(chat.transcript().len(), 1);
        assert!(chat.is_pending());
    }

    #[test]
    fn successful_send_appends_user_then_assistant() {
        let mut rt = RecordingRuntime::new();
        let mut chat = ChatController::mount(MountId(1));
        let before = chat.transcript().len();

        chat.send("ping", &mut rt);
        let ticket = rt.take().pop().unwrap();
        assert_eq!(
            ticket.request,
            Request::Chat {
                message: "ping".to_string()
            }
        );
        assert_eq!(complete(&mut chat, ticket.seq, Ok(reply("pong"))), Applied::Changed);

        let transcript = chat.transcript();
        assert_eq!(transcript.len(), before + 2);
        assert_eq!(transcript[0].role, Role::User);
        assert_eq!(transcript[0].content, "ping");
        assert_eq!(transcript[1].role, Role::Assistant);
        assert_eq!(transcript[1].content, "pong");
        assert_eq!(transcript[1].timestamp, "2025-01-31T12:00:00");
        assert_eq!(transcript[1].tool_results[0].tool, "search_web");
        assert!(!chat.is_pending());
    }

    #[test]
    fn failed_send_records_apology() {
        let mut rt = RecordingRuntime::new();
        let mut chat = ChatController::mount(MountId(1));
        chat.send("ping", &mut rt);
        let seq = rt.take()[0].seq;

        complete(&mut chat, seq, Err(RequestFailed::new("POST", "/chat", "HTTP 500")));

        let transcript = chat.transcript();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[0].content, "ping", "no rollback of the user turn");
        assert_eq!(transcript[1].role, Role::Assistant);
        assert_eq!(transcript[1].content, SEND_FAILURE_TEXT);
        assert!(transcript[1].tool_results.is_empty());
    }

    #[test]
    fn can_send_again_after_completion() {
        let mut rt = RecordingRuntime::new();
        let mut chat = ChatController::mount(MountId(1));
        chat.send("one", &mut rt);
        let seq = rt.take()[0].seq;
        complete(&mut chat, seq, Ok(reply("1")));

        assert_eq!(chat.send("two", &mut rt), SendOutcome::Dispatched);
        let seq = rt.take()[0].seq;
        complete(&mut chat, seq, Ok(reply("2")));

        let contents: Vec<&str> = chat.transcript().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["one", "1", "two", "2"]);
    }

    #[test]
    fn unexpected_completion_is_ignored() {
        let mut chat = ChatController::mount(MountId(1));
        assert_eq!(complete(&mut chat, 1, Ok(reply("ghost"))), Applied::Stale);
        assert!(chat.transcript().is_empty());
    }

    #[test]
    fn revision_and_anchor_follow_every_append() {
        let mut rt = RecordingRuntime::new();
        let mut chat = ChatController::mount(MountId(1));
        assert_eq!(chat.scroll_anchor(), None);

        chat.send("ping", &mut rt);
        assert_eq!(chat.revision(), 1);
        assert_eq!(chat.scroll_anchor(), Some(0));

        let seq = rt.take()[0].seq;
        complete(&mut chat, seq, Ok(reply("pong")));
        assert_eq!(chat.revision(), 2);
        assert_eq!(chat.scroll_anchor(), Some(1));

        let panel = chat.view_model();
        assert_eq!(panel.scroll_anchor, Some(1));
        assert_eq!(panel.messages[1].tools, vec!["search_web"]);
        assert_eq!(panel.messages[1].memories_used, Some(2));
    }
}
