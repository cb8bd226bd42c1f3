//! Transcript assembly from streamed token fragments.
//!
//! Tokens arrive tagged with a speaker role; contiguous fragments for the
//! same role build up one message, and a role change opens the next one.

use serde::{Deserialize, Serialize};

use crate::event::Role;

/// A fully addressable message in the debate transcript.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

/// Result of applying one token: which message changed and whether it was
/// newly opened, so callers can re-render only that entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenUpdate {
    pub index: usize,
    pub started: bool,
}

/// Ordered sequence of messages, assembled incrementally.
#[derive(Debug, Default)]
pub struct Transcript {
    messages: Vec<Message>,
    /// Role of the message currently receiving fragments, if any.
    open_role: Option<Role>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one streamed token fragment.
    ///
    /// A new message is started if and only if `role` differs from the role
    /// of the most recently opened message. The open message survives turn
    /// boundaries: a speaker continuing across turns keeps appending.
    pub fn apply_token(&mut self, role: Role, fragment: &str) -> TokenUpdate {
        if self.open_role != Some(role) {
            self.open_role = Some(role);
            self.messages.push(Message {
                role,
                content: fragment.to_string(),
            });
            return TokenUpdate {
                index: self.messages.len() - 1,
                started: true,
            };
        }

        let index = self.messages.len() - 1;
        self.messages[index].content.push_str(fragment);
        TokenUpdate {
            index,
            started: false,
        }
    }

    /// Append a complete, closed message. Used by the transcript importer,
    /// which bypasses streaming entirely.
    pub fn append_message(&mut self, role: Role, content: impl Into<String>) {
        self.open_role = None;
        self.messages.push(Message {
            role,
            content: content.into(),
        });
    }

    /// Ordered read-only view of the assembled messages.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.open_role = None;
    }
}
