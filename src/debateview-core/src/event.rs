//! Wire-level event model for the turn stream.
//!
//! The server delivers each turn as a sequence of JSON payloads over SSE.
//! Ordering is significant and events are immutable once received.

use serde::{Deserialize, Serialize};

/// Speaker role in the debate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Moderator,
    Proponent,
    Opponent,
}

impl Role {
    pub fn display_name(&self) -> &'static str {
        match self {
            Role::Moderator => "Moderator",
            Role::Proponent => "Proponent",
            Role::Opponent => "Opponent",
        }
    }

    /// Parse a transcript label back into a role. Accepts both the display
    /// name and the wire name, case-insensitively.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "moderator" => Some(Role::Moderator),
            "proponent" => Some(Role::Proponent),
            "opponent" => Some(Role::Opponent),
            _ => None,
        }
    }
}

/// A single event received on a turn stream.
///
/// `turn_end` carries the server's raw speaker label (e.g. `debater_A`)
/// rather than a mapped [`Role`]; it is informational only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    Token { role: Role, content: String },
    TurnEnd { role: String },
    StreamEnd,
    End,
    Error { content: String },
}

impl StreamEvent {
    /// Terminal events end the current turn's stream; the connection must
    /// be closed after one is received.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StreamEvent::StreamEnd | StreamEvent::End | StreamEvent::Error { .. }
        )
    }
}
