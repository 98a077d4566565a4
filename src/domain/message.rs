//! Conversation and message types produced by the messaging seam.

use chrono::{DateTime, Utc};

/// Message identifier within a conversation.
///
/// Identifiers are assigned by the messaging service and increase
/// monotonically per conversation, so a larger id always means a newer
/// message.
pub type MessageId = i64;

/// A resolved conversation handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    /// Service-side identifier used for follow-up calls.
    pub id: i64,
    /// Display title, when the service provides one.
    pub title: Option<String>,
}

impl Conversation {
    /// Returns the display title, falling back to the raw target string
    /// the conversation was resolved from.
    pub fn display_title(&self, target: &str) -> String {
        match &self.title {
            Some(title) if !title.is_empty() => title.clone(),
            _ => target.to_string(),
        }
    }
}

/// Unread-state snapshot for one conversation.
///
/// Advisory data: when it cannot be fetched the pipeline proceeds with
/// [`ReadState::default`], which filters nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadState {
    /// Number of unread messages, if known.
    pub unread_count: Option<u32>,
    /// Messages with `id > read_up_to_id` are considered unread.
    pub read_up_to_id: MessageId,
}

impl Default for ReadState {
    fn default() -> Self {
        Self {
            unread_count: None,
            read_up_to_id: 0,
        }
    }
}

/// A single history entry as yielded by the messaging client.
///
/// The text may be empty (service messages, media without captions); the
/// collector filters those out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    /// Per-conversation message id.
    pub id: MessageId,
    /// When the message was sent.
    pub timestamp: DateTime<Utc>,
    /// Sender display name, when one is available.
    pub sender: Option<String>,
    /// Message text, possibly empty.
    pub text: String,
}
