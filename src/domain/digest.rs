//! The assembled digest and its per-conversation building blocks.

use chrono::{DateTime, Utc};

/// Collected lines for one conversation, ready for rendering.
///
/// Invariant: `lines` is never empty. Conversations that yielded no
/// messages produce no block at all (see the aggregator).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationBlock {
    /// Conversation display title.
    pub title: String,
    /// Unread count shown in the header, when it was resolved.
    pub unread_count: Option<u32>,
    /// Formatted message lines, oldest first.
    pub lines: Vec<String>,
}

impl ConversationBlock {
    /// Renders the block: a header line followed by the message lines
    /// separated by blank lines.
    pub fn render(&self) -> String {
        let mut header = format!("=== Start of channel: {} ===", self.title);
        if let Some(count) = self.unread_count {
            header.push_str(&format!(" (unread in dialog: {})", count));
        }
        header.push('\n');
        header + &self.lines.join("\n\n")
    }
}

/// The aggregated multi-conversation report for one run.
///
/// Invariant: `blocks` is never empty. A run that collected nothing yields
/// no `Digest` and skips delivery entirely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest {
    /// Instruction preamble placed before the collected data.
    pub instructions: String,
    /// When the digest was generated.
    pub generated_at: DateTime<Utc>,
    /// Per-conversation blocks in target-configuration order.
    pub blocks: Vec<ConversationBlock>,
}

impl Digest {
    /// Total number of collected message lines across all blocks.
    pub fn message_count(&self) -> usize {
        self.blocks.iter().map(|b| b.lines.len()).sum()
    }
}
