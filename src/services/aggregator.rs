//! Digest aggregation across conversations.
//!
//! Collects per-conversation blocks in target-configuration order and turns
//! them into a single [`Digest`]. Conversations that yielded nothing produce
//! no block, and a run where every conversation came up empty produces no
//! digest at all.

use chrono::{DateTime, Utc};

use crate::domain::{ConversationBlock, Digest};

/// Accumulates conversation blocks for one run.
#[derive(Debug, Default)]
pub struct DigestBuilder {
    blocks: Vec<ConversationBlock>,
}

impl DigestBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a block for a conversation.
    ///
    /// An empty line set is skipped entirely, preserving the invariant that
    /// a block's lines are never empty.
    pub fn push(&mut self, title: String, unread_count: Option<u32>, lines: Vec<String>) {
        if lines.is_empty() {
            return;
        }
        self.blocks.push(ConversationBlock {
            title,
            unread_count,
            lines,
        });
    }

    /// Whether no conversation has produced a block yet.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Finishes the run, producing a digest.
    ///
    /// Returns `None` when nothing was collected; the caller must skip
    /// delivery in that case.
    pub fn finish(self, instructions: String, generated_at: DateTime<Utc>) -> Option<Digest> {
        if self.blocks.is_empty() {
            return None;
        }
        Some(Digest {
            instructions,
            generated_at,
            blocks: self.blocks,
        })
    }
}
