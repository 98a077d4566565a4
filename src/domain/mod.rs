//! Domain layer types for tg-digest.
//!
//! This module contains the core types that flow through the collection
//! pipeline: conversations, raw messages, per-dialog read state, and the
//! assembled digest itself.

mod digest;
mod message;

pub use digest::{ConversationBlock, Digest};
pub use message::{Conversation, MessageId, RawMessage, ReadState};
