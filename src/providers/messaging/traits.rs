//! Messaging client trait definition.
//!
//! This module defines the [`MessagingClient`] trait which abstracts over the
//! messaging platform backend. The orchestrator and collector depend only on
//! this seam, which keeps the whole pipeline testable with in-memory fakes.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::domain::{Conversation, MessageId, RawMessage, ReadState};

/// Result type alias for messaging client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Lazy newest-first history stream for one conversation.
///
/// Items may fail individually; the collector treats a failed item as the
/// end of that conversation's history, keeping what was already collected.
pub type MessageStream<'a> = BoxStream<'a, Result<RawMessage>>;

/// Errors that can occur during messaging client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The configured target could not be resolved to a conversation.
    #[error("target not found: {0}")]
    TargetNotFound(String),

    /// Network or connection error.
    #[error("connection error: {0}")]
    Connection(String),

    /// The service returned something the adapter could not decode.
    #[error("decode error: {0}")]
    Decode(String),

    /// Any other backend failure.
    #[error("client error: {0}")]
    Other(String),
}

/// Capability set consumed from the messaging platform.
#[async_trait]
pub trait MessagingClient: Send + Sync {
    /// Resolves a configured target identifier to a live conversation.
    ///
    /// Returns [`ClientError::TargetNotFound`] when the identifier does not
    /// name a reachable conversation.
    async fn resolve(&self, target: &str) -> Result<Conversation>;

    /// Fetches the unread count and read watermark for a conversation.
    async fn read_state(&self, conversation: &Conversation) -> Result<ReadState>;

    /// Iterates a conversation's history from newest to oldest, yielding at
    /// most `scan_cap` raw messages.
    fn iter_history(&self, conversation: &Conversation, scan_cap: usize) -> MessageStream<'_>;

    /// Advances the remote read watermark up to and including `up_to_id`.
    async fn mark_read(&self, conversation: &Conversation, up_to_id: MessageId) -> Result<()>;
}
