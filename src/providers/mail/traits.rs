//! Mail transport trait definition.

use async_trait::async_trait;

/// A rendered outbound email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailPayload {
    /// Sender address.
    pub from: String,
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub body: String,
}

/// Errors that can occur during mail submission.
///
/// The classification drives the fallback decision: only connection-class
/// failures of a non-final transport trigger the next strategy.
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    /// Could not reach the server (refused, unreachable, timeout, TLS setup).
    #[error("connection error: {0}")]
    Connect(String),

    /// The server rejected our credentials.
    #[error("authentication failed: {0}")]
    Credentials(String),

    /// The server rejected the submission itself.
    #[error("send failed: {0}")]
    Send(String),

    /// The message could not be constructed (bad address, oversized body).
    #[error("message build failed: {0}")]
    Build(String),
}

impl MailError {
    /// Whether this failure happened before the server ever answered,
    /// making a fallback transport worth trying.
    pub fn is_connect(&self) -> bool {
        matches!(self, Self::Connect(_))
    }
}

/// A single mail submission strategy.
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Human-readable transport description for log lines.
    fn describe(&self) -> String;

    /// Connects, authenticates and submits the email in one shot.
    async fn submit(&self, email: &EmailPayload) -> Result<(), MailError>;
}
