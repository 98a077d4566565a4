//! Digest rendering and email delivery.
//!
//! Renders the digest into a plain-text email and submits it over an
//! ordered list of transport strategies. The first strategy that succeeds
//! wins; a connection-class failure of a non-final strategy falls through to
//! the next one, while credential and send failures abort immediately.

use chrono::FixedOffset;
use tracing::{info, warn};

use crate::domain::Digest;
use crate::providers::mail::{EmailPayload, MailError, MailTransport};

/// Renders digests and drives the transport fallback chain.
pub struct DeliveryService {
    transports: Vec<Box<dyn MailTransport>>,
    from: String,
    to: String,
    subject_prefix: String,
    timezone: FixedOffset,
}

impl DeliveryService {
    /// Creates a delivery service over an ordered list of transports.
    pub fn new(
        transports: Vec<Box<dyn MailTransport>>,
        from: impl Into<String>,
        to: impl Into<String>,
        subject_prefix: impl Into<String>,
        timezone: FixedOffset,
    ) -> Self {
        Self {
            transports,
            from: from.into(),
            to: to.into(),
            subject_prefix: subject_prefix.into(),
            timezone,
        }
    }

    /// Renders a digest into an outbound email.
    ///
    /// The body starts with the instruction banner and the generation
    /// date/time, followed by the conversation blocks separated by blank
    /// lines. The subject is `{prefix} [{DD.MM.YYYY HH:MM}]`.
    pub fn render(&self, digest: &Digest) -> EmailPayload {
        let local = digest.generated_at.with_timezone(&self.timezone);
        let date = local.format("%d.%m.%Y");
        let time = local.format("%H:%M");

        let preamble = format!(
            "\n\n--- AI INSTRUCTIONS ---\n{}\n\n-----------------------------------\n\n--- DATA START ({} - {}) ---\n",
            digest.instructions, date, time
        );
        let blocks = digest
            .blocks
            .iter()
            .map(|block| block.render())
            .collect::<Vec<_>>()
            .join("\n\n");

        EmailPayload {
            from: self.from.clone(),
            to: self.to.clone(),
            subject: format!("{} [{} {}]", self.subject_prefix, date, time),
            body: preamble + &blocks,
        }
    }

    /// Delivers the digest, falling back across transports on connection
    /// failures. Exactly one email is sent on success.
    pub async fn deliver(&self, digest: &Digest) -> Result<(), MailError> {
        let email = self.render(digest);
        let last = self.transports.len().saturating_sub(1);

        for (index, transport) in self.transports.iter().enumerate() {
            info!("sending digest via {}", transport.describe());
            match transport.submit(&email).await {
                Ok(()) => {
                    info!("digest sent to {}", email.to);
                    return Ok(());
                }
                Err(e) if e.is_connect() && index < last => {
                    warn!("{} unreachable ({}), trying fallback", transport.describe(), e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(MailError::Connect("no mail transport configured".to_string()))
    }
}
