//! Run orchestration.
//!
//! Drives one digest run end to end: resolve each configured target, fetch
//! its read state when the run needs it, collect same-day messages,
//! optionally advance the remote read watermark, then aggregate everything
//! and hand the result to delivery. Targets are processed strictly
//! sequentially and every per-target failure is contained at the target
//! boundary.

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, FixedOffset, Utc};
use tracing::{debug, error, info, warn};

use crate::config::Settings;
use crate::domain::ReadState;
use crate::providers::messaging::{ClientError, MessagingClient};
use crate::services::aggregator::DigestBuilder;
use crate::services::collector::{collect, day_start, CollectOptions, HISTORY_SCAN_CAP};
use crate::services::delivery::DeliveryService;

/// How a run ended. Only startup problems are surfaced as errors; every
/// outcome here exits the process cleanly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// A digest was assembled and the email went out.
    Delivered {
        /// Number of conversation blocks in the digest.
        conversations: usize,
        /// Total collected message lines.
        messages: usize,
    },
    /// Every target came up empty; delivery was skipped.
    NothingToDeliver,
    /// A digest was assembled but all delivery attempts failed.
    DeliveryFailed,
}

/// One-shot digest run over a messaging client and a delivery chain.
pub struct DigestService {
    client: Arc<dyn MessagingClient>,
    delivery: DeliveryService,
}

impl DigestService {
    /// Creates the service.
    pub fn new(client: Arc<dyn MessagingClient>, delivery: DeliveryService) -> Self {
        Self { client, delivery }
    }

    /// Executes a full run against the given settings.
    pub async fn run(&self, settings: &Settings) -> Result<RunOutcome> {
        let timezone = settings.display_offset()?;
        let day_boundary = day_start(Utc::now(), timezone);

        info!("collecting messages");
        let mut builder = DigestBuilder::new();
        for target in &settings.channels {
            match self
                .process_target(target, settings, day_boundary, timezone, &mut builder)
                .await
            {
                Ok(()) => {}
                Err(ClientError::TargetNotFound(_)) => {
                    warn!("channel not found: {}", target);
                }
                Err(e) => {
                    error!("failed to process {}: {}", target, e);
                }
            }
        }

        let Some(digest) = builder.finish(settings.ai_instructions.joined(), Utc::now()) else {
            info!("no new messages today");
            return Ok(RunOutcome::NothingToDeliver);
        };

        let conversations = digest.blocks.len();
        let messages = digest.message_count();
        match self.delivery.deliver(&digest).await {
            Ok(()) => {
                info!(
                    "digest sent: {} conversations, {} messages",
                    conversations, messages
                );
                Ok(RunOutcome::Delivered {
                    conversations,
                    messages,
                })
            }
            Err(e) => {
                error!("mail delivery failed: {}", e);
                warn!("hint: mobile networks often block SMTP ports 587/465, try another network");
                Ok(RunOutcome::DeliveryFailed)
            }
        }
    }

    /// Processes a single target. Any returned error is isolated by the
    /// caller; sibling targets are unaffected.
    async fn process_target(
        &self,
        target: &str,
        settings: &Settings,
        day_boundary: DateTime<Utc>,
        timezone: FixedOffset,
        builder: &mut DigestBuilder,
    ) -> crate::providers::messaging::Result<()> {
        let conversation = self.client.resolve(target).await?;
        let title = conversation.display_title(target);
        info!("scanning {}", title);

        // Read state is advisory; a fetch failure degrades to the default
        // instead of failing the target.
        let read_state = if settings.wants_read_state() {
            match self.client.read_state(&conversation).await {
                Ok(state) => state,
                Err(e) => {
                    debug!("read state unavailable for {}: {}", title, e);
                    ReadState::default()
                }
            }
        } else {
            ReadState::default()
        };

        let options = CollectOptions {
            scan_cap: HISTORY_SCAN_CAP,
            keep_limit: settings.message_limit_per_channel,
            day_boundary,
            timezone,
            only_unread: settings.only_unread,
            read_up_to_id: read_state.read_up_to_id,
        };
        let stream = self.client.iter_history(&conversation, HISTORY_SCAN_CAP);
        let collected = collect(stream, &options).await;

        let unread_count = if settings.show_unread_count {
            read_state.unread_count
        } else {
            None
        };
        builder.push(title.clone(), unread_count, collected.lines);

        // The watermark only advances when iteration finished cleanly; a
        // partially-scanned conversation keeps its remote unread state.
        if settings.mark_as_read_after_fetch && collected.complete {
            if let Some(high_water_id) = collected.high_water_id {
                match self.client.mark_read(&conversation, high_water_id).await {
                    Ok(()) => info!("marked {} read up to id {}", title, high_water_id),
                    Err(e) => warn!("failed to mark {} read: {}", title, e),
                }
            }
        }

        Ok(())
    }
}
