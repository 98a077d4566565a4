//! Message collection for a single conversation.
//!
//! Walks a conversation's history newest-first, applies the inclusion rules
//! (same-day, text-bearing, optionally unread-only) and produces formatted
//! lines in chronological order plus the high-water id used to advance the
//! remote read watermark.

use chrono::{DateTime, Duration, FixedOffset, Utc};
use futures::StreamExt;
use tracing::warn;

use crate::domain::{MessageId, RawMessage};
use crate::providers::messaging::MessageStream;

/// Hard upper bound on raw history entries inspected per conversation,
/// independent of how many are kept.
pub const HISTORY_SCAN_CAP: usize = 50;

/// Filter and formatting parameters for one collection pass.
#[derive(Debug, Clone)]
pub struct CollectOptions {
    /// Maximum raw messages inspected.
    pub scan_cap: usize,
    /// Maximum messages kept.
    pub keep_limit: usize,
    /// Messages at or before this instant are excluded.
    pub day_boundary: DateTime<Utc>,
    /// Timezone used to render `[HH:MM]` prefixes.
    pub timezone: FixedOffset,
    /// When set, only messages newer than the read watermark are kept.
    pub only_unread: bool,
    /// Read watermark for unread-only filtering.
    pub read_up_to_id: MessageId,
}

/// Outcome of one collection pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collected {
    /// Formatted lines, oldest first.
    pub lines: Vec<String>,
    /// Largest included message id, if anything was included.
    pub high_water_id: Option<MessageId>,
    /// False when history iteration failed partway through. Whatever was
    /// collected before the failure is still in `lines`.
    pub complete: bool,
}

/// Returns the instant of local midnight in `offset`, expressed in UTC.
pub fn day_start(now: DateTime<Utc>, offset: FixedOffset) -> DateTime<Utc> {
    let midnight = now
        .with_timezone(&offset)
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .expect("midnight is a valid time");
    let utc_naive = midnight - Duration::seconds(i64::from(offset.local_minus_utc()));
    DateTime::from_naive_utc_and_offset(utc_naive, Utc)
}

/// Collects eligible messages from a newest-first history stream.
///
/// A message is kept when it has non-empty text, was sent strictly after the
/// day boundary, and (in unread-only mode) its id is above the read
/// watermark. The first kept message is the newest one and becomes the
/// high-water id. Collection stops at the keep limit or once `scan_cap` raw
/// messages have been inspected, whichever comes first.
pub async fn collect(mut stream: MessageStream<'_>, options: &CollectOptions) -> Collected {
    let mut lines = Vec::new();
    let mut high_water_id = None;
    let mut complete = true;
    let mut inspected = 0usize;

    while inspected < options.scan_cap {
        let message = match stream.next().await {
            Some(Ok(message)) => message,
            Some(Err(e)) => {
                warn!("history iteration failed: {}", e);
                complete = false;
                break;
            }
            None => break,
        };
        inspected += 1;

        if !includes(&message, options) {
            continue;
        }
        if high_water_id.is_none() {
            // Newest-first iteration: the first keeper has the largest id.
            high_water_id = Some(message.id);
        }
        lines.push(format_line(&message, options.timezone));
        if lines.len() >= options.keep_limit {
            break;
        }
    }

    lines.reverse();
    Collected {
        lines,
        high_water_id,
        complete,
    }
}

fn includes(message: &RawMessage, options: &CollectOptions) -> bool {
    if message.text.is_empty() || message.timestamp <= options.day_boundary {
        return false;
    }
    !options.only_unread || message.id > options.read_up_to_id
}

fn format_line(message: &RawMessage, timezone: FixedOffset) -> String {
    let time = message.timestamp.with_timezone(&timezone).format("%H:%M");
    let sender = message
        .sender
        .as_deref()
        .map(|name| format!("{}: ", name))
        .unwrap_or_default();
    format!("[{}] {}{}", time, sender, message.text)
}
