//! Run settings loaded from the JSON config file.

use std::path::Path;

use chrono::{FixedOffset, Local, Offset};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while loading settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("config file not found: {0}")]
    NotFound(String),

    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid utc_offset_minutes: {0}")]
    InvalidOffset(i32),
}

/// Instruction text for the digest preamble.
///
/// The config file may supply either a single string or a list of lines;
/// a list is joined with newlines.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Instructions {
    /// A single preformatted string.
    Text(String),
    /// Lines to be joined with `\n`.
    Lines(Vec<String>),
}

impl Default for Instructions {
    fn default() -> Self {
        Self::Lines(Vec::new())
    }
}

impl Instructions {
    /// Returns the instruction text as a single string.
    pub fn joined(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Lines(lines) => lines.join("\n"),
        }
    }
}

/// Top-level run configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Conversation identifiers to scan, in delivery order.
    pub channels: Vec<String>,
    /// Maximum messages kept per conversation.
    pub message_limit_per_channel: usize,
    /// Prefix for the email subject line.
    pub email_subject_prefix: String,
    /// Whether to fetch and display per-dialog unread counts.
    pub show_unread_count: bool,
    /// Whether to advance the remote read watermark after collection.
    pub mark_as_read_after_fetch: bool,
    /// Whether to keep only messages newer than the read watermark.
    pub only_unread: bool,
    /// Instruction preamble placed before the collected data.
    pub ai_instructions: Instructions,
    /// SMTP server hostname.
    pub smtp_host: String,
    /// UTC offset in minutes used for the day boundary and all rendered
    /// times. `None` means the host-local offset.
    pub utc_offset_minutes: Option<i32>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            channels: Vec::new(),
            message_limit_per_channel: 10,
            email_subject_prefix: "Telegram Digest".to_string(),
            show_unread_count: true,
            mark_as_read_after_fetch: false,
            only_unread: false,
            ai_instructions: Instructions::default(),
            smtp_host: "smtp.gmail.com".to_string(),
            utc_offset_minutes: None,
        }
    }
}

impl Settings {
    /// Loads settings from a JSON file.
    ///
    /// A missing file is a startup-fatal error; the caller is expected to
    /// exit non-zero without any network activity.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::NotFound(path.display().to_string()));
        }
        let raw = std::fs::read_to_string(path)?;
        let settings: Self = serde_json::from_str(&raw)?;
        settings.display_offset()?;
        Ok(settings)
    }

    /// Returns the timezone offset used for the day boundary and for
    /// rendering timestamps.
    pub fn display_offset(&self) -> Result<FixedOffset, SettingsError> {
        match self.utc_offset_minutes {
            Some(minutes) => FixedOffset::east_opt(minutes * 60)
                .ok_or(SettingsError::InvalidOffset(minutes)),
            None => Ok(Local::now().offset().fix()),
        }
    }

    /// Whether the run needs per-dialog read state at all.
    pub fn wants_read_state(&self) -> bool {
        self.show_unread_count || self.only_unread
    }
}
