//! Messaging-platform client seam.
//!
//! The collection pipeline only ever sees the [`MessagingClient`] trait;
//! the concrete Telegram adapter lives behind the `telegram` feature.

mod traits;

#[cfg(feature = "telegram")]
mod telegram;

pub use traits::{ClientError, MessageStream, MessagingClient, Result};

#[cfg(feature = "telegram")]
pub use telegram::TelegramClient;
