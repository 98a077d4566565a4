//! Telegram MTProto adapter.
//!
//! Adapts `grammers-client` to the [`MessagingClient`] seam. The session
//! file must already be authorized; this binary never drives an interactive
//! login. Enabled with the `telegram` cargo feature.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use grammers_client::grammers_tl_types as tl;
use grammers_client::session::Session;
use grammers_client::types::Chat;
use grammers_client::{Client, Config, InitParams};

use super::{ClientError, MessageStream, MessagingClient, Result};
use crate::domain::{Conversation, MessageId, RawMessage, ReadState};

/// Messaging client backed by a Telegram user session.
pub struct TelegramClient {
    client: Client,
    // Resolved chats, kept so later history/read-state calls can reuse the
    // access hash obtained during resolution.
    chats: Mutex<HashMap<i64, Chat>>,
}

impl TelegramClient {
    /// Connects using an existing session file.
    pub async fn connect(
        session_file: impl AsRef<Path>,
        api_id: i32,
        api_hash: &str,
    ) -> Result<Self> {
        let session = Session::load_file_or_create(session_file)
            .map_err(|e| ClientError::Other(format!("session file: {}", e)))?;
        let client = Client::connect(Config {
            session,
            api_id,
            api_hash: api_hash.to_string(),
            params: InitParams::default(),
        })
        .await
        .map_err(|e| ClientError::Connection(e.to_string()))?;

        if !client
            .is_authorized()
            .await
            .map_err(|e| ClientError::Connection(e.to_string()))?
        {
            return Err(ClientError::Other(
                "session is not authorized; log in interactively first".to_string(),
            ));
        }

        Ok(Self {
            client,
            chats: Mutex::new(HashMap::new()),
        })
    }

    fn cached_chat(&self, id: i64) -> Option<Chat> {
        self.chats.lock().expect("chat cache poisoned").get(&id).cloned()
    }
}

#[async_trait]
impl MessagingClient for TelegramClient {
    async fn resolve(&self, target: &str) -> Result<Conversation> {
        let username = target
            .trim_start_matches("https://t.me/")
            .trim_start_matches("t.me/")
            .trim_start_matches('@');

        let chat = match self.client.resolve_username(username).await {
            Ok(Some(chat)) => chat,
            Ok(None) => return Err(ClientError::TargetNotFound(target.to_string())),
            Err(e) => {
                let msg = e.to_string();
                if msg.contains("USERNAME_INVALID") || msg.contains("USERNAME_NOT_OCCUPIED") {
                    return Err(ClientError::TargetNotFound(target.to_string()));
                }
                return Err(ClientError::Connection(msg));
            }
        };

        let title = Some(chat.name().to_string()).filter(|name| !name.is_empty());
        let conversation = Conversation {
            id: chat.id(),
            title,
        };
        self.chats
            .lock()
            .expect("chat cache poisoned")
            .insert(chat.id(), chat);
        Ok(conversation)
    }

    async fn read_state(&self, conversation: &Conversation) -> Result<ReadState> {
        let mut dialogs = self.client.iter_dialogs();
        while let Some(dialog) = dialogs
            .next()
            .await
            .map_err(|e| ClientError::Connection(e.to_string()))?
        {
            if dialog.chat().id() != conversation.id {
                continue;
            }
            if let tl::enums::Dialog::Dialog(raw) = &dialog.dialog {
                return Ok(ReadState {
                    unread_count: Some(raw.unread_count.max(0) as u32),
                    read_up_to_id: raw.read_inbox_max_id as MessageId,
                });
            }
        }
        // No dialog entry yet (never opened); nothing is read.
        Ok(ReadState::default())
    }

    fn iter_history(&self, conversation: &Conversation, scan_cap: usize) -> MessageStream<'_> {
        let chat = match self.cached_chat(conversation.id) {
            Some(chat) => chat,
            None => {
                let id = conversation.id;
                return stream::once(async move {
                    Err(ClientError::Other(format!(
                        "conversation {} was not resolved by this client",
                        id
                    )))
                })
                .boxed();
            }
        };

        let iter = self.client.iter_messages(chat).limit(scan_cap);
        stream::unfold(Some(iter), |state| async move {
            let mut iter = state?;
            match iter.next().await {
                Ok(Some(message)) => {
                    let raw = RawMessage {
                        id: message.id() as MessageId,
                        timestamp: message.date(),
                        sender: message
                            .sender()
                            .map(|sender| sender.name().to_string())
                            .filter(|name| !name.is_empty()),
                        text: message.text().to_string(),
                    };
                    Some((Ok(raw), Some(iter)))
                }
                Ok(None) => None,
                Err(e) => Some((Err(ClientError::Connection(e.to_string())), None)),
            }
        })
        .boxed()
    }

    async fn mark_read(&self, conversation: &Conversation, up_to_id: MessageId) -> Result<()> {
        let chat = self.cached_chat(conversation.id).ok_or_else(|| {
            ClientError::Other(format!(
                "conversation {} was not resolved by this client",
                conversation.id
            ))
        })?;

        let max_id = up_to_id as i32;
        match chat.pack().to_input_peer() {
            tl::enums::InputPeer::Channel(channel) => {
                self.client
                    .invoke(&tl::functions::channels::ReadHistory {
                        channel: tl::enums::InputChannel::Channel(tl::types::InputChannel {
                            channel_id: channel.channel_id,
                            access_hash: channel.access_hash,
                        }),
                        max_id,
                    })
                    .await
                    .map_err(|e| ClientError::Connection(e.to_string()))?;
            }
            peer => {
                self.client
                    .invoke(&tl::functions::messages::ReadHistory { peer, max_id })
                    .await
                    .map_err(|e| ClientError::Connection(e.to_string()))?;
            }
        }
        Ok(())
    }
}
