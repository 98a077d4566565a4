//! End-to-end tests for the digest pipeline.
//!
//! Drive [`DigestService`] over an in-memory messaging fake and scripted
//! mail transports. Collector, aggregator and delivery details are covered
//! by unit tests in their own modules; these tests verify the run-level
//! behavior: per-target isolation, the empty-digest short-circuit, read-state
//! handling and the transport fallback.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Timelike, Utc};
use futures::stream;
use pretty_assertions::assert_eq;

use tg_digest::config::Settings;
use tg_digest::domain::{Conversation, MessageId, RawMessage, ReadState};
use tg_digest::providers::mail::{EmailPayload, MailError, MailTransport};
use tg_digest::providers::messaging::{
    ClientError, MessageStream, MessagingClient, Result as ClientResult,
};
use tg_digest::services::{DeliveryService, DigestService, RunOutcome};

// ============================================================================
// Fakes
// ============================================================================

struct ChannelFixture {
    target: String,
    conversation: Conversation,
    read_state: Option<ReadState>,
    read_state_fails: bool,
    /// Newest first, matching the service's iteration order.
    messages: Vec<RawMessage>,
    /// Yield an error after this many messages, when set.
    fail_after: Option<usize>,
}

impl ChannelFixture {
    fn new(target: &str, id: i64, title: &str, messages: Vec<RawMessage>) -> Self {
        Self {
            target: target.to_string(),
            conversation: Conversation {
                id,
                title: Some(title.to_string()),
            },
            read_state: None,
            read_state_fails: false,
            messages,
            fail_after: None,
        }
    }
}

#[derive(Default)]
struct FakeClient {
    channels: Vec<ChannelFixture>,
    mark_read_calls: Mutex<Vec<(i64, MessageId)>>,
}

impl FakeClient {
    fn with_channels(channels: Vec<ChannelFixture>) -> Arc<Self> {
        Arc::new(Self {
            channels,
            mark_read_calls: Mutex::new(Vec::new()),
        })
    }

    fn fixture(&self, id: i64) -> Option<&ChannelFixture> {
        self.channels.iter().find(|c| c.conversation.id == id)
    }

    fn marked(&self) -> Vec<(i64, MessageId)> {
        self.mark_read_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessagingClient for FakeClient {
    async fn resolve(&self, target: &str) -> ClientResult<Conversation> {
        self.channels
            .iter()
            .find(|c| c.target == target)
            .map(|c| c.conversation.clone())
            .ok_or_else(|| ClientError::TargetNotFound(target.to_string()))
    }

    async fn read_state(&self, conversation: &Conversation) -> ClientResult<ReadState> {
        let fixture = self
            .fixture(conversation.id)
            .ok_or_else(|| ClientError::Other("unknown conversation".to_string()))?;
        if fixture.read_state_fails {
            return Err(ClientError::Connection("timeout".to_string()));
        }
        Ok(fixture.read_state.clone().unwrap_or_default())
    }

    fn iter_history(&self, conversation: &Conversation, _scan_cap: usize) -> MessageStream<'_> {
        let items: Vec<ClientResult<RawMessage>> = match self.fixture(conversation.id) {
            Some(fixture) => {
                let cut = fixture.fail_after.unwrap_or(fixture.messages.len());
                let mut items: Vec<ClientResult<RawMessage>> = fixture
                    .messages
                    .iter()
                    .take(cut)
                    .cloned()
                    .map(Ok)
                    .collect();
                if fixture.fail_after.is_some() {
                    items.push(Err(ClientError::Connection("history failed".to_string())));
                }
                items
            }
            None => vec![Err(ClientError::Other("unknown conversation".to_string()))],
        };
        Box::pin(stream::iter(items))
    }

    async fn mark_read(&self, conversation: &Conversation, up_to_id: MessageId) -> ClientResult<()> {
        self.mark_read_calls
            .lock()
            .unwrap()
            .push((conversation.id, up_to_id));
        Ok(())
    }
}

#[derive(Clone, Copy)]
enum Outcome {
    Accept,
    RefuseConnection,
    RejectCredentials,
}

struct ScriptedTransport {
    outcome: Outcome,
    submissions: Arc<AtomicUsize>,
    sent: Arc<Mutex<Vec<EmailPayload>>>,
}

impl ScriptedTransport {
    #[allow(clippy::type_complexity)]
    fn new(outcome: Outcome) -> (Box<dyn MailTransport>, Arc<AtomicUsize>, Arc<Mutex<Vec<EmailPayload>>>) {
        let submissions = Arc::new(AtomicUsize::new(0));
        let sent = Arc::new(Mutex::new(Vec::new()));
        let transport = Box::new(Self {
            outcome,
            submissions: submissions.clone(),
            sent: sent.clone(),
        });
        (transport, submissions, sent)
    }
}

#[async_trait]
impl MailTransport for ScriptedTransport {
    fn describe(&self) -> String {
        "scripted".to_string()
    }

    async fn submit(&self, email: &EmailPayload) -> Result<(), MailError> {
        self.submissions.fetch_add(1, Ordering::SeqCst);
        match self.outcome {
            Outcome::Accept => {
                self.sent.lock().unwrap().push(email.clone());
                Ok(())
            }
            Outcome::RefuseConnection => Err(MailError::Connect("refused".to_string())),
            Outcome::RejectCredentials => Err(MailError::Credentials("535".to_string())),
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn today(hour: u32, minute: u32) -> chrono::DateTime<Utc> {
    Utc::now()
        .with_hour(hour)
        .and_then(|t| t.with_minute(minute))
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap()
}

fn message(id: MessageId, hour: u32, minute: u32, text: &str) -> RawMessage {
    RawMessage {
        id,
        timestamp: today(hour, minute),
        sender: None,
        text: text.to_string(),
    }
}

fn settings(channels: &[&str]) -> Settings {
    Settings {
        channels: channels.iter().map(|s| s.to_string()).collect(),
        utc_offset_minutes: Some(0),
        ..Settings::default()
    }
}

fn service_with(
    client: Arc<FakeClient>,
    transports: Vec<Box<dyn MailTransport>>,
) -> DigestService {
    let delivery = DeliveryService::new(
        transports,
        "me@example.com",
        "inbox@example.com",
        "Telegram Digest",
        chrono::FixedOffset::east_opt(0).unwrap(),
    );
    DigestService::new(client, delivery)
}

// ============================================================================
// Run-level scenarios
// ============================================================================

#[tokio::test]
async fn empty_target_produces_no_block_and_full_target_is_delivered() {
    let client = FakeClient::with_channels(vec![
        ChannelFixture::new(
            "@busy",
            1,
            "Busy Channel",
            vec![
                message(13, 11, 0, "third"),
                message(12, 10, 0, "second"),
                message(11, 9, 0, "first"),
            ],
        ),
        ChannelFixture::new("@quiet", 2, "Quiet Channel", Vec::new()),
    ]);
    let (transport, _, sent) = ScriptedTransport::new(Outcome::Accept);
    let service = service_with(client, vec![transport]);

    let outcome = service.run(&settings(&["@busy", "@quiet"])).await.unwrap();

    assert_eq!(
        outcome,
        RunOutcome::Delivered {
            conversations: 1,
            messages: 3
        }
    );
    let sent = sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].body.contains("=== Start of channel: Busy Channel ==="));
    assert!(!sent[0].body.contains("Quiet Channel"));
    let date = Utc::now().format("%d.%m.%Y").to_string();
    assert!(sent[0].subject.contains(&date), "subject: {}", sent[0].subject);
}

#[tokio::test]
async fn all_targets_empty_skips_delivery() {
    let client = FakeClient::with_channels(vec![ChannelFixture::new(
        "@quiet",
        1,
        "Quiet Channel",
        Vec::new(),
    )]);
    let (transport, submissions, _) = ScriptedTransport::new(Outcome::Accept);
    let service = service_with(client, vec![transport]);

    let outcome = service.run(&settings(&["@quiet"])).await.unwrap();

    assert_eq!(outcome, RunOutcome::NothingToDeliver);
    assert_eq!(submissions.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unresolvable_target_does_not_abort_the_run() {
    let client = FakeClient::with_channels(vec![ChannelFixture::new(
        "@known",
        1,
        "Known",
        vec![message(5, 12, 0, "hello")],
    )]);
    let (transport, _, sent) = ScriptedTransport::new(Outcome::Accept);
    let service = service_with(client, vec![transport]);

    let outcome = service
        .run(&settings(&["@missing", "@known"]))
        .await
        .unwrap();

    assert_eq!(
        outcome,
        RunOutcome::Delivered {
            conversations: 1,
            messages: 1
        }
    );
    assert!(sent.lock().unwrap()[0].body.contains("Known"));
}

#[tokio::test]
async fn keep_limit_applies_per_conversation() {
    let client = FakeClient::with_channels(vec![ChannelFixture::new(
        "@busy",
        1,
        "Busy",
        vec![
            message(13, 11, 0, "newest"),
            message(12, 10, 0, "older"),
            message(11, 9, 0, "oldest"),
        ],
    )]);
    let (transport, _, sent) = ScriptedTransport::new(Outcome::Accept);
    let service = service_with(client, vec![transport]);

    let mut cfg = settings(&["@busy"]);
    cfg.message_limit_per_channel = 2;
    let outcome = service.run(&cfg).await.unwrap();

    assert_eq!(
        outcome,
        RunOutcome::Delivered {
            conversations: 1,
            messages: 2
        }
    );
    let body = sent.lock().unwrap()[0].body.clone();
    assert!(body.contains("newest"));
    assert!(body.contains("older"));
    assert!(!body.contains("oldest"));
}

#[tokio::test]
async fn unread_count_appears_in_header_and_watermark_filters() {
    let mut fixture = ChannelFixture::new(
        "@chan",
        1,
        "Chan",
        vec![
            message(30, 11, 0, "unread one"),
            message(20, 10, 0, "already read"),
        ],
    );
    fixture.read_state = Some(ReadState {
        unread_count: Some(1),
        read_up_to_id: 20,
    });
    let client = FakeClient::with_channels(vec![fixture]);
    let (transport, _, sent) = ScriptedTransport::new(Outcome::Accept);
    let service = service_with(client, vec![transport]);

    let mut cfg = settings(&["@chan"]);
    cfg.only_unread = true;
    let outcome = service.run(&cfg).await.unwrap();

    assert_eq!(
        outcome,
        RunOutcome::Delivered {
            conversations: 1,
            messages: 1
        }
    );
    let body = sent.lock().unwrap()[0].body.clone();
    assert!(body.contains("=== Start of channel: Chan === (unread in dialog: 1)"));
    assert!(body.contains("unread one"));
    assert!(!body.contains("already read"));
}

#[tokio::test]
async fn read_state_failure_degrades_to_default() {
    let mut fixture = ChannelFixture::new(
        "@chan",
        1,
        "Chan",
        vec![message(30, 11, 0, "kept anyway")],
    );
    fixture.read_state_fails = true;
    let client = FakeClient::with_channels(vec![fixture]);
    let (transport, _, sent) = ScriptedTransport::new(Outcome::Accept);
    let service = service_with(client, vec![transport]);

    // only_unread with the default watermark of 0 keeps everything.
    let mut cfg = settings(&["@chan"]);
    cfg.only_unread = true;
    let outcome = service.run(&cfg).await.unwrap();

    assert_eq!(
        outcome,
        RunOutcome::Delivered {
            conversations: 1,
            messages: 1
        }
    );
    let body = sent.lock().unwrap()[0].body.clone();
    // No unread suffix: the count could not be resolved.
    assert!(body.contains("=== Start of channel: Chan ===\n"));
    assert!(!body.contains("unread in dialog"));
}

#[tokio::test]
async fn mark_as_read_commits_high_water_id() {
    let client = FakeClient::with_channels(vec![ChannelFixture::new(
        "@chan",
        1,
        "Chan",
        vec![message(42, 11, 0, "newest"), message(41, 10, 0, "older")],
    )]);
    let (transport, _, _) = ScriptedTransport::new(Outcome::Accept);
    let service = service_with(client.clone(), vec![transport]);

    let mut cfg = settings(&["@chan"]);
    cfg.mark_as_read_after_fetch = true;
    service.run(&cfg).await.unwrap();

    assert_eq!(client.marked(), vec![(1, 42)]);
}

#[tokio::test]
async fn mark_as_read_skipped_when_iteration_fails_midway() {
    let mut fixture = ChannelFixture::new(
        "@chan",
        1,
        "Chan",
        vec![message(42, 11, 0, "collected"), message(41, 10, 0, "lost")],
    );
    fixture.fail_after = Some(1);
    let client = FakeClient::with_channels(vec![fixture]);
    let (transport, _, sent) = ScriptedTransport::new(Outcome::Accept);
    let service = service_with(client.clone(), vec![transport]);

    let mut cfg = settings(&["@chan"]);
    cfg.mark_as_read_after_fetch = true;
    let outcome = service.run(&cfg).await.unwrap();

    // Partial collection is still delivered, but the watermark stays put.
    assert_eq!(
        outcome,
        RunOutcome::Delivered {
            conversations: 1,
            messages: 1
        }
    );
    assert!(sent.lock().unwrap()[0].body.contains("collected"));
    assert_eq!(client.marked(), Vec::<(i64, MessageId)>::new());
}

#[tokio::test]
async fn connect_failure_falls_back_and_sends_once() {
    let client = FakeClient::with_channels(vec![ChannelFixture::new(
        "@chan",
        1,
        "Chan",
        vec![message(5, 12, 0, "hello")],
    )]);
    let (primary, primary_calls, _) = ScriptedTransport::new(Outcome::RefuseConnection);
    let (fallback, fallback_calls, sent) = ScriptedTransport::new(Outcome::Accept);
    let service = service_with(client, vec![primary, fallback]);

    let outcome = service.run(&settings(&["@chan"])).await.unwrap();

    assert_eq!(
        outcome,
        RunOutcome::Delivered {
            conversations: 1,
            messages: 1
        }
    );
    assert_eq!(primary_calls.load(Ordering::SeqCst), 1);
    assert_eq!(fallback_calls.load(Ordering::SeqCst), 1);
    assert_eq!(sent.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn credential_failure_ends_the_run_without_fallback() {
    let client = FakeClient::with_channels(vec![ChannelFixture::new(
        "@chan",
        1,
        "Chan",
        vec![message(5, 12, 0, "hello")],
    )]);
    let (primary, _, _) = ScriptedTransport::new(Outcome::RejectCredentials);
    let (fallback, fallback_calls, _) = ScriptedTransport::new(Outcome::Accept);
    let service = service_with(client, vec![primary, fallback]);

    let outcome = service.run(&settings(&["@chan"])).await.unwrap();

    assert_eq!(outcome, RunOutcome::DeliveryFailed);
    assert_eq!(fallback_calls.load(Ordering::SeqCst), 0);
}
