//! SMTP mail transport implementation.
//!
//! Uses `lettre` for submission. Two factory methods cover the two standard
//! submission setups: STARTTLS on port 587 and implicit TLS on port 465.
//! A mailer connects, authenticates and submits per call; nothing is kept
//! open between runs.

use std::time::Duration;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials as SmtpCredentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use super::{EmailPayload, MailError, MailTransport};

/// Standard SMTP submission port (STARTTLS).
pub const SUBMISSION_PORT: u16 = 587;

/// SMTPS port (implicit TLS).
pub const SMTPS_PORT: u16 = 465;

/// Timeout per connection attempt.
const SUBMIT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TlsMode {
    StartTls,
    Implicit,
}

/// One SMTP submission strategy.
pub struct SmtpMailer {
    host: String,
    port: u16,
    mode: TlsMode,
    username: String,
    password: String,
}

impl SmtpMailer {
    /// STARTTLS submission on port 587.
    pub fn starttls(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: SUBMISSION_PORT,
            mode: TlsMode::StartTls,
            username: username.into(),
            password: password.into(),
        }
    }

    /// Implicit-TLS submission on port 465.
    pub fn implicit_tls(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: SMTPS_PORT,
            mode: TlsMode::Implicit,
            username: username.into(),
            password: password.into(),
        }
    }

    fn build_message(email: &EmailPayload) -> Result<Message, MailError> {
        let from: Mailbox = email
            .from
            .parse()
            .map_err(|e| MailError::Build(format!("from address: {}", e)))?;
        let to: Mailbox = email
            .to
            .parse()
            .map_err(|e| MailError::Build(format!("to address: {}", e)))?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(email.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(email.body.clone())
            .map_err(|e| MailError::Build(e.to_string()))
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    fn describe(&self) -> String {
        let mode = match self.mode {
            TlsMode::StartTls => "starttls",
            TlsMode::Implicit => "tls",
        };
        format!("{}:{} ({})", self.host, self.port, mode)
    }

    async fn submit(&self, email: &EmailPayload) -> Result<(), MailError> {
        let message = Self::build_message(email)?;

        let builder = match self.mode {
            TlsMode::StartTls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.host),
            TlsMode::Implicit => AsyncSmtpTransport::<Tokio1Executor>::relay(&self.host),
        }
        .map_err(|e| MailError::Connect(e.to_string()))?;

        let mailer = builder
            .port(self.port)
            .credentials(SmtpCredentials::new(
                self.username.clone(),
                self.password.clone(),
            ))
            .timeout(Some(SUBMIT_TIMEOUT))
            .build();

        match mailer.send(message).await {
            Ok(_) => Ok(()),
            Err(e) => {
                let status = e.status().map(|code| code.to_string());
                Err(classify(status, e.to_string()))
            }
        }
    }
}

/// Classifies a failed submission from the SMTP status code, if the server
/// got far enough to answer with one.
///
/// No status at all means the failure happened at the connection level
/// (refused, unreachable, timeout, TLS) and a fallback port may still work.
/// A `53x` reply is an authentication failure; any other reply is a send
/// rejection.
fn classify(status: Option<String>, detail: String) -> MailError {
    match status {
        None => MailError::Connect(detail),
        Some(code) if code.starts_with("53") => MailError::Credentials(detail),
        Some(_) => MailError::Send(detail),
    }
}
