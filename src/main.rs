//! tg-digest - Entry point for the digest generator.

use std::sync::Arc;

use tg_digest::config::{Credentials, Settings};
use tg_digest::providers::mail::{MailTransport, SmtpMailer};
use tg_digest::providers::messaging::MessagingClient;
use tg_digest::services::{DeliveryService, DigestService, RunOutcome};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting tg-digest");

    // Startup-configuration failures exit non-zero; anything past startup
    // is logged and exits cleanly.
    if let Err(e) = run().await {
        tracing::error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.json".to_string());
    let settings = Settings::load(&config_path)?;
    let credentials = Credentials::from_env()?;
    let timezone = settings.display_offset()?;

    let transports: Vec<Box<dyn MailTransport>> = vec![
        Box::new(SmtpMailer::starttls(
            &settings.smtp_host,
            &credentials.mail_user,
            &credentials.mail_pass,
        )),
        Box::new(SmtpMailer::implicit_tls(
            &settings.smtp_host,
            &credentials.mail_user,
            &credentials.mail_pass,
        )),
    ];
    let delivery = DeliveryService::new(
        transports,
        credentials.mail_user.clone(),
        credentials.recipient.clone(),
        settings.email_subject_prefix.clone(),
        timezone,
    );

    let client = connect_client(&credentials).await?;
    let service = DigestService::new(client, delivery);

    match service.run(&settings).await? {
        RunOutcome::Delivered { .. } => tracing::info!("run finished"),
        RunOutcome::NothingToDeliver => tracing::info!("run finished with nothing to deliver"),
        RunOutcome::DeliveryFailed => tracing::warn!("run finished without delivering"),
    }
    Ok(())
}

#[cfg(feature = "telegram")]
async fn connect_client(credentials: &Credentials) -> anyhow::Result<Arc<dyn MessagingClient>> {
    use tg_digest::providers::messaging::TelegramClient;

    let client = TelegramClient::connect(
        "tg-digest.session",
        credentials.api_id,
        &credentials.api_hash,
    )
    .await?;
    Ok(Arc::new(client))
}

#[cfg(not(feature = "telegram"))]
async fn connect_client(_credentials: &Credentials) -> anyhow::Result<Arc<dyn MessagingClient>> {
    anyhow::bail!("this build has no messaging backend; rebuild with `--features telegram`")
}
