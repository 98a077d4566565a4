//! Account credentials loaded from the environment.

use thiserror::Error;

/// Errors that can occur while loading credentials.
#[derive(Debug, Error)]
pub enum CredentialsError {
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("{0} must be an integer: {1}")]
    InvalidApiId(&'static str, String),
}

/// Telegram API and mail account credentials.
///
/// Every field except the recipient is required; a missing variable aborts
/// startup before any network activity.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Telegram API id.
    pub api_id: i32,
    /// Telegram API hash.
    pub api_hash: String,
    /// Mail account address, used both for authentication and as sender.
    pub mail_user: String,
    /// Mail account password (app password for Gmail).
    pub mail_pass: String,
    /// Digest recipient; defaults to the mail account itself.
    pub recipient: String,
}

impl Credentials {
    /// Loads credentials from `TG_API_ID`, `TG_API_HASH`, `GMAIL_USER`,
    /// `GMAIL_PASS` and the optional `TO_EMAIL`.
    pub fn from_env() -> Result<Self, CredentialsError> {
        let api_id_raw = require("TG_API_ID")?;
        let api_id = api_id_raw
            .parse::<i32>()
            .map_err(|_| CredentialsError::InvalidApiId("TG_API_ID", api_id_raw.clone()))?;
        let api_hash = require("TG_API_HASH")?;
        let mail_user = require("GMAIL_USER")?;
        let mail_pass = require("GMAIL_PASS")?;
        let recipient = std::env::var("TO_EMAIL")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| mail_user.clone());

        Ok(Self {
            api_id,
            api_hash,
            mail_user,
            mail_pass,
            recipient,
        })
    }
}

fn require(name: &'static str) -> Result<String, CredentialsError> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(CredentialsError::Missing(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Environment-variable tests mutate process state, so they run the whole
    // scenario in one test to avoid interference under parallel execution.
    #[test]
    fn from_env_round_trip() {
        let vars = [
            ("TG_API_ID", "12345"),
            ("TG_API_HASH", "abcdef"),
            ("GMAIL_USER", "me@example.com"),
            ("GMAIL_PASS", "hunter2"),
        ];
        for (name, value) in vars {
            std::env::set_var(name, value);
        }
        std::env::remove_var("TO_EMAIL");

        let creds = Credentials::from_env().unwrap();
        assert_eq!(creds.api_id, 12345);
        assert_eq!(creds.api_hash, "abcdef");
        assert_eq!(creds.mail_user, "me@example.com");
        // Recipient falls back to the account address.
        assert_eq!(creds.recipient, "me@example.com");

        std::env::set_var("TO_EMAIL", "inbox@example.com");
        let creds = Credentials::from_env().unwrap();
        assert_eq!(creds.recipient, "inbox@example.com");

        std::env::set_var("TG_API_ID", "not-a-number");
        assert!(matches!(
            Credentials::from_env(),
            Err(CredentialsError::InvalidApiId("TG_API_ID", _))
        ));

        std::env::remove_var("TG_API_ID");
        assert!(matches!(
            Credentials::from_env(),
            Err(CredentialsError::Missing("TG_API_ID"))
        ));

        for (name, _) in vars {
            std::env::remove_var(name);
        }
        std::env::remove_var("TO_EMAIL");
    }
}
