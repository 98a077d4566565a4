//! Mail transport seam.
//!
//! Delivery talks to an ordered list of [`MailTransport`] strategies; the
//! concrete SMTP implementation is built on `lettre`.

mod smtp;
mod traits;

pub use smtp::SmtpMailer;
pub use traits::{EmailPayload, MailError, MailTransport};
