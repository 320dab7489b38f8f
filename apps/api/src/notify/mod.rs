//! Notification Sender: templated email over an SMTP relay.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use thiserror::Error;
use tracing::{debug, warn};

pub mod templates;

use crate::config::MailConfig;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail transport is not configured")]
    Unavailable,

    #[error("invalid address '{0}'")]
    Address(String),

    #[error("failed to build message: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("mail task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub to_name: Option<String>,
    pub subject: String,
    pub html_body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError>;
}

/// SMTP relay mailer. `lettre`'s transport is blocking, so each send runs on
/// the blocking pool.
pub struct SmtpMailer {
    transport: SmtpTransport,
    from: String,
}

impl SmtpMailer {
    pub fn new(config: &MailConfig) -> Result<Self, MailError> {
        let creds = Credentials::new(config.smtp_username.clone(), config.smtp_password.clone());
        let transport = SmtpTransport::relay(&config.smtp_host)?
            .credentials(creds)
            .build();
        Ok(Self {
            transport,
            from: config.from_address.clone(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError> {
        let mailbox = match &email.to_name {
            Some(name) => format!("{} <{}>", name, email.to),
            None => email.to.clone(),
        };
        let message = Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|_| MailError::Address(self.from.clone()))?,
            )
            .to(mailbox
                .parse()
                .map_err(|_| MailError::Address(email.to.clone()))?)
            .subject(email.subject.clone())
            .header(ContentType::TEXT_HTML)
            .body(email.html_body)?;

        let transport = self.transport.clone();
        debug!("Sending email to {}", email.to);
        tokio::task::spawn_blocking(move || transport.send(&message)).await??;
        Ok(())
    }
}

/// Sends one email, logging instead of failing. Returns whether it was sent.
pub async fn send_logged(mailer: Option<&dyn Mailer>, email: OutgoingEmail) -> bool {
    let Some(mailer) = mailer else {
        debug!(to = %email.to, "{}; email skipped", MailError::Unavailable);
        return false;
    };
    let to = email.to.clone();
    match mailer.send(email).await {
        Ok(()) => {
            debug!(to = %to, "Email sent");
            true
        }
        Err(e) => {
            warn!(to = %to, "Could not send email: {e}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::RecordingMailer;

    fn email() -> OutgoingEmail {
        OutgoingEmail {
            to: "jane@example.com".to_string(),
            to_name: Some("Jane".to_string()),
            subject: "Hello".to_string(),
            html_body: "<p>Hi</p>".to_string(),
        }
    }

    #[tokio::test]
    async fn test_send_logged_without_mailer_is_skipped() {
        assert!(!send_logged(None, email()).await);
    }

    #[tokio::test]
    async fn test_send_logged_records_delivery() {
        let mailer = RecordingMailer::default();
        assert!(send_logged(Some(&mailer), email()).await);
        assert_eq!(mailer.sent().await, vec![email()]);
    }

    #[tokio::test]
    async fn test_send_logged_swallows_failure() {
        let mailer = RecordingMailer::failing();
        assert!(!send_logged(Some(&mailer), email()).await);
    }
}
