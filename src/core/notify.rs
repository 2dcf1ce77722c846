//! Outbound email through an authenticated STARTTLS relay.

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::Serialize;
use tracing::{info, warn};

use crate::core::config::Config;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailResult {
    pub ok: bool,
    pub message: String,
}

impl EmailResult {
    pub fn sent(recipient: &str) -> Self {
        Self {
            ok: true,
            message: format!("Email sent to {recipient}"),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

/// Delivers one message and reports the outcome; never fails past its boundary.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> EmailResult;
}

#[derive(Clone)]
pub struct NotificationSender {
    smtp_host: String,
    smtp_port: u16,
    subject_prefix: String,
    username: String,
    password: String,
}

impl NotificationSender {
    pub fn from_config(
        config: &Config,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            smtp_host: config.smtp_host().to_string(),
            smtp_port: config.smtp_port(),
            subject_prefix: config.subject_prefix().to_string(),
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.username.trim().is_empty() && !self.password.trim().is_empty()
    }

    pub fn sender(&self) -> &str {
        &self.username
    }

    pub fn full_subject(&self, subject: &str) -> String {
        if self.subject_prefix.is_empty() {
            subject.to_string()
        } else {
            format!("{} {}", self.subject_prefix, subject)
        }
    }

    /// Validate addresses and assemble the plain-text message.
    pub fn build_message(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
    ) -> Result<Message, String> {
        let from: Mailbox = self
            .username
            .trim()
            .parse()
            .map_err(|e| format!("Invalid sender address: {e}"))?;
        let to: Mailbox = recipient
            .trim()
            .parse()
            .map_err(|e| format!("Invalid recipient address '{recipient}': {e}"))?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(self.full_subject(subject))
            .body(body.to_string())
            .map_err(|e| format!("Failed to build email: {e}"))
    }

    async fn deliver(&self, recipient: &str, subject: &str, body: &str) -> Result<(), String> {
        if !self.is_configured() {
            return Err("Mail credentials (GMAIL_USER / GMAIL_APP_PASSWORD) are not configured".to_string());
        }
        if recipient.trim().is_empty() {
            return Err("No recipient address available".to_string());
        }

        let email = self.build_message(recipient, subject, body)?;

        let creds = Credentials::new(self.username.trim().to_string(), self.password.clone());
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.smtp_host)
            .map_err(|e| format!("SMTP STARTTLS error: {e}"))?
            .port(self.smtp_port)
            .credentials(creds)
            .build();

        transport
            .send(email)
            .await
            .map_err(|e| format!("SMTP send error: {e}"))?;
        Ok(())
    }
}

#[async_trait]
impl Mailer for NotificationSender {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> EmailResult {
        match self.deliver(recipient, subject, body).await {
            Ok(()) => {
                info!(to = %recipient, host = %self.smtp_host, "email sent");
                EmailResult::sent(recipient)
            }
            Err(message) => {
                warn!(to = %recipient, error = %message, "email not sent");
                EmailResult::failed(message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::data::MailSection;

    fn sender(user: &str, password: &str) -> NotificationSender {
        let config = Config {
            mail: MailSection {
                smtp_host: Some("127.0.0.1".to_string()),
                smtp_port: Some(9),
                ..Default::default()
            },
            ..Default::default()
        };
        NotificationSender::from_config(&config, user, password)
    }

    #[test]
    fn subject_carries_fixed_prefix() {
        let sender = sender("bot@example.org", "pw");
        assert_eq!(sender.full_subject("Hello"), "[Neural Interface] Hello");
    }

    #[test]
    fn builds_plain_text_message_with_headers() {
        let message = sender("bot@example.org", "pw")
            .build_message("john@example.com", "Hello", "body text")
            .expect("message");
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("From: bot@example.org"));
        assert!(raw.contains("To: john@example.com"));
        assert!(raw.contains("Subject: [Neural Interface] Hello"));
        assert!(raw.contains("body text"));
    }

    #[tokio::test]
    async fn missing_credentials_report_failure() {
        let result = sender("", "").send("john@example.com", "s", "b").await;
        assert!(!result.ok);
        assert!(result.message.contains("not configured"));
    }

    #[tokio::test]
    async fn malformed_recipient_reports_failure() {
        let result = sender("bot@example.org", "pw")
            .send("not-an-address", "s", "b")
            .await;
        assert!(!result.ok);
        assert!(result.message.contains("Invalid recipient"));
    }

    #[tokio::test]
    async fn empty_recipient_reports_failure() {
        let result = sender("bot@example.org", "pw").send("  ", "s", "b").await;
        assert!(!result.ok);
        assert!(result.message.contains("No recipient"));
    }

    #[tokio::test]
    async fn unreachable_relay_reports_failure() {
        let result = sender("bot@example.org", "pw")
            .send("john@example.com", "s", "b")
            .await;
        assert!(!result.ok);
        assert!(result.message.starts_with("SMTP"));
    }

    #[test]
    fn success_result_names_recipient() {
        assert_eq!(
            EmailResult::sent("a@b.co"),
            EmailResult {
                ok: true,
                message: "Email sent to a@b.co".to_string()
            }
        );
    }
}
