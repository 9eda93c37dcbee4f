//! Mailer trait and SMTP implementation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::Deserialize;

use super::{Email, MailError};

/// Async email sending trait.
///
/// `send` resolves to the transport's positive response text, which the
/// mailing job records verbatim in the delivery log.
#[async_trait]
pub trait Mailer: Send + Sync + 'static {
    /// Send an email, returning the server's acceptance response.
    async fn send(&self, email: &Email) -> Result<String, MailError>;
}

/// Configuration for the SMTP mailer.
#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    /// SMTP server hostname.
    #[serde(rename = "smtp_host")]
    pub host: String,

    /// SMTP server port (default: 587).
    #[serde(rename = "smtp_port", default = "default_port")]
    pub port: u16,

    /// SMTP username for authentication.
    #[serde(rename = "smtp_username")]
    pub username: Option<String>,

    /// SMTP password for authentication.
    #[serde(rename = "smtp_password")]
    pub password: Option<String>,

    /// Default sender address.
    #[serde(rename = "smtp_from")]
    pub from: String,

    /// TLS mode: "starttls" (default), "tls", or "none".
    #[serde(rename = "smtp_tls", default = "default_tls")]
    pub tls: String,

    /// Connection timeout in seconds (default: 10).
    #[serde(rename = "smtp_timeout", default = "default_timeout")]
    pub timeout: u64,
}

fn default_port() -> u16 {
    587
}

fn default_tls() -> String {
    "starttls".to_string()
}

fn default_timeout() -> u64 {
    10
}

/// SMTP-based mailer using lettre.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: Arc<AsyncSmtpTransport<Tokio1Executor>>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Create a mailer from explicit configuration.
    pub fn from_config(config: SmtpConfig) -> Result<Self, MailError> {
        let from: Mailbox = config
            .from
            .parse()
            .map_err(|_| MailError::InvalidAddress(config.from.clone()))?;

        let mut builder = match config.tls.as_str() {
            "none" => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host),
            "tls" => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                .map_err(|e| MailError::Smtp(e.to_string()))?,
            _ => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .map_err(|e| MailError::Smtp(e.to_string()))?,
        };

        builder = builder
            .port(config.port)
            .timeout(Some(Duration::from_secs(config.timeout)));

        if let (Some(username), Some(password)) = (config.username, config.password) {
            builder = builder.credentials(Credentials::new(username, password));
        }

        Ok(Self {
            transport: Arc::new(builder.build()),
            from,
        })
    }

    /// Build a lettre Message from our Email type.
    fn build_message(&self, email: &Email) -> Result<Message, MailError> {
        let from_mailbox = email
            .from
            .as_ref()
            .map(|f| f.parse())
            .transpose()
            .map_err(|_| MailError::InvalidAddress(email.from.clone().unwrap_or_default()))?
            .unwrap_or_else(|| self.from.clone());

        let mut builder = Message::builder().from(from_mailbox);

        for to in &email.to {
            let mailbox: Mailbox = to
                .parse()
                .map_err(|_| MailError::InvalidAddress(to.clone()))?;
            builder = builder.to(mailbox);
        }

        if let Some(reply_to) = &email.reply_to {
            let mailbox: Mailbox = reply_to
                .parse()
                .map_err(|_| MailError::InvalidAddress(reply_to.clone()))?;
            builder = builder.reply_to(mailbox);
        }

        builder
            .subject(&email.subject)
            .body(email.body.clone())
            .map_err(|e| MailError::Build(e.to_string()))
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &Email) -> Result<String, MailError> {
        let message = self.build_message(email)?;

        let response = self
            .transport
            .send(message)
            .await
            .map_err(|e| MailError::Smtp(e.to_string()))?;

        let detail = response.message().collect::<Vec<_>>().join(" ");
        Ok(format!("{} {}", response.code(), detail).trim().to_string())
    }
}
