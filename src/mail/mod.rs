//! Email sending.
//!
//! A thin abstraction over [lettre](https://lettre.rs) with environment-based
//! configuration. The [`Mailer`] trait is the seam the mailing job runs
//! through: [`SmtpMailer`] for real delivery, [`MemoryMailer`] for
//! development and tests.
//!
//! # Environment Variables
//!
//! [`SmtpConfig`] reads:
//!
//! | Variable | Required | Description |
//! |----------|----------|-------------|
//! | `SMTP_HOST` | Yes | SMTP server hostname |
//! | `SMTP_PORT` | No | Port (default: 587) |
//! | `SMTP_USERNAME` | No | Username for authentication |
//! | `SMTP_PASSWORD` | No | Password for authentication |
//! | `SMTP_FROM` | Yes | Default sender address |
//! | `SMTP_TLS` | No | `starttls` (default), `tls`, or `none` |
//! | `SMTP_TIMEOUT` | No | Connection timeout in seconds (default: 10) |

mod mailer;
mod memory;
mod message;

pub use mailer::{Mailer, SmtpConfig, SmtpMailer};
pub use memory::MemoryMailer;
pub use message::{Email, EmailBuilder};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("missing required config: {0}")]
    MissingConfig(String),

    #[error("invalid email address: {0}")]
    InvalidAddress(String),

    #[error("failed to build message: {0}")]
    Build(String),

    #[error("SMTP error: {0}")]
    Smtp(String),
}
