//! Storage seam for the mailing job.

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use super::MailingError;
use crate::models::{DeliveryStatus, Message, Newsletter, NewsletterStatus};

/// One send attempt's outcome, ready to append to the delivery log.
#[derive(Debug, Clone)]
pub struct DeliveryAttempt {
    pub newsletter_id: Uuid,
    pub message_id: Uuid,
    pub status: DeliveryStatus,
    pub server_response: String,
}

impl DeliveryAttempt {
    pub fn success(newsletter: &Newsletter, response: String) -> Self {
        Self {
            newsletter_id: newsletter.id,
            message_id: newsletter.message_id,
            status: DeliveryStatus::Success,
            server_response: response,
        }
    }

    pub fn failure(newsletter: &Newsletter, error: String) -> Self {
        Self {
            newsletter_id: newsletter.id,
            message_id: newsletter.message_id,
            status: DeliveryStatus::Failure,
            server_response: error,
        }
    }
}

/// Backend-agnostic storage for the mailing job.
///
/// Each method maps to a single storage operation; for SQL backends each
/// is one query. The [`MailingRunner`](super::MailingRunner) owns all
/// sequencing and state-transition logic, implementations only read and
/// write.
#[async_trait]
pub trait MailingRepo: Send + Sync + Clone + 'static {
    /// Newsletters due on `date`: `start_date = date`, active, and in
    /// `Created` status.
    async fn due_newsletters(&self, date: NaiveDate) -> Result<Vec<Newsletter>, MailingError>;

    /// Emails of every recipient attached to a newsletter.
    async fn recipient_emails(&self, newsletter_id: Uuid) -> Result<Vec<String>, MailingError>;

    /// The message a newsletter sends.
    async fn message(&self, message_id: Uuid) -> Result<Message, MailingError>;

    /// Persist a bare status change.
    async fn set_status(
        &self,
        newsletter_id: Uuid,
        status: NewsletterStatus,
    ) -> Result<(), MailingError>;

    /// Append one row to the delivery log.
    async fn append_log(&self, attempt: &DeliveryAttempt) -> Result<(), MailingError>;

    /// Persist the next start date together with the status reset.
    async fn reschedule(
        &self,
        newsletter_id: Uuid,
        next_start: NaiveDate,
        status: NewsletterStatus,
    ) -> Result<(), MailingError>;
}
