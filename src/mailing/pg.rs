//! Postgres-backed mailing storage.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo::{DeliveryAttempt, MailingRepo};
use super::MailingError;
use crate::models::{Message, Newsletter, NewsletterStatus};

/// [`MailingRepo`] over the application's Postgres pool. Each method is a
/// single query; the due filter matches the partial index on `newsletters`.
#[derive(Clone)]
pub struct PgMailingRepo {
    pool: PgPool,
}

impl PgMailingRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MailingRepo for PgMailingRepo {
    async fn due_newsletters(&self, date: NaiveDate) -> Result<Vec<Newsletter>, MailingError> {
        let newsletters = sqlx::query_as::<_, Newsletter>(
            "SELECT id, name, start_date, send_time, frequency, status, is_active, \
                    owner_id, message_id, created_at \
             FROM newsletters \
             WHERE start_date = $1 AND is_active AND status = $2 \
             ORDER BY send_time, created_at",
        )
        .bind(date)
        .bind(NewsletterStatus::Created.to_string())
        .fetch_all(&self.pool)
        .await?;

        Ok(newsletters)
    }

    async fn recipient_emails(&self, newsletter_id: Uuid) -> Result<Vec<String>, MailingError> {
        let emails = sqlx::query_scalar::<_, String>(
            "SELECT c.email \
             FROM clients c \
             JOIN newsletter_recipients r ON r.client_id = c.id \
             WHERE r.newsletter_id = $1 \
             ORDER BY c.email",
        )
        .bind(newsletter_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(emails)
    }

    async fn message(&self, message_id: Uuid) -> Result<Message, MailingError> {
        sqlx::query_as::<_, Message>(
            "SELECT id, subject, content, owner_id, created_at FROM messages WHERE id = $1",
        )
        .bind(message_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(MailingError::MissingMessage(message_id))
    }

    async fn set_status(
        &self,
        newsletter_id: Uuid,
        status: NewsletterStatus,
    ) -> Result<(), MailingError> {
        sqlx::query("UPDATE newsletters SET status = $1 WHERE id = $2")
            .bind(status.to_string())
            .bind(newsletter_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn append_log(&self, attempt: &DeliveryAttempt) -> Result<(), MailingError> {
        sqlx::query(
            "INSERT INTO delivery_logs (id, status, server_response, newsletter_id, message_id) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(Uuid::new_v4())
        .bind(attempt.status.to_string())
        .bind(&attempt.server_response)
        .bind(attempt.newsletter_id)
        .bind(attempt.message_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn reschedule(
        &self,
        newsletter_id: Uuid,
        next_start: NaiveDate,
        status: NewsletterStatus,
    ) -> Result<(), MailingError> {
        sqlx::query("UPDATE newsletters SET start_date = $1, status = $2 WHERE id = $3")
            .bind(next_start)
            .bind(status.to_string())
            .bind(newsletter_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
