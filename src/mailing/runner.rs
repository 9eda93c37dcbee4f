//! One pass of the mailing job.

use chrono::NaiveDateTime;

use super::repo::{DeliveryAttempt, MailingRepo};
use super::MailingError;
use crate::mail::{Email, MailError, Mailer};
use crate::models::{Message, NewsletterStatus};

/// Counts for one pass. `processed` is the size of the due set;
/// `sent + failed + skipped` accounts for all of it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub processed: usize,
    pub sent: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Executes mailing passes over a [`MailingRepo`] and a [`Mailer`].
///
/// A pass is sequential: newsletters are handled one at a time with no
/// locking or idempotency key, so overlapping passes can double-send.
/// The caller supplies the wall-clock instant, which keeps due-ness
/// deterministic under test.
pub struct MailingRunner<R, M> {
    repo: R,
    mailer: M,
}

impl<R, M> MailingRunner<R, M>
where
    R: MailingRepo,
    M: Mailer,
{
    pub fn new(repo: R, mailer: M) -> Self {
        Self { repo, mailer }
    }

    /// Run every newsletter due at `now` to completion.
    ///
    /// Per newsletter: skip if its send time is still ahead of `now`,
    /// otherwise mark it started, send the message to all recipients, append
    /// a success or failure log row, and reschedule it forward from today's
    /// date. A transport failure is logged and the newsletter is still
    /// rescheduled; there is no retry. Repository errors are not contained,
    /// they abort the pass.
    pub async fn run_due(&self, now: NaiveDateTime) -> Result<RunSummary, MailingError> {
        let due = self.repo.due_newsletters(now.date()).await?;
        let mut summary = RunSummary::default();

        for newsletter in due {
            summary.processed += 1;

            if newsletter.send_time > now.time() {
                tracing::debug!(
                    newsletter_id = %newsletter.id,
                    send_time = %newsletter.send_time,
                    "not due until later today, skipping"
                );
                summary.skipped += 1;
                continue;
            }

            self.repo
                .set_status(newsletter.id, NewsletterStatus::Started)
                .await?;

            let recipients = self.repo.recipient_emails(newsletter.id).await?;
            let message = self.repo.message(newsletter.message_id).await?;

            match self.send_message(&recipients, &message).await {
                Ok(response) => {
                    tracing::info!(
                        newsletter_id = %newsletter.id,
                        recipients = recipients.len(),
                        "newsletter sent"
                    );
                    summary.sent += 1;
                    self.repo
                        .append_log(&DeliveryAttempt::success(&newsletter, response))
                        .await?;
                }
                Err(e) => {
                    tracing::warn!(
                        newsletter_id = %newsletter.id,
                        error = %e,
                        "newsletter delivery failed"
                    );
                    summary.failed += 1;
                    self.repo
                        .append_log(&DeliveryAttempt::failure(&newsletter, e.to_string()))
                        .await?;
                }
            }

            // Advance from today regardless of outcome, and hand the
            // newsletter back to the next cycle.
            let next_start = newsletter.frequency.next_start_date(now.date());
            self.repo
                .reschedule(newsletter.id, next_start, NewsletterStatus::Created)
                .await?;
        }

        Ok(summary)
    }

    async fn send_message(
        &self,
        recipients: &[String],
        message: &Message,
    ) -> Result<String, MailError> {
        let email = Email::builder()
            .to_many(recipients.iter().cloned())
            .subject(&message.subject)
            .body(&message.content)
            .build()?;

        self.mailer.send(&email).await
    }
}
