//! In-memory mailing storage for development and testing.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::repo::{DeliveryAttempt, MailingRepo};
use super::MailingError;
use crate::models::{DeliveryLog, Message, Newsletter, NewsletterStatus};

/// [`MailingRepo`] backed by plain collections behind a mutex.
///
/// Newsletters keep insertion order, which makes multi-newsletter test
/// scenarios deterministic. Not durable.
#[derive(Clone, Default)]
pub struct MemoryMailingRepo {
    inner: Arc<Mutex<Store>>,
}

#[derive(Default)]
struct Store {
    newsletters: Vec<Newsletter>,
    messages: HashMap<Uuid, Message>,
    recipients: HashMap<Uuid, Vec<String>>,
    logs: Vec<DeliveryLog>,
}

impl MemoryMailingRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_message(&self, message: Message) {
        let mut store = self.inner.lock().await;
        store.messages.insert(message.id, message);
    }

    pub async fn insert_newsletter(&self, newsletter: Newsletter, recipients: Vec<String>) {
        let mut store = self.inner.lock().await;
        store.recipients.insert(newsletter.id, recipients);
        store.newsletters.push(newsletter);
    }

    pub async fn newsletter(&self, id: Uuid) -> Option<Newsletter> {
        let store = self.inner.lock().await;
        store.newsletters.iter().find(|n| n.id == id).cloned()
    }

    pub async fn logs(&self) -> Vec<DeliveryLog> {
        let store = self.inner.lock().await;
        store.logs.clone()
    }
}

#[async_trait]
impl MailingRepo for MemoryMailingRepo {
    async fn due_newsletters(&self, date: NaiveDate) -> Result<Vec<Newsletter>, MailingError> {
        let store = self.inner.lock().await;
        let due = store
            .newsletters
            .iter()
            .filter(|n| {
                n.start_date == date && n.is_active && n.status == NewsletterStatus::Created
            })
            .cloned()
            .collect();

        Ok(due)
    }

    async fn recipient_emails(&self, newsletter_id: Uuid) -> Result<Vec<String>, MailingError> {
        let store = self.inner.lock().await;
        Ok(store
            .recipients
            .get(&newsletter_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn message(&self, message_id: Uuid) -> Result<Message, MailingError> {
        let store = self.inner.lock().await;
        store
            .messages
            .get(&message_id)
            .cloned()
            .ok_or(MailingError::MissingMessage(message_id))
    }

    async fn set_status(
        &self,
        newsletter_id: Uuid,
        status: NewsletterStatus,
    ) -> Result<(), MailingError> {
        let mut store = self.inner.lock().await;
        if let Some(n) = store.newsletters.iter_mut().find(|n| n.id == newsletter_id) {
            n.status = status;
        }
        Ok(())
    }

    async fn append_log(&self, attempt: &DeliveryAttempt) -> Result<(), MailingError> {
        let mut store = self.inner.lock().await;
        store.logs.push(DeliveryLog {
            id: Uuid::new_v4(),
            sent_at: Utc::now(),
            status: attempt.status,
            server_response: Some(attempt.server_response.clone()),
            newsletter_id: attempt.newsletter_id,
            message_id: attempt.message_id,
        });
        Ok(())
    }

    async fn reschedule(
        &self,
        newsletter_id: Uuid,
        next_start: NaiveDate,
        status: NewsletterStatus,
    ) -> Result<(), MailingError> {
        let mut store = self.inner.lock().await;
        if let Some(n) = store.newsletters.iter_mut().find(|n| n.id == newsletter_id) {
            n.start_date = next_start;
            n.status = status;
        }
        Ok(())
    }
}
