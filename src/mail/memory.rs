//! In-memory mailer for development and testing.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{Email, MailError, Mailer};

/// [`Mailer`] that records sends instead of delivering them.
///
/// Accepted emails land in an outbox; addresses registered through
/// [`reject_address`](Self::reject_address) make the send fail, which is how
/// tests exercise the failure path of the mailing job. Not durable.
#[derive(Clone, Default)]
pub struct MemoryMailer {
    inner: Arc<Mutex<MemoryState>>,
}

#[derive(Default)]
struct MemoryState {
    outbox: Vec<Email>,
    rejects: HashSet<String>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every send addressed to `address` fail with an SMTP-style error.
    pub async fn reject_address(&self, address: impl Into<String>) {
        let mut state = self.inner.lock().await;
        state.rejects.insert(address.into());
    }

    /// Everything accepted so far, oldest first.
    pub async fn sent(&self) -> Vec<Email> {
        let state = self.inner.lock().await;
        state.outbox.clone()
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, email: &Email) -> Result<String, MailError> {
        let mut state = self.inner.lock().await;

        if let Some(addr) = email.to.iter().find(|a| state.rejects.contains(a.as_str())) {
            return Err(MailError::Smtp(format!(
                "550 5.1.1 recipient rejected: {addr}"
            )));
        }

        state.outbox.push(email.clone());
        Ok("250 2.0.0 OK".to_string())
    }
}
