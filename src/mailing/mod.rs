//! The periodic mailing job.
//!
//! # Architecture
//!
//! - [`MailingRepo`]: backend-agnostic storage trait covering exactly the
//!   reads and writes one job pass needs.
//! - [`PgMailingRepo`]: Postgres implementation, one query per method.
//! - [`MemoryMailingRepo`]: in-memory implementation for development and
//!   testing.
//! - [`MailingRunner`]: executes one pass: select due newsletters, send,
//!   log, reschedule. Transport failures are contained per newsletter;
//!   repository failures abort the pass.
//! - [`MailingScheduler`]: cron-driven loop that runs passes in-process.
//! - [`schedule`]: the date arithmetic that advances `start_date`.
//!
//! A pass can also be triggered from outside (the `run-mailings` subcommand)
//! for deployments that prefer an external cron entry.

pub mod schedule;

mod memory;
mod pg;
mod repo;
mod runner;
mod scheduler;

pub use memory::MemoryMailingRepo;
pub use pg::PgMailingRepo;
pub use repo::{DeliveryAttempt, MailingRepo};
pub use runner::{MailingRunner, RunSummary};
pub use scheduler::MailingScheduler;

use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum MailingError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("newsletter references missing message {0}")]
    MissingMessage(Uuid),

    #[error("invalid cron schedule")]
    InvalidCron,
}
