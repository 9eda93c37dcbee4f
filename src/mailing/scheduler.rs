//! In-process cron trigger for the mailing job.

use chrono::Local;
use cron::Schedule;

use super::repo::MailingRepo;
use super::runner::MailingRunner;
use super::MailingError;
use crate::mail::Mailer;

/// Runs mailing passes on a cron schedule inside the server process.
///
/// Each tick runs one pass to completion before sleeping until the next
/// occurrence, so in-process ticks never overlap. Deployments that trigger
/// the job externally (crontab + `run-mailings`) simply don't start this.
///
/// Cron expression format:
/// ```text
/// sec   min   hour   day_of_month   month   day_of_week
/// 0     *     *      *              *       *
/// ```
pub struct MailingScheduler<R, M> {
    runner: MailingRunner<R, M>,
    schedule: Schedule,
}

impl<R, M> MailingScheduler<R, M>
where
    R: MailingRepo,
    M: Mailer,
{
    pub fn new(runner: MailingRunner<R, M>, cron_expr: &str) -> Result<Self, MailingError> {
        let schedule: Schedule = cron_expr.parse().map_err(|_| MailingError::InvalidCron)?;

        if let Some(next) = schedule.upcoming(Local).next() {
            tracing::debug!("Mailing schedule '{}'. Next occurrence: {}", schedule, next);
        } else {
            tracing::warn!("Cron schedule '{}' will never fire", schedule);
            return Err(MailingError::InvalidCron);
        }

        Ok(Self { runner, schedule })
    }

    /// Start the tick loop. Spawns a background tokio task and returns
    /// immediately.
    pub fn start(self) {
        tokio::spawn(async move {
            loop {
                let Some(next) = self.schedule.upcoming(Local).next() else {
                    break;
                };
                let wait = (next - Local::now()).to_std().unwrap_or_default();
                tokio::time::sleep(wait).await;

                match self.runner.run_due(Local::now().naive_local()).await {
                    Ok(summary) => tracing::info!(
                        processed = summary.processed,
                        sent = summary.sent,
                        failed = summary.failed,
                        skipped = summary.skipped,
                        "mailing pass complete"
                    ),
                    Err(e) => tracing::error!(error = %e, "mailing pass aborted"),
                }
            }
        });

        tracing::info!("⏳ Mailing scheduler running");
    }
}
