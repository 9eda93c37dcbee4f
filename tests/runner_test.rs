//! Mailing job behavior over the in-memory repo and mailer.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Utc};
use gazette::mail::MemoryMailer;
use gazette::mailing::{MailingRunner, MemoryMailingRepo, RunSummary};
use gazette::models::{DeliveryStatus, Frequency, Message, Newsletter, NewsletterStatus};
use uuid::Uuid;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn time(h: u32, min: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, min, 0).unwrap()
}

fn at(d: NaiveDate, t: NaiveTime) -> NaiveDateTime {
    NaiveDateTime::new(d, t)
}

fn message(subject: &str) -> Message {
    Message {
        id: Uuid::new_v4(),
        subject: subject.to_string(),
        content: "fresh news inside".to_string(),
        owner_id: None,
        created_at: Utc::now(),
    }
}

fn newsletter(
    start: NaiveDate,
    send_time: NaiveTime,
    frequency: Frequency,
    message_id: Uuid,
) -> Newsletter {
    Newsletter {
        id: Uuid::new_v4(),
        name: "digest".to_string(),
        start_date: start,
        send_time,
        frequency,
        status: NewsletterStatus::Created,
        is_active: true,
        owner_id: None,
        message_id,
        created_at: Utc::now(),
    }
}

/// One newsletter, one message, the given recipients.
async fn single_newsletter(
    start: NaiveDate,
    send_time: NaiveTime,
    frequency: Frequency,
    recipients: &[&str],
) -> (MemoryMailingRepo, Uuid) {
    let repo = MemoryMailingRepo::new();
    let msg = message("digest");
    let n = newsletter(start, send_time, frequency, msg.id);
    let id = n.id;
    repo.insert_message(msg).await;
    repo.insert_newsletter(n, recipients.iter().map(|r| r.to_string()).collect())
        .await;
    (repo, id)
}

#[tokio::test]
async fn daily_newsletter_sends_and_moves_one_day() {
    let start = date(2024, 3, 10);
    let (repo, id) = single_newsletter(
        start,
        time(9, 0),
        Frequency::Daily,
        &["a@example.com", "b@example.com"],
    )
    .await;
    let mailer = MemoryMailer::new();
    let runner = MailingRunner::new(repo.clone(), mailer.clone());

    let summary = runner.run_due(at(start, time(10, 0))).await.unwrap();

    assert_eq!(
        summary,
        RunSummary {
            processed: 1,
            sent: 1,
            failed: 0,
            skipped: 0
        }
    );

    let sent = mailer.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, vec!["a@example.com", "b@example.com"]);
    assert_eq!(sent[0].subject, "digest");

    let updated = repo.newsletter(id).await.unwrap();
    assert_eq!(updated.start_date, date(2024, 3, 11));
    assert_eq!(updated.status, NewsletterStatus::Created);

    let logs = repo.logs().await;
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].status, DeliveryStatus::Success);
    assert_eq!(logs[0].newsletter_id, id);
    assert!(logs[0].server_response.as_deref().unwrap().contains("250"));
}

#[tokio::test]
async fn weekly_newsletter_moves_seven_days() {
    let start = date(2024, 12, 30);
    let (repo, id) =
        single_newsletter(start, time(8, 0), Frequency::Weekly, &["w@example.com"]).await;
    let runner = MailingRunner::new(repo.clone(), MemoryMailer::new());

    runner.run_due(at(start, time(8, 30))).await.unwrap();

    // Across the year boundary.
    let updated = repo.newsletter(id).await.unwrap();
    assert_eq!(updated.start_date, date(2025, 1, 6));
}

#[tokio::test]
async fn monthly_newsletter_moves_by_current_month_length() {
    // 31-day month.
    let (repo, id) = single_newsletter(
        date(2024, 1, 15),
        time(8, 0),
        Frequency::Monthly,
        &["m@example.com"],
    )
    .await;
    let runner = MailingRunner::new(repo.clone(), MemoryMailer::new());
    runner.run_due(at(date(2024, 1, 15), time(9, 0))).await.unwrap();
    assert_eq!(repo.newsletter(id).await.unwrap().start_date, date(2024, 2, 15));

    // Leap-year February: 29 days.
    let (repo, id) = single_newsletter(
        date(2024, 2, 10),
        time(8, 0),
        Frequency::Monthly,
        &["m@example.com"],
    )
    .await;
    let runner = MailingRunner::new(repo.clone(), MemoryMailer::new());
    runner.run_due(at(date(2024, 2, 10), time(9, 0))).await.unwrap();
    assert_eq!(repo.newsletter(id).await.unwrap().start_date, date(2024, 3, 10));

    // Plain February: 28 days.
    let (repo, id) = single_newsletter(
        date(2023, 2, 10),
        time(8, 0),
        Frequency::Monthly,
        &["m@example.com"],
    )
    .await;
    let runner = MailingRunner::new(repo.clone(), MemoryMailer::new());
    runner.run_due(at(date(2023, 2, 10), time(9, 0))).await.unwrap();
    assert_eq!(repo.newsletter(id).await.unwrap().start_date, date(2023, 3, 10));
}

#[tokio::test]
async fn waits_for_send_time_later_today() {
    let start = date(2024, 5, 1);
    let (repo, id) =
        single_newsletter(start, time(18, 0), Frequency::Daily, &["a@example.com"]).await;
    let mailer = MemoryMailer::new();
    let runner = MailingRunner::new(repo.clone(), mailer.clone());

    let summary = runner.run_due(at(start, time(12, 0))).await.unwrap();

    assert_eq!(summary.processed, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.sent, 0);
    assert!(mailer.sent().await.is_empty());
    assert!(repo.logs().await.is_empty());

    // Untouched: still due later today.
    let untouched = repo.newsletter(id).await.unwrap();
    assert_eq!(untouched.start_date, start);
    assert_eq!(untouched.status, NewsletterStatus::Created);
}

#[tokio::test]
async fn sends_exactly_at_send_time() {
    let start = date(2024, 5, 1);
    let (repo, _id) =
        single_newsletter(start, time(9, 0), Frequency::Daily, &["a@example.com"]).await;
    let runner = MailingRunner::new(repo.clone(), MemoryMailer::new());

    let summary = runner.run_due(at(start, time(9, 0))).await.unwrap();

    assert_eq!(summary.sent, 1);
    assert_eq!(summary.skipped, 0);
}

#[tokio::test]
async fn failed_delivery_is_logged_and_still_rescheduled() {
    let start = date(2024, 6, 3);
    let (repo, id) =
        single_newsletter(start, time(7, 0), Frequency::Daily, &["bad@example.com"]).await;
    let mailer = MemoryMailer::new();
    mailer.reject_address("bad@example.com").await;
    let runner = MailingRunner::new(repo.clone(), mailer.clone());

    let summary = runner.run_due(at(start, time(8, 0))).await.unwrap();

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.sent, 0);
    assert!(mailer.sent().await.is_empty());

    let logs = repo.logs().await;
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].status, DeliveryStatus::Failure);
    assert!(logs[0].server_response.as_deref().unwrap().contains("550"));

    // The failure does not hold the schedule back.
    let updated = repo.newsletter(id).await.unwrap();
    assert_eq!(updated.start_date, date(2024, 6, 4));
    assert_eq!(updated.status, NewsletterStatus::Created);
}

#[tokio::test]
async fn one_failure_does_not_block_the_next_newsletter() {
    let start = date(2024, 6, 3);
    let repo = MemoryMailingRepo::new();
    let first_msg = message("first");
    let second_msg = message("second");
    let first = newsletter(start, time(7, 0), Frequency::Daily, first_msg.id);
    let second = newsletter(start, time(7, 30), Frequency::Weekly, second_msg.id);
    let second_id = second.id;
    repo.insert_message(first_msg).await;
    repo.insert_message(second_msg).await;
    repo.insert_newsletter(first, vec!["bad@example.com".into()]).await;
    repo.insert_newsletter(second, vec!["good@example.com".into()]).await;

    let mailer = MemoryMailer::new();
    mailer.reject_address("bad@example.com").await;
    let runner = MailingRunner::new(repo.clone(), mailer.clone());

    let summary = runner.run_due(at(start, time(8, 0))).await.unwrap();

    assert_eq!(
        summary,
        RunSummary {
            processed: 2,
            sent: 1,
            failed: 1,
            skipped: 0
        }
    );

    let sent = mailer.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, "second");

    let second_after = repo.newsletter(second_id).await.unwrap();
    assert_eq!(second_after.start_date, date(2024, 6, 10));
}

#[tokio::test]
async fn only_active_created_newsletters_due_today_are_selected() {
    let today = date(2024, 7, 1);
    let repo = MemoryMailingRepo::new();
    let msg = message("digest");

    let mut inactive = newsletter(today, time(6, 0), Frequency::Daily, msg.id);
    inactive.is_active = false;

    let mut completed = newsletter(today, time(6, 0), Frequency::Daily, msg.id);
    completed.status = NewsletterStatus::Completed;

    let tomorrow = newsletter(date(2024, 7, 2), time(6, 0), Frequency::Daily, msg.id);
    let yesterday = newsletter(date(2024, 6, 30), time(6, 0), Frequency::Daily, msg.id);

    repo.insert_message(msg).await;
    for n in [inactive, completed, tomorrow, yesterday] {
        repo.insert_newsletter(n, vec!["a@example.com".into()]).await;
    }

    let mailer = MemoryMailer::new();
    let runner = MailingRunner::new(repo.clone(), mailer.clone());

    let summary = runner.run_due(at(today, time(12, 0))).await.unwrap();

    assert_eq!(summary, RunSummary::default());
    assert!(mailer.sent().await.is_empty());
}

#[tokio::test]
async fn empty_recipient_list_is_recorded_as_failure() {
    let start = date(2024, 8, 20);
    let (repo, id) = single_newsletter(start, time(10, 0), Frequency::Daily, &[]).await;
    let mailer = MemoryMailer::new();
    let runner = MailingRunner::new(repo.clone(), mailer.clone());

    let summary = runner.run_due(at(start, time(11, 0))).await.unwrap();

    assert_eq!(summary.failed, 1);
    assert!(mailer.sent().await.is_empty());

    let logs = repo.logs().await;
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].status, DeliveryStatus::Failure);

    // Still rescheduled like any other attempt.
    assert_eq!(repo.newsletter(id).await.unwrap().start_date, date(2024, 8, 21));
}

#[tokio::test]
async fn second_pass_same_day_does_not_resend() {
    let start = date(2024, 9, 5);
    let (repo, id) =
        single_newsletter(start, time(9, 0), Frequency::Daily, &["a@example.com"]).await;
    let mailer = MemoryMailer::new();
    let runner = MailingRunner::new(repo.clone(), mailer.clone());

    runner.run_due(at(start, time(9, 30))).await.unwrap();
    let summary = runner.run_due(at(start, time(10, 30))).await.unwrap();

    // Rescheduled to tomorrow by the first pass, so no longer due.
    assert_eq!(summary, RunSummary::default());
    assert_eq!(mailer.sent().await.len(), 1);
    assert_eq!(repo.newsletter(id).await.unwrap().start_date, date(2024, 9, 6));
}
