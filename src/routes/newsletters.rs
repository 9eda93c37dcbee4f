//! Newsletter CRUD, the staff activity toggle, and per-newsletter
//! delivery logs.
//!
//! `start_date` is fixed at creation and `status` is only ever moved by
//! the mailing runner or the toggle, so updates deliberately exclude both.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::{AuthStaff, AuthUser};
use crate::error::{Error, Result};
use crate::models::{DeliveryLog, Frequency, Newsletter, NewsletterStatus};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/newsletters", get(list_newsletters).post(create_newsletter))
        .route(
            "/newsletters/:id",
            get(get_newsletter)
                .put(update_newsletter)
                .delete(delete_newsletter),
        )
        .route("/newsletters/:id/toggle", post(toggle_newsletter))
        .route("/newsletters/:id/logs", get(newsletter_logs))
}

#[derive(Deserialize)]
struct CreateNewsletter {
    name: String,
    start_date: NaiveDate,
    send_time: NaiveTime,
    frequency: Frequency,
    message_id: Uuid,
    client_ids: Vec<Uuid>,
}

#[derive(Deserialize)]
struct UpdateNewsletter {
    name: String,
    send_time: NaiveTime,
    frequency: Frequency,
    message_id: Uuid,
    client_ids: Vec<Uuid>,
}

/// Newsletter plus its recipient client ids.
#[derive(Serialize)]
struct NewsletterPayload {
    #[serde(flatten)]
    newsletter: Newsletter,
    client_ids: Vec<Uuid>,
}

async fn list_newsletters(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Newsletter>>> {
    let newsletters = if user.is_staff() {
        sqlx::query_as::<_, Newsletter>(
            "SELECT id, name, start_date, send_time, frequency, status, is_active, \
                    message_id, owner_id, created_at \
             FROM newsletters ORDER BY created_at DESC",
        )
        .fetch_all(&state.db)
        .await?
    } else {
        sqlx::query_as::<_, Newsletter>(
            "SELECT id, name, start_date, send_time, frequency, status, is_active, \
                    message_id, owner_id, created_at \
             FROM newsletters WHERE owner_id = $1 ORDER BY created_at DESC",
        )
        .bind(user.id)
        .fetch_all(&state.db)
        .await?
    };

    Ok(Json(newsletters))
}

async fn create_newsletter(
    user: AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreateNewsletter>,
) -> Result<(StatusCode, Json<NewsletterPayload>)> {
    let client_ids = dedupe(req.client_ids);
    check_references(&state.db, &user, req.message_id, &client_ids).await?;

    let mut tx = state.db.begin().await?;

    let newsletter = sqlx::query_as::<_, Newsletter>(
        "INSERT INTO newsletters (id, name, start_date, send_time, frequency, status, message_id, owner_id) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         RETURNING id, name, start_date, send_time, frequency, status, is_active, \
                   message_id, owner_id, created_at",
    )
    .bind(Uuid::new_v4())
    .bind(&req.name)
    .bind(req.start_date)
    .bind(req.send_time)
    .bind(req.frequency.to_string())
    .bind(NewsletterStatus::Created.to_string())
    .bind(req.message_id)
    .bind(user.id)
    .fetch_one(&mut *tx)
    .await?;

    for client_id in &client_ids {
        sqlx::query("INSERT INTO newsletter_recipients (newsletter_id, client_id) VALUES ($1, $2)")
            .bind(newsletter.id)
            .bind(client_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(NewsletterPayload {
            newsletter,
            client_ids,
        }),
    ))
}

async fn get_newsletter(
    user: AuthUser,
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<NewsletterPayload>> {
    let newsletter = find_newsletter(&state.db, id, &user).await?;
    let client_ids = recipient_ids(&state.db, id).await?;

    Ok(Json(NewsletterPayload {
        newsletter,
        client_ids,
    }))
}

async fn update_newsletter(
    user: AuthUser,
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(req): Json<UpdateNewsletter>,
) -> Result<Json<NewsletterPayload>> {
    find_newsletter(&state.db, id, &user).await?;
    let client_ids = dedupe(req.client_ids);
    check_references(&state.db, &user, req.message_id, &client_ids).await?;

    let mut tx = state.db.begin().await?;

    let newsletter = sqlx::query_as::<_, Newsletter>(
        "UPDATE newsletters SET name = $1, send_time = $2, frequency = $3, message_id = $4 \
         WHERE id = $5 \
         RETURNING id, name, start_date, send_time, frequency, status, is_active, \
                   message_id, owner_id, created_at",
    )
    .bind(&req.name)
    .bind(req.send_time)
    .bind(req.frequency.to_string())
    .bind(req.message_id)
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;

    // The recipient list is replaced wholesale.
    sqlx::query("DELETE FROM newsletter_recipients WHERE newsletter_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    for client_id in &client_ids {
        sqlx::query("INSERT INTO newsletter_recipients (newsletter_id, client_id) VALUES ($1, $2)")
            .bind(id)
            .bind(client_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    Ok(Json(NewsletterPayload {
        newsletter,
        client_ids,
    }))
}

async fn delete_newsletter(
    user: AuthUser,
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<StatusCode> {
    find_newsletter(&state.db, id, &user).await?;

    // Recipients and delivery logs go with it via ON DELETE CASCADE.
    sqlx::query("DELETE FROM newsletters WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Staff-only activity switch. Deactivating marks the newsletter
/// `completed`; reactivating hands it back to the scheduler as `created`.
async fn toggle_newsletter(
    staff: AuthStaff,
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<Newsletter>> {
    let newsletter = find_newsletter(&state.db, id, &staff).await?;

    let (is_active, status) = if newsletter.is_active {
        (false, NewsletterStatus::Completed)
    } else {
        (true, NewsletterStatus::Created)
    };

    let updated = sqlx::query_as::<_, Newsletter>(
        "UPDATE newsletters SET is_active = $1, status = $2 WHERE id = $3 \
         RETURNING id, name, start_date, send_time, frequency, status, is_active, \
                   message_id, owner_id, created_at",
    )
    .bind(is_active)
    .bind(status.to_string())
    .bind(id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(updated))
}

async fn newsletter_logs(
    user: AuthUser,
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<Vec<DeliveryLog>>> {
    find_newsletter(&state.db, id, &user).await?;

    let logs = sqlx::query_as::<_, DeliveryLog>(
        "SELECT id, sent_at, status, server_response, newsletter_id, message_id \
         FROM delivery_logs WHERE newsletter_id = $1 ORDER BY sent_at DESC",
    )
    .bind(id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(logs))
}

fn dedupe(mut ids: Vec<Uuid>) -> Vec<Uuid> {
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// A newsletter may only reference a message and clients the caller can
/// access. Staff can reference anyone's.
async fn check_references(
    db: &PgPool,
    user: &AuthUser,
    message_id: Uuid,
    client_ids: &[Uuid],
) -> Result<()> {
    let owner: Option<Option<Uuid>> =
        sqlx::query_scalar("SELECT owner_id FROM messages WHERE id = $1")
            .bind(message_id)
            .fetch_optional(db)
            .await?;
    match owner {
        Some(owner) if user.can_access(owner) => {}
        _ => return Err(Error::Validation("unknown message".into())),
    }

    if client_ids.is_empty() {
        return Ok(());
    }

    let known: i64 = if user.is_staff() {
        sqlx::query_scalar("SELECT COUNT(*) FROM clients WHERE id = ANY($1)")
            .bind(client_ids)
            .fetch_one(db)
            .await?
    } else {
        sqlx::query_scalar("SELECT COUNT(*) FROM clients WHERE id = ANY($1) AND owner_id = $2")
            .bind(client_ids)
            .bind(user.id)
            .fetch_one(db)
            .await?
    };
    if known != client_ids.len() as i64 {
        return Err(Error::Validation("unknown client in recipient list".into()));
    }

    Ok(())
}

async fn recipient_ids(db: &PgPool, newsletter_id: Uuid) -> Result<Vec<Uuid>> {
    let ids: Vec<Uuid> = sqlx::query_scalar(
        "SELECT client_id FROM newsletter_recipients WHERE newsletter_id = $1",
    )
    .bind(newsletter_id)
    .fetch_all(db)
    .await?;

    Ok(ids)
}

/// Owner-or-staff lookup. Missing and foreign rows both answer [`Error::NotFound`].
async fn find_newsletter(db: &PgPool, id: Uuid, user: &AuthUser) -> Result<Newsletter> {
    let newsletter = sqlx::query_as::<_, Newsletter>(
        "SELECT id, name, start_date, send_time, frequency, status, is_active, \
                message_id, owner_id, created_at \
         FROM newsletters WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(db)
    .await?;

    match newsletter {
        Some(newsletter) if user.can_access(newsletter.owner_id) => Ok(newsletter),
        _ => Err(Error::NotFound),
    }
}
