//! Message (mailing content) CRUD. Same ownership rules as clients.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::{Error, Result};
use crate::models::Message;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/messages", get(list_messages).post(create_message))
        .route(
            "/messages/:id",
            get(get_message).put(update_message).delete(delete_message),
        )
}

#[derive(Deserialize)]
struct MessagePayload {
    subject: String,
    content: String,
}

async fn list_messages(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Message>>> {
    let messages = if user.is_staff() {
        sqlx::query_as::<_, Message>(
            "SELECT id, subject, content, owner_id, created_at \
             FROM messages ORDER BY created_at DESC",
        )
        .fetch_all(&state.db)
        .await?
    } else {
        sqlx::query_as::<_, Message>(
            "SELECT id, subject, content, owner_id, created_at \
             FROM messages WHERE owner_id = $1 ORDER BY created_at DESC",
        )
        .bind(user.id)
        .fetch_all(&state.db)
        .await?
    };

    Ok(Json(messages))
}

async fn create_message(
    user: AuthUser,
    State(state): State<AppState>,
    Json(req): Json<MessagePayload>,
) -> Result<(StatusCode, Json<Message>)> {
    let message = sqlx::query_as::<_, Message>(
        "INSERT INTO messages (id, subject, content, owner_id) \
         VALUES ($1, $2, $3, $4) \
         RETURNING id, subject, content, owner_id, created_at",
    )
    .bind(Uuid::new_v4())
    .bind(&req.subject)
    .bind(&req.content)
    .bind(user.id)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(message)))
}

async fn get_message(
    user: AuthUser,
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<Message>> {
    let message = find_message(&state.db, id, &user).await?;
    Ok(Json(message))
}

async fn update_message(
    user: AuthUser,
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(req): Json<MessagePayload>,
) -> Result<Json<Message>> {
    find_message(&state.db, id, &user).await?;

    let message = sqlx::query_as::<_, Message>(
        "UPDATE messages SET subject = $1, content = $2 WHERE id = $3 \
         RETURNING id, subject, content, owner_id, created_at",
    )
    .bind(&req.subject)
    .bind(&req.content)
    .bind(id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(message))
}

async fn delete_message(
    user: AuthUser,
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<StatusCode> {
    find_message(&state.db, id, &user).await?;

    sqlx::query("DELETE FROM messages WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn find_message(db: &PgPool, id: Uuid, user: &AuthUser) -> Result<Message> {
    let message = sqlx::query_as::<_, Message>(
        "SELECT id, subject, content, owner_id, created_at FROM messages WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(db)
    .await?;

    match message {
        Some(message) if user.can_access(message.owner_id) => Ok(message),
        _ => Err(Error::NotFound),
    }
}
