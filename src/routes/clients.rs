//! Client (mailing recipient) CRUD.
//!
//! Clients belong to the user who created them. Staff see everything;
//! everyone else sees only their own, and foreign ids answer 404.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::{Error, Result};
use crate::models::Client;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/clients", get(list_clients).post(create_client))
        .route(
            "/clients/:id",
            get(get_client).put(update_client).delete(delete_client),
        )
}

#[derive(Deserialize)]
struct ClientPayload {
    email: String,
    full_name: String,
    #[serde(default)]
    comment: Option<String>,
}

async fn list_clients(user: AuthUser, State(state): State<AppState>) -> Result<Json<Vec<Client>>> {
    let clients = if user.is_staff() {
        sqlx::query_as::<_, Client>(
            "SELECT id, email, full_name, comment, owner_id, created_at \
             FROM clients ORDER BY created_at DESC",
        )
        .fetch_all(&state.db)
        .await?
    } else {
        sqlx::query_as::<_, Client>(
            "SELECT id, email, full_name, comment, owner_id, created_at \
             FROM clients WHERE owner_id = $1 ORDER BY created_at DESC",
        )
        .bind(user.id)
        .fetch_all(&state.db)
        .await?
    };

    Ok(Json(clients))
}

async fn create_client(
    user: AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ClientPayload>,
) -> Result<(StatusCode, Json<Client>)> {
    super::validate_email(&req.email)?;

    let client = sqlx::query_as::<_, Client>(
        "INSERT INTO clients (id, email, full_name, comment, owner_id) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING id, email, full_name, comment, owner_id, created_at",
    )
    .bind(Uuid::new_v4())
    .bind(&req.email)
    .bind(&req.full_name)
    .bind(&req.comment)
    .bind(user.id)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(client)))
}

async fn get_client(
    user: AuthUser,
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<Client>> {
    let client = find_client(&state.db, id, &user).await?;
    Ok(Json(client))
}

async fn update_client(
    user: AuthUser,
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(req): Json<ClientPayload>,
) -> Result<Json<Client>> {
    super::validate_email(&req.email)?;
    find_client(&state.db, id, &user).await?;

    let client = sqlx::query_as::<_, Client>(
        "UPDATE clients SET email = $1, full_name = $2, comment = $3 WHERE id = $4 \
         RETURNING id, email, full_name, comment, owner_id, created_at",
    )
    .bind(&req.email)
    .bind(&req.full_name)
    .bind(&req.comment)
    .bind(id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(client))
}

async fn delete_client(
    user: AuthUser,
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<StatusCode> {
    find_client(&state.db, id, &user).await?;

    sqlx::query("DELETE FROM clients WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Owner-or-staff lookup. Missing and foreign rows both answer [`Error::NotFound`].
async fn find_client(db: &PgPool, id: Uuid, user: &AuthUser) -> Result<Client> {
    let client = sqlx::query_as::<_, Client>(
        "SELECT id, email, full_name, comment, owner_id, created_at FROM clients WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(db)
    .await?;

    match client {
        Some(client) if user.can_access(client.owner_id) => Ok(client),
        _ => Err(Error::NotFound),
    }
}
