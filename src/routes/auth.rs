//! Registration, login, and the current-user endpoint.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::{hash_password, verify_password, AuthError, AuthUser};
use crate::error::{Error, Result};
use crate::models::{Role, User};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
}

#[derive(Deserialize)]
struct RegisterRequest {
    email: String,
    password: String,
    name: String,
    surname: String,
    #[serde(default)]
    patronymic: Option<String>,
    #[serde(default)]
    comment: Option<String>,
}

#[derive(Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<User>)> {
    super::validate_email(&req.email)?;
    if req.password.chars().count() < 8 {
        return Err(Error::Validation(
            "password must be at least 8 characters".into(),
        ));
    }

    let password_hash = hash_password(req.password).await?;

    // Everyone registers as a plain user. Staff is granted out of band.
    let result = sqlx::query_as::<_, User>(
        "INSERT INTO users (id, email, password_hash, name, surname, patronymic, comment, role) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         RETURNING id, email, password_hash, name, surname, patronymic, comment, role, is_active, created_at",
    )
    .bind(Uuid::new_v4())
    .bind(&req.email)
    .bind(&password_hash)
    .bind(&req.name)
    .bind(&req.surname)
    .bind(&req.patronymic)
    .bind(&req.comment)
    .bind(Role::User.to_string())
    .fetch_one(&state.db)
    .await;

    let user = match result {
        Ok(user) => user,
        Err(sqlx::Error::Database(db_err)) if db_err.constraint() == Some("users_email_key") => {
            return Err(Error::EmailExists);
        }
        Err(err) => return Err(err.into()),
    };

    Ok((StatusCode::CREATED, Json(user)))
}

async fn login(State(state): State<AppState>, Json(req): Json<LoginRequest>) -> Result<Response> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, email, password_hash, name, surname, patronymic, comment, role, is_active, created_at \
         FROM users WHERE email = $1",
    )
    .bind(&req.email)
    .fetch_optional(&state.db)
    .await?
    .ok_or(Error::InvalidCredentials)?;

    // Deactivated accounts cannot sign in.
    if !user.is_active {
        return Err(Error::InvalidCredentials);
    }

    // An unknown email and a wrong password answer identically.
    match verify_password(req.password, user.password_hash.clone()).await {
        Ok(()) => {}
        Err(AuthError::Unauthorized) => return Err(Error::InvalidCredentials),
        Err(err) => return Err(err.into()),
    }

    Ok(state.jwt.login_response(&user))
}

async fn me(user: AuthUser, State(state): State<AppState>) -> Result<Json<User>> {
    let me = sqlx::query_as::<_, User>(
        "SELECT id, email, password_hash, name, surname, patronymic, comment, role, is_active, created_at \
         FROM users WHERE id = $1",
    )
    .bind(user.id)
    .fetch_optional(&state.db)
    .await?
    .ok_or(Error::Unauthorized)?;

    Ok(Json(me))
}
