//! Application error type and its JSON rendering.
//!
//! Every handler returns [`Error`]; `?` converts the layer errors
//! (sqlx, auth) into it. Responses carry `{"error": ..., "code": ...}` with
//! the public message; server-side detail is traced, never returned.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::auth::AuthError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Not found")]
    NotFound,

    #[error("Email already exists")]
    EmailExists,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("{0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),
}

impl Error {
    pub fn http_code(&self) -> StatusCode {
        match self {
            Error::Unauthorized | Error::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Error::Auth(AuthError::Unauthorized) => StatusCode::UNAUTHORIZED,
            Error::Forbidden => StatusCode::FORBIDDEN,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::Database(sqlx::Error::RowNotFound) => StatusCode::NOT_FOUND,
            Error::EmailExists => StatusCode::CONFLICT,
            Error::InvalidEmail(_) | Error::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::Database(_) | Error::Auth(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn http_message(&self) -> String {
        match self {
            Error::Database(sqlx::Error::RowNotFound) => "not found".into(),
            Error::Database(_) => "internal error".into(),
            Error::Auth(AuthError::Unauthorized) => "authentication failed".into(),
            Error::Auth(_) => "internal error".into(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        if self.http_code().is_server_error() {
            tracing::error!("Error: {}", self);
        }

        let body = Json(json!({
            "error": self.http_message(),
            "code": self.http_code().as_u16(),
        }));

        (self.http_code(), body).into_response()
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
