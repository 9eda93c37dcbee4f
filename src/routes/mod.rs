//! HTTP surface.
//!
//! Public routes (dashboard, blog, contact, auth) sit at the root; the
//! owned CRUD resources live under `/api` and require a session token.

pub mod auth;
pub mod blog;
pub mod clients;
pub mod contact;
pub mod home;
pub mod logs;
pub mod messages;
pub mod newsletters;

use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::error::{Error, Result};
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(home::router())
        .merge(auth::router())
        .merge(blog::public_router())
        .merge(contact::router())
        .nest("/api", api_router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn api_router() -> Router<AppState> {
    Router::new()
        .merge(clients::router())
        .merge(messages::router())
        .merge(newsletters::router())
        .merge(logs::router())
        .merge(blog::api_router())
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({"ok": true}))
}

/// Syntactic check via lettre's address parser; applied wherever an email
/// address enters the system.
pub(crate) fn validate_email(address: &str) -> Result<()> {
    address
        .parse::<lettre::Address>()
        .map(|_| ())
        .map_err(|_| Error::InvalidEmail(address.to_string()))
}
