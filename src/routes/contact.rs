//! Contact-form intake. Submissions land in the structured log stream.

use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use crate::error::Result;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/contact", post(submit))
}

#[derive(Deserialize)]
struct ContactRequest {
    name: String,
    email: String,
    message: String,
}

async fn submit(Json(req): Json<ContactRequest>) -> Result<Json<serde_json::Value>> {
    super::validate_email(&req.email)?;

    tracing::info!(
        name = %req.name,
        email = %req.email,
        message = %req.message,
        "contact request",
    );

    Ok(Json(json!({"ok": true})))
}
