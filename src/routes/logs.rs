//! Global delivery-log listing, scoped by ownership of the parent
//! newsletter.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::auth::AuthUser;
use crate::error::Result;
use crate::models::DeliveryLog;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/logs", get(list_logs))
}

async fn list_logs(user: AuthUser, State(state): State<AppState>) -> Result<Json<Vec<DeliveryLog>>> {
    let logs = if user.is_staff() {
        sqlx::query_as::<_, DeliveryLog>(
            "SELECT id, sent_at, status, server_response, newsletter_id, message_id \
             FROM delivery_logs ORDER BY sent_at DESC",
        )
        .fetch_all(&state.db)
        .await?
    } else {
        sqlx::query_as::<_, DeliveryLog>(
            "SELECT l.id, l.sent_at, l.status, l.server_response, l.newsletter_id, l.message_id \
             FROM delivery_logs l \
             JOIN newsletters n ON n.id = l.newsletter_id \
             WHERE n.owner_id = $1 ORDER BY l.sent_at DESC",
        )
        .bind(user.id)
        .fetch_all(&state.db)
        .await?
    };

    Ok(Json(logs))
}
