//! Public dashboard: mailing counters plus a random sample of blog posts.
//!
//! Every figure here is served through [`StatsCache`](crate::stats::StatsCache),
//! so a busy landing page costs at most one round of queries per TTL window.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::error::Result;
use crate::models::BlogPost;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(dashboard))
}

#[derive(Serialize)]
struct Dashboard {
    newsletters_total: i64,
    newsletters_active: i64,
    unique_client_emails: i64,
    random_posts: Vec<BlogPost>,
}

async fn dashboard(State(state): State<AppState>) -> Result<Json<Dashboard>> {
    let newsletters_total = cached_count(
        &state,
        "newsletters_total",
        "SELECT COUNT(*) FROM newsletters",
    )
    .await?;
    let newsletters_active = cached_count(
        &state,
        "newsletters_active",
        "SELECT COUNT(*) FROM newsletters WHERE is_active",
    )
    .await?;
    let unique_client_emails = cached_count(
        &state,
        "unique_client_emails",
        "SELECT COUNT(DISTINCT email) FROM clients",
    )
    .await?;
    let random_posts = random_posts(&state).await?;

    Ok(Json(Dashboard {
        newsletters_total,
        newsletters_active,
        unique_client_emails,
        random_posts,
    }))
}

async fn cached_count(state: &AppState, key: &'static str, query: &'static str) -> Result<i64> {
    if let Some(count) = state.stats.get_count(key) {
        return Ok(count);
    }

    let count: i64 = sqlx::query_scalar(query).fetch_one(&state.db).await?;
    state.stats.put_count(key, count);

    Ok(count)
}

async fn random_posts(state: &AppState) -> Result<Vec<BlogPost>> {
    if let Some(posts) = state.stats.get_posts("random_posts") {
        return Ok(posts);
    }

    let posts = sqlx::query_as::<_, BlogPost>(
        "SELECT id, title, slug, content, preview, author_id, created_at, is_published, views_count \
         FROM blog_posts WHERE is_published ORDER BY random() LIMIT 3",
    )
    .fetch_all(&state.db)
    .await?;
    state.stats.put_posts("random_posts", posts.clone());

    Ok(posts)
}
