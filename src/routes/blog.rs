//! Blog: a public read surface plus an authenticated management API.
//!
//! Reading a post through the public route bumps its view counter in the
//! same statement that fetches it.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::{Error, Result};
use crate::models::BlogPost;
use crate::state::AppState;

pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/blog", get(list_published))
        .route("/blog/:id", get(read_post))
}

pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/blog", get(list_posts).post(create_post))
        .route(
            "/blog/:id",
            get(get_post).put(update_post).delete(delete_post),
        )
}

#[derive(Deserialize)]
struct PostPayload {
    title: String,
    content: String,
    #[serde(default)]
    preview: Option<String>,
    #[serde(default)]
    slug: Option<String>,
    /// Posts go live immediately unless explicitly held back.
    #[serde(default = "default_published")]
    is_published: bool,
}

fn default_published() -> bool {
    true
}

// ===== Public surface =====

async fn list_published(State(state): State<AppState>) -> Result<Json<Vec<BlogPost>>> {
    let posts = sqlx::query_as::<_, BlogPost>(
        "SELECT id, title, slug, content, preview, author_id, created_at, is_published, views_count \
         FROM blog_posts WHERE is_published ORDER BY created_at DESC",
    )
    .fetch_all(&state.db)
    .await?;

    Ok(Json(posts))
}

async fn read_post(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<BlogPost>> {
    let post = sqlx::query_as::<_, BlogPost>(
        "UPDATE blog_posts SET views_count = views_count + 1 \
         WHERE id = $1 AND is_published \
         RETURNING id, title, slug, content, preview, author_id, created_at, is_published, views_count",
    )
    .bind(id)
    .fetch_optional(&state.db)
    .await?
    .ok_or(Error::NotFound)?;

    Ok(Json(post))
}

// ===== Management API =====

async fn list_posts(user: AuthUser, State(state): State<AppState>) -> Result<Json<Vec<BlogPost>>> {
    let posts = if user.is_staff() {
        sqlx::query_as::<_, BlogPost>(
            "SELECT id, title, slug, content, preview, author_id, created_at, is_published, views_count \
             FROM blog_posts ORDER BY created_at DESC",
        )
        .fetch_all(&state.db)
        .await?
    } else {
        sqlx::query_as::<_, BlogPost>(
            "SELECT id, title, slug, content, preview, author_id, created_at, is_published, views_count \
             FROM blog_posts WHERE author_id = $1 ORDER BY created_at DESC",
        )
        .bind(user.id)
        .fetch_all(&state.db)
        .await?
    };

    Ok(Json(posts))
}

async fn create_post(
    user: AuthUser,
    State(state): State<AppState>,
    Json(req): Json<PostPayload>,
) -> Result<(StatusCode, Json<BlogPost>)> {
    let slug = req.slug.unwrap_or_else(|| slugify(&req.title));

    let post = sqlx::query_as::<_, BlogPost>(
        "INSERT INTO blog_posts (id, title, slug, content, preview, author_id, is_published) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         RETURNING id, title, slug, content, preview, author_id, created_at, is_published, views_count",
    )
    .bind(Uuid::new_v4())
    .bind(&req.title)
    .bind(&slug)
    .bind(&req.content)
    .bind(&req.preview)
    .bind(user.id)
    .bind(req.is_published)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(post)))
}

async fn get_post(
    user: AuthUser,
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<BlogPost>> {
    let post = find_post(&state.db, id, &user).await?;
    Ok(Json(post))
}

async fn update_post(
    user: AuthUser,
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(req): Json<PostPayload>,
) -> Result<Json<BlogPost>> {
    find_post(&state.db, id, &user).await?;
    let slug = req.slug.unwrap_or_else(|| slugify(&req.title));

    // The view counter is never written from here.
    let post = sqlx::query_as::<_, BlogPost>(
        "UPDATE blog_posts SET title = $1, slug = $2, content = $3, preview = $4, is_published = $5 \
         WHERE id = $6 \
         RETURNING id, title, slug, content, preview, author_id, created_at, is_published, views_count",
    )
    .bind(&req.title)
    .bind(&slug)
    .bind(&req.content)
    .bind(&req.preview)
    .bind(req.is_published)
    .bind(id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(post))
}

async fn delete_post(
    user: AuthUser,
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<StatusCode> {
    find_post(&state.db, id, &user).await?;

    sqlx::query("DELETE FROM blog_posts WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn find_post(db: &PgPool, id: Uuid, user: &AuthUser) -> Result<BlogPost> {
    let post = sqlx::query_as::<_, BlogPost>(
        "SELECT id, title, slug, content, preview, author_id, created_at, is_published, views_count \
         FROM blog_posts WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(db)
    .await?;

    match post {
        Some(post) if user.can_access(Some(post.author_id)) => Ok(post),
        _ => Err(Error::NotFound),
    }
}

fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;
    for c in title.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            slug.extend(c.to_lowercase());
            pending_dash = false;
        } else {
            pending_dash = true;
        }
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::slugify;

    #[test]
    fn slugs_are_lowercase_dashed() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("  Rustaceans unite  "), "rustaceans-unite");
        assert_eq!(slugify("Uppercase ÅNGSTRÖM"), "uppercase-ångström");
    }

    #[test]
    fn punctuation_runs_collapse() {
        assert_eq!(slugify("a -- b"), "a-b");
        assert_eq!(slugify("!!!"), "");
    }
}
