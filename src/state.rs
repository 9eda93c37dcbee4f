//! Shared handler state.

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::auth::JwtManager;
use crate::stats::StatsCache;

/// Everything the HTTP handlers need, cloned per request. `FromRef` lets
/// extractors pull individual pieces (the pool, the JWT manager) directly.
#[derive(Clone, FromRef)]
pub struct AppState {
    pub db: PgPool,
    pub jwt: JwtManager,
    pub stats: StatsCache,
}
