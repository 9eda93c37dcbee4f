//! JWT session tokens, auth extractors, and password hashing.
//!
//! Tokens are HMAC-SHA-384 signed and accepted from either the
//! `Authorization: Bearer` header or the `jwt` session cookie. Passwords are
//! argon2 PHC strings, hashed and verified off the async runtime.

use std::sync::Arc;

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash};
use async_trait::async_trait;
use axum::body::Body;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use axum::Json;
use axum_extra::extract::cookie;
use axum_extra::extract::cookie::SameSite;
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::{Authorization, Cookie, HeaderMapExt};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use jwt::{SignWithKey, VerifyWithKey};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::Sha384;
use uuid::Uuid;

use crate::error::Error;
use crate::models::{Role, User};

const COOKIE_NAME: &str = "jwt";

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Password hashing error {0}")]
    PasswordHash(argon2::password_hash::errors::Error),
    #[error("Password hashing panic")]
    PasswordHashPanic,
}

/// Claims carried by every session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub role: Role,
    /// Standard JWT `exp` claim (unix seconds).
    pub exp: i64,
}

#[derive(Clone)]
pub struct JwtManager(Arc<JwtConfig>);

pub struct JwtConfig {
    key: Hmac<Sha384>,
    ttl: Duration,
    cookie_secure: bool,
}

impl JwtConfig {
    pub fn new(secret: &str) -> JwtConfig {
        assert!(
            secret.len() >= 32,
            "Provide a longer JWT secret (len={}). Ex: 'openssl rand -base64 48'",
            secret.len()
        );
        // SHA-384 (HS-384) as the HMAC is more difficult to brute-force
        // than SHA-256 (recommended by the JWT spec) at the cost of a slightly larger token.
        let key = Hmac::<Sha384>::new_from_slice(secret.as_bytes())
            .expect("HMAC-SHA-384 can accept any key length");
        JwtConfig {
            key,
            ttl: Duration::weeks(2),
            cookie_secure: true,
        }
    }

    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Whether the session cookie is marked `Secure`. Disable for plain-http
    /// development setups.
    pub fn cookie_secure(mut self, cookie_secure: bool) -> Self {
        self.cookie_secure = cookie_secure;
        self
    }

    pub fn build(self) -> JwtManager {
        JwtManager(Arc::new(self))
    }
}

impl JwtManager {
    /// Sign pre-built claims. [`issue`](Self::issue) is the common path;
    /// this exists so tests can control `exp`.
    pub fn sign(&self, claims: &Claims) -> String {
        claims
            .sign_with_key(&self.0.key)
            .expect("HMAC signing should be infallible")
    }

    /// Create a token for a user with the configured lifetime.
    pub fn issue(&self, user: &User) -> String {
        let claims = Claims {
            sub: user.id.to_string(),
            role: user.role,
            exp: (Utc::now() + self.0.ttl).timestamp(),
        };
        self.sign(&claims)
    }

    /// Parse & verify a token, rejecting expired claims.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let claims: Claims = token.verify_with_key(&self.0.key).map_err(|e| {
            tracing::debug!("JWT failed to verify: {}", e);
            AuthError::Unauthorized
        })?;

        if claims.exp < Utc::now().timestamp() {
            tracing::debug!("token expired");
            return Err(AuthError::Unauthorized);
        }

        Ok(claims)
    }

    pub fn session_cookie(&self, token: &str) -> cookie::Cookie<'static> {
        cookie::Cookie::build((COOKIE_NAME, token.to_owned()))
            .http_only(true)
            .secure(self.0.cookie_secure)
            .same_site(SameSite::Strict)
            .build()
    }

    /// `{"token": ...}` body plus the session cookie.
    pub fn login_response(&self, user: &User) -> Response<Body> {
        let token = self.issue(user);
        let jar = cookie::CookieJar::new().add(self.session_cookie(&token));
        let body = Json(json!({"token": token}));

        (jar, body).into_response()
    }

    /// Pull claims out of the `Authorization` header or the session cookie.
    ///
    /// Returns Ok(None) if the request did not contain auth info.
    pub fn claims_from_parts(&self, parts: &Parts) -> Result<Option<Claims>, AuthError> {
        if let Some(auth_header) = parts.headers.typed_get::<Authorization<Bearer>>() {
            return self.verify(auth_header.token()).map(Some);
        }

        if let Some(cookie) = parts.headers.typed_get::<Cookie>() {
            if let Some(token) = cookie.get(COOKIE_NAME) {
                return self.verify(token).map(Some);
            }
        }

        Ok(None)
    }
}

/// Extractor for routes that require a signed-in user.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
}

impl AuthUser {
    pub fn is_staff(&self) -> bool {
        self.role == Role::Staff
    }

    /// Owner-or-staff check applied by every object route.
    pub fn can_access(&self, owner_id: Option<Uuid>) -> bool {
        self.is_staff() || owner_id == Some(self.id)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtManager: FromRef<S>,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jwt = JwtManager::from_ref(state);
        let claims = jwt
            .claims_from_parts(parts)?
            .ok_or(AuthError::Unauthorized)?;
        let id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::Unauthorized)?;

        Ok(AuthUser {
            id,
            role: claims.role,
        })
    }
}

/// Extractor for staff-only routes.
#[derive(Debug)]
pub struct AuthStaff(pub AuthUser);

impl std::ops::Deref for AuthStaff {
    type Target = AuthUser;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthStaff
where
    S: Send + Sync,
    JwtManager: FromRef<S>,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_staff() {
            return Err(Error::Forbidden);
        }

        Ok(AuthStaff(user))
    }
}

/// Hashes a password. The produced hash is a "PHC String" that includes a
/// random salt.
///
/// Argon2 is computationally intensive, so this runs on a thread where
/// blocking is acceptable.
pub async fn hash_password(password: String) -> Result<String, AuthError> {
    tokio::task::spawn_blocking(move || -> Result<String, AuthError> {
        let salt = SaltString::generate(rand::thread_rng());
        Ok(
            PasswordHash::generate(Argon2::default(), password, salt.as_salt())
                .inspect_err(|e| tracing::warn!("failed to generate password hash: {}", e))
                .map_err(AuthError::PasswordHash)?
                .to_string(),
        )
    })
    .await
    .map_err(|_| AuthError::PasswordHashPanic)?
}

/// Verifies a password against a "PHC String" hash.
///
/// Runs on a blocking thread for the same reason as [`hash_password`].
pub async fn verify_password(password: String, password_hash: String) -> Result<(), AuthError> {
    tokio::task::spawn_blocking(move || -> Result<(), AuthError> {
        let hash = PasswordHash::new(&password_hash)
            .inspect_err(|err| tracing::warn!("invalid password hash: {}", err))
            .map_err(AuthError::PasswordHash)?;

        match hash.verify_password(&[&Argon2::default()], password) {
            Ok(_) => Ok(()),
            Err(argon2::password_hash::Error::Password) => Err(AuthError::Unauthorized),
            Err(err) => {
                tracing::trace!("failed to verify password hash: {}", err);
                Err(AuthError::PasswordHash(err))
            }
        }
    })
    .await
    .map_err(|_| AuthError::PasswordHashPanic)?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_or_staff_access() {
        let owner = AuthUser {
            id: Uuid::new_v4(),
            role: Role::User,
        };
        let staff = AuthUser {
            id: Uuid::new_v4(),
            role: Role::Staff,
        };

        assert!(owner.can_access(Some(owner.id)));
        assert!(!owner.can_access(Some(Uuid::new_v4())));
        // Ownerless records (owner deleted) are reachable by staff only.
        assert!(!owner.can_access(None));
        assert!(staff.can_access(Some(owner.id)));
        assert!(staff.can_access(None));
    }
}
