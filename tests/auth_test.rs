//! Password hashing, JWT session tokens, and the auth extractors.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::Request;
use axum_extra::extract::cookie::SameSite;
use chrono::{Duration, Utc};
use gazette::auth::{
    hash_password, verify_password, AuthError, AuthStaff, AuthUser, Claims, JwtConfig,
};
use gazette::models::{Role, User};
use uuid::Uuid;

const SECRET: &str = "test-hmac-secret-key-at-least-32-bytes-long";

fn test_user(role: Role) -> User {
    User {
        id: Uuid::new_v4(),
        email: "user@example.com".into(),
        password_hash: String::new(),
        name: "Test".into(),
        surname: "User".into(),
        patronymic: None,
        comment: None,
        role,
        is_active: true,
        created_at: Utc::now(),
    }
}

#[tokio::test]
async fn password_roundtrip() {
    let hash = hash_password("hunter2hunter2".to_string()).await.unwrap();
    assert!(hash.starts_with("$argon2"));

    verify_password("hunter2hunter2".to_string(), hash.clone())
        .await
        .unwrap();

    let err = verify_password("wrong-password".to_string(), hash)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Unauthorized));
}

#[tokio::test]
async fn hashes_are_salted() {
    let a = hash_password("same-password".to_string()).await.unwrap();
    let b = hash_password("same-password".to_string()).await.unwrap();
    assert_ne!(a, b);
}

#[test]
fn issue_and_verify_token() {
    let jwt = JwtConfig::new(SECRET).build();
    let user = test_user(Role::Staff);

    let token = jwt.issue(&user);
    let claims = jwt.verify(&token).unwrap();

    assert_eq!(claims.sub, user.id.to_string());
    assert_eq!(claims.role, Role::Staff);
    assert!(claims.exp > Utc::now().timestamp());
}

#[test]
fn foreign_and_mangled_tokens_are_rejected() {
    let jwt = JwtConfig::new(SECRET).build();
    let other = JwtConfig::new("a-different-secret-also-32-bytes-long!!").build();

    let token = jwt.issue(&test_user(Role::User));

    assert!(other.verify(&token).is_err());
    assert!(jwt.verify(&token[..token.len() - 4]).is_err());
    assert!(jwt.verify("not.a.jwt").is_err());
}

#[test]
fn expired_token_is_rejected() {
    let jwt = JwtConfig::new(SECRET).build();
    let claims = Claims {
        sub: Uuid::new_v4().to_string(),
        role: Role::User,
        exp: (Utc::now() - Duration::hours(1)).timestamp(),
    };

    let token = jwt.sign(&claims);

    assert!(jwt.verify(&token).is_err());
}

#[test]
fn configured_ttl_lands_in_exp() {
    let jwt = JwtConfig::new(SECRET).ttl(Duration::hours(1)).build();

    let claims = jwt.verify(&jwt.issue(&test_user(Role::User))).unwrap();

    let expected = (Utc::now() + Duration::hours(1)).timestamp();
    assert!((claims.exp - expected).abs() <= 2);
}

#[test]
fn session_cookie_is_locked_down() {
    let jwt = JwtConfig::new(SECRET).build();
    let cookie = jwt.session_cookie("some-token");

    assert_eq!(cookie.name(), "jwt");
    assert_eq!(cookie.value(), "some-token");
    assert_eq!(cookie.http_only(), Some(true));
    assert_eq!(cookie.secure(), Some(true));
    assert_eq!(cookie.same_site(), Some(SameSite::Strict));

    let dev = JwtConfig::new(SECRET).cookie_secure(false).build();
    assert_ne!(dev.session_cookie("t").secure(), Some(true));
}

fn parts(header_name: &str, header_value: String) -> Parts {
    let request = Request::builder()
        .uri("/")
        .header(header_name, header_value)
        .body(())
        .unwrap();
    request.into_parts().0
}

#[tokio::test]
async fn bearer_header_authorizes() {
    let jwt = JwtConfig::new(SECRET).build();
    let user = test_user(Role::User);
    let token = jwt.issue(&user);

    let mut parts = parts("Authorization", format!("Bearer {token}"));
    let auth = AuthUser::from_request_parts(&mut parts, &jwt).await.unwrap();

    assert_eq!(auth.id, user.id);
    assert_eq!(auth.role, Role::User);
}

#[tokio::test]
async fn session_cookie_authorizes() {
    let jwt = JwtConfig::new(SECRET).build();
    let user = test_user(Role::Staff);
    let token = jwt.issue(&user);

    let mut parts = parts("Cookie", format!("jwt={token}"));
    let auth = AuthUser::from_request_parts(&mut parts, &jwt).await.unwrap();

    assert_eq!(auth.id, user.id);
    assert!(auth.is_staff());
}

#[tokio::test]
async fn missing_credentials_are_unauthorized() {
    let jwt = JwtConfig::new(SECRET).build();

    let request = Request::builder().uri("/").body(()).unwrap();
    let mut parts = request.into_parts().0;

    let err = AuthUser::from_request_parts(&mut parts, &jwt)
        .await
        .unwrap_err();
    assert_eq!(err.http_code(), axum::http::StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn staff_gate_rejects_plain_users() {
    let jwt = JwtConfig::new(SECRET).build();

    let token = jwt.issue(&test_user(Role::User));
    let mut plain = parts("Authorization", format!("Bearer {token}"));
    let err = AuthStaff::from_request_parts(&mut plain, &jwt)
        .await
        .unwrap_err();
    assert_eq!(err.http_code(), axum::http::StatusCode::FORBIDDEN);

    let token = jwt.issue(&test_user(Role::Staff));
    let mut staff = parts("Authorization", format!("Bearer {token}"));
    assert!(AuthStaff::from_request_parts(&mut staff, &jwt)
        .await
        .is_ok());
}
