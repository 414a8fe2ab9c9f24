//! Unit tests for the GoTrue auth provider

use chrono::{Duration, Utc};
use reqwest::StatusCode;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use aa_core::{AuthError, AuthEvent, AuthProvider, UserSession};

use super::config;
use crate::backend::supabase_auth::map_auth_error;
use crate::backend::SupabaseAuthProvider;

fn session_body(user_id: &str, email: &str) -> serde_json::Value {
    json!({
        "access_token": "access-1",
        "token_type": "bearer",
        "expires_in": 3600,
        "refresh_token": "refresh-1",
        "user": { "id": user_id, "email": email }
    })
}

#[tokio::test]
async fn test_sign_in_stores_session_and_emits_event() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .and(header("apikey", "anon-key"))
        .and(body_json(json!({ "email": "a@b.com", "password": "secret1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_body("uid-1", "a@b.com")))
        .mount(&server)
        .await;

    let provider = SupabaseAuthProvider::new(config(&server)).unwrap();
    let mut events = provider.subscribe();

    let session = provider.sign_in_with_password("a@b.com", "secret1").await.unwrap();

    assert_eq!(session.user_id, "uid-1");
    assert_eq!(session.refresh_token.as_deref(), Some("refresh-1"));
    assert!(session.expires_at.unwrap() > Utc::now());
    assert_eq!(provider.get_session().await.unwrap(), Some(session.clone()));
    assert!(matches!(events.recv().await.unwrap(), AuthEvent::SignedIn(s) if s.user_id == "uid-1"));
}

#[tokio::test]
async fn test_invalid_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Invalid login credentials"
        })))
        .mount(&server)
        .await;

    let provider = SupabaseAuthProvider::new(config(&server)).unwrap();
    let err = provider.sign_in_with_password("a@b.com", "wrong").await.unwrap_err();

    assert_eq!(err, AuthError::InvalidCredentials);
    assert_eq!(provider.get_session().await.unwrap(), None);
}

#[tokio::test]
async fn test_sign_up_without_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/signup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "uid-2",
            "email": "new@b.com",
            "identities": [{ "provider": "email" }]
        })))
        .mount(&server)
        .await;

    let provider = SupabaseAuthProvider::new(config(&server)).unwrap();
    let user = provider.sign_up("new@b.com", "secret1").await.unwrap();

    assert_eq!(user.user_id, "uid-2");
    assert!(user.session.is_none());
}

#[tokio::test]
async fn test_sign_up_existing_address() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/signup"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "code": 422,
            "error_code": "user_already_exists",
            "msg": "User already registered"
        })))
        .mount(&server)
        .await;

    let provider = SupabaseAuthProvider::new(config(&server)).unwrap();
    let err = provider.sign_up("a@b.com", "secret1").await.unwrap_err();

    assert_eq!(err, AuthError::AccountExists);
}

#[tokio::test]
async fn test_obfuscated_existing_address() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/signup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "uid-fake",
            "email": "a@b.com",
            "identities": []
        })))
        .mount(&server)
        .await;

    let provider = SupabaseAuthProvider::new(config(&server)).unwrap();
    assert_eq!(
        provider.sign_up("a@b.com", "secret1").await.unwrap_err(),
        AuthError::AccountExists
    );
}

#[tokio::test]
async fn test_expired_session_is_refreshed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "refresh_token"))
        .and(body_json(json!({ "refresh_token": "old-refresh" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_body("uid-1", "a@b.com")))
        .expect(1)
        .mount(&server)
        .await;

    let provider = SupabaseAuthProvider::new(config(&server)).unwrap();
    let expired = UserSession::new("uid-1", "a@b.com", "old-access")
        .with_refresh_token("old-refresh")
        .with_expiry(Utc::now() - Duration::minutes(5));
    provider.restore_session(expired).await;

    let session = provider.get_session().await.unwrap().unwrap();
    assert_eq!(session.access_token, "access-1");
}

#[tokio::test]
async fn test_rejected_refresh_signs_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Invalid Refresh Token: Refresh Token Not Found"
        })))
        .mount(&server)
        .await;

    let provider = SupabaseAuthProvider::new(config(&server)).unwrap();
    provider
        .restore_session(
            UserSession::new("uid-1", "a@b.com", "old-access")
                .with_refresh_token("gone")
                .with_expiry(Utc::now() - Duration::minutes(5)),
        )
        .await;
    let mut events = provider.subscribe();

    assert_eq!(provider.get_session().await.unwrap(), None);
    assert!(matches!(events.recv().await.unwrap(), AuthEvent::SignedOut));
}

#[tokio::test]
async fn test_sign_out_clears_session_even_if_remote_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/logout"))
        .and(header("authorization", "Bearer access-1"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let provider = SupabaseAuthProvider::new(config(&server)).unwrap();
    provider
        .restore_session(UserSession::new("uid-1", "a@b.com", "access-1"))
        .await;

    provider.sign_out().await.unwrap();
    assert_eq!(provider.get_session().await.unwrap(), None);
}

#[tokio::test]
async fn test_update_password_requires_session() {
    let server = MockServer::start().await;
    let provider = SupabaseAuthProvider::new(config(&server)).unwrap();

    assert_eq!(
        provider.update_password("newpass1").await.unwrap_err(),
        AuthError::SessionMissing
    );
}

#[tokio::test]
async fn test_recovery_code_opens_session_for_password_update() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/recover"))
        .and(body_json(json!({ "email": "a@b.com" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/verify"))
        .and(body_json(json!({ "type": "recovery", "email": "a@b.com", "token": "482913" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_body("uid-1", "a@b.com")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/auth/v1/user"))
        .and(header("authorization", "Bearer access-1"))
        .and(body_json(json!({ "password": "newpass1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "uid-1" })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = SupabaseAuthProvider::new(config(&server)).unwrap();
    let mut events = provider.subscribe();

    provider.reset_password_for_email("a@b.com").await.unwrap();
    assert_eq!(
        provider.update_password("newpass1").await.unwrap_err(),
        AuthError::SessionMissing
    );

    let session = provider.verify_recovery_code("a@b.com", "482913").await.unwrap();
    assert_eq!(session.user_id, "uid-1");
    assert!(matches!(events.recv().await.unwrap(), AuthEvent::PasswordRecovery(s) if s.user_id == "uid-1"));

    provider.update_password("newpass1").await.unwrap();
    assert!(matches!(events.recv().await.unwrap(), AuthEvent::UserUpdated(_)));
}

#[tokio::test]
async fn test_rejected_recovery_code_keeps_signed_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/verify"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "code": 403,
            "error_code": "otp_expired",
            "msg": "Token has expired or is invalid"
        })))
        .mount(&server)
        .await;

    let provider = SupabaseAuthProvider::new(config(&server)).unwrap();
    let err = provider.verify_recovery_code("a@b.com", "000000").await.unwrap_err();

    assert_eq!(err, AuthError::RecoveryCodeRejected);
    assert_eq!(provider.get_session().await.unwrap(), None);
}

#[test]
fn test_error_mapping() {
    assert_eq!(
        map_auth_error(StatusCode::BAD_REQUEST, r#"{"error_code":"invalid_credentials","msg":"Invalid login credentials"}"#),
        AuthError::InvalidCredentials
    );
    assert_eq!(
        map_auth_error(StatusCode::BAD_REQUEST, r#"{"msg":"User already registered"}"#),
        AuthError::AccountExists
    );
    assert_eq!(
        map_auth_error(StatusCode::FORBIDDEN, r#"{"error_code":"session_not_found","msg":"Session not found"}"#),
        AuthError::SessionMissing
    );
    assert_eq!(
        map_auth_error(StatusCode::UNPROCESSABLE_ENTITY, r#"{"error_code":"same_password","msg":"New password should be different from the old password."}"#),
        AuthError::SamePassword
    );
    assert_eq!(
        map_auth_error(StatusCode::FORBIDDEN, r#"{"msg":"Token has expired or is invalid"}"#),
        AuthError::RecoveryCodeRejected
    );
    assert!(matches!(
        map_auth_error(StatusCode::INTERNAL_SERVER_ERROR, "oops"),
        AuthError::Provider { .. }
    ));
}
