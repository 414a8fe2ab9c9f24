//! Unit tests for the session resolver

use chrono::{Duration, Utc};
use std::sync::Arc;

use crate::domain::entities::session::UserSession;
use crate::domain::value_objects::auth_event::AuthEvent;
use crate::services::clock::ManualClock;
use crate::services::mocks::MockAuthProvider;
use crate::services::session::{AuthProvider, SessionResolver};

fn resolver(auth: Arc<MockAuthProvider>) -> (SessionResolver, ManualClock) {
    let clock = ManualClock::new(Utc::now());
    (SessionResolver::new(auth, Arc::new(clock.clone())), clock)
}

#[tokio::test]
async fn test_resolve_returns_live_session() {
    let auth = Arc::new(MockAuthProvider::new());
    auth.set_session(Some(UserSession::new("user-1", "a@b.com", "token")));
    let (resolver, _clock) = resolver(auth);

    let session = resolver.resolve().await.unwrap();
    assert_eq!(session.user_id, "user-1");
}

#[tokio::test]
async fn test_resolve_without_session() {
    let auth = Arc::new(MockAuthProvider::new());
    let (resolver, _clock) = resolver(auth);

    assert!(resolver.resolve().await.is_none());
}

#[tokio::test]
async fn test_provider_error_fails_closed() {
    let auth = Arc::new(MockAuthProvider::new());
    auth.set_session(Some(UserSession::new("user-1", "a@b.com", "token")));
    auth.set_fail_get_session(true);
    let (resolver, _clock) = resolver(auth);

    assert!(resolver.resolve().await.is_none());
}

#[tokio::test]
async fn test_expired_session_is_absent() {
    let auth = Arc::new(MockAuthProvider::new());
    let (resolver, clock) = resolver(auth.clone());
    let expiry = Utc::now() + Duration::minutes(10);
    auth.set_session(Some(
        UserSession::new("user-1", "a@b.com", "token").with_expiry(expiry),
    ));

    assert!(resolver.resolve().await.is_some());
    clock.advance(Duration::minutes(11));
    assert!(resolver.resolve().await.is_none());
}

#[tokio::test]
async fn test_subscribe_receives_transitions() {
    let auth = Arc::new(MockAuthProvider::new());
    auth.add_account("a@b.com", "secret1");
    let (resolver, _clock) = resolver(auth.clone());
    let mut events = resolver.subscribe();

    auth.sign_in_with_password("a@b.com", "secret1").await.unwrap();
    auth.sign_out().await.unwrap();

    assert!(matches!(events.recv().await.unwrap(), AuthEvent::SignedIn(_)));
    assert_eq!(events.recv().await.unwrap(), AuthEvent::SignedOut);
}
