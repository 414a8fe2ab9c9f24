//! Resend and dispatch concurrency tests

use chrono::Duration;
use std::sync::Arc;
use tokio::sync::Notify;

use crate::errors::{DomainError, VerificationError};
use crate::services::auth_flow::SubmitOutcome;
use crate::services::mocks::MockEmailSender;

use super::harness::Harness;

#[tokio::test]
async fn test_resend_supersedes_previous_code() {
    let h = Harness::new();
    h.flow.sign_up("a@b.com", "secret1", "secret1").await.unwrap();
    let first = h.sent_code("a@b.com");

    let prompt = h.flow.resend_code().await.unwrap();
    assert_eq!(prompt.session.resend_count, 1);
    let second = h.sent_code("a@b.com");

    if first != second {
        let outcome = h.flow.submit_code(&first).await.unwrap();
        assert!(matches!(
            outcome,
            SubmitOutcome::Rejected { error: VerificationError::CodeMismatch, .. }
        ));
    }
    let outcome = h.flow.submit_code(&second).await.unwrap();
    assert!(matches!(outcome, SubmitOutcome::Verified { .. }));
}

#[tokio::test]
async fn test_sixth_resend_rejected_with_countdown() {
    let h = Harness::new();
    h.flow.sign_up("a@b.com", "secret1", "secret1").await.unwrap();

    for _ in 0..5 {
        h.flow.resend_code().await.unwrap();
        h.clock.advance(Duration::seconds(10));
    }
    let err = h.flow.resend_code().await.unwrap_err();

    match err {
        DomainError::Verification(VerificationError::RateLimited { retry_after_secs }) => {
            assert!(retry_after_secs > 0);
            assert!(retry_after_secs <= 15 * 60);
        }
        other => panic!("expected rate limit, got {:?}", other),
    }
    // Initial code plus five resends
    assert_eq!(h.email.sent_count(), 6);
}

#[tokio::test]
async fn test_resend_allowed_again_after_window() {
    let h = Harness::new();
    h.flow.sign_up("a@b.com", "secret1", "secret1").await.unwrap();
    for _ in 0..5 {
        h.flow.resend_code().await.unwrap();
    }
    assert!(h.flow.resend_code().await.is_err());

    h.clock.advance(Duration::minutes(15) + Duration::seconds(1));

    assert!(h.flow.resend_code().await.is_ok());
}

#[tokio::test]
async fn test_resend_without_session() {
    let h = Harness::new();

    let err = h.flow.resend_code().await.unwrap_err();
    assert_eq!(err, DomainError::Verification(VerificationError::NoActiveSession));
}

#[tokio::test]
async fn test_resend_starts_verification_for_current_session() {
    let h = Harness::new();
    h.signed_in_unverified("a@b.com", "secret1");

    let prompt = h.flow.resend_code().await.unwrap();

    assert_eq!(prompt.email(), "a@b.com");
    assert!(h.flow.verification_session().await.is_some());
    assert_eq!(h.email.sent_count(), 1);
}

#[tokio::test]
async fn test_concurrent_dispatch_rejected() {
    let release = Arc::new(Notify::new());
    let h = Harness::with_sender(MockEmailSender::held(release.clone()));

    let flow = h.flow.clone();
    let sign_up = tokio::spawn(async move { flow.sign_up("a@b.com", "secret1", "secret1").await });
    h.email.entered.notified().await;
    release.notify_one();
    sign_up.await.unwrap().unwrap();

    let flow = h.flow.clone();
    let first = tokio::spawn(async move { flow.resend_code().await });
    h.email.entered.notified().await;

    let err = h.flow.resend_code().await.unwrap_err();
    assert_eq!(err, DomainError::Verification(VerificationError::DispatchInProgress));

    release.notify_one();
    assert!(first.await.unwrap().is_ok());
    assert_eq!(h.email.sent_count(), 2);
}

#[tokio::test]
async fn test_sign_out_during_resend_dispatch() {
    let release = Arc::new(Notify::new());
    let h = Harness::with_sender(MockEmailSender::held(release.clone()));

    let flow = h.flow.clone();
    let sign_up = tokio::spawn(async move { flow.sign_up("a@b.com", "secret1", "secret1").await });
    h.email.entered.notified().await;
    release.notify_one();
    sign_up.await.unwrap().unwrap();

    let flow = h.flow.clone();
    let resend = tokio::spawn(async move { flow.resend_code().await });
    h.email.entered.notified().await;
    h.flow.confirm_abandon().await;
    release.notify_one();

    let err = resend.await.unwrap().unwrap_err();
    assert_eq!(err, DomainError::Verification(VerificationError::NoActiveSession));
    assert!(h.flow.verification_session().await.is_none());
}
