//! Unit tests for the code issuer

use chrono::{Duration, TimeZone, Utc};
use std::sync::Arc;

use crate::domain::entities::verification_code::CodeFormat;
use crate::domain::value_objects::issued_code::CodeDelivery;
use crate::services::clock::{Clock, ManualClock};
use crate::services::code_issuer::{CodeIssuer, CodeIssuerConfig};
use crate::services::mocks::MockEmailSender;

fn issuer(sender: Arc<MockEmailSender>, format: CodeFormat) -> (CodeIssuer, ManualClock) {
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap());
    let config = CodeIssuerConfig {
        format,
        ..CodeIssuerConfig::default()
    };
    (CodeIssuer::new(sender, Arc::new(clock.clone()), config), clock)
}

#[tokio::test]
async fn test_issue_emails_code() {
    let sender = Arc::new(MockEmailSender::new(false));
    let (issuer, clock) = issuer(sender.clone(), CodeFormat::FourDigit);

    let issued = issuer.issue("a@b.com").await;

    assert!(matches!(issued.delivery, CodeDelivery::Emailed { .. }));
    assert_eq!(issued.fallback_code(), None);
    assert_eq!(issued.issued_at, clock.now());
    assert_eq!(issued.expires_at - issued.issued_at, Duration::minutes(30));

    let sent = sender.last_message("a@b.com").unwrap();
    assert!(sent.html.contains(issued.code.as_str()));
    assert!(sent.text.as_deref().unwrap().contains(issued.code.as_str()));
    assert!(sent.headers.contains_key("X-Entity-Ref-ID"));
    assert_eq!(sender.last_code("a@b.com"), Some(issued.code.as_str().to_string()));
}

#[tokio::test]
async fn test_issue_falls_back_on_dispatch_failure() {
    let sender = Arc::new(MockEmailSender::new(true));
    let (issuer, _clock) = issuer(sender.clone(), CodeFormat::FourDigit);

    let issued = issuer.issue("a@b.com").await;

    assert_eq!(issued.delivery, CodeDelivery::Fallback);
    let fallback = issued.fallback_code().unwrap();
    assert_eq!(fallback.len(), 4);
    let number: u32 = fallback.parse().unwrap();
    assert!((1_000..=9_999).contains(&number));
    assert!(issued.code.matches(fallback));
}

#[tokio::test]
async fn test_six_digit_format() {
    let sender = Arc::new(MockEmailSender::new(false));
    let (issuer, _clock) = issuer(sender.clone(), CodeFormat::SixDigit);

    let issued = issuer.issue("a@b.com").await;

    assert_eq!(issued.code.as_str().len(), 6);
    let sent = sender.last_message("a@b.com").unwrap();
    assert!(sent.subject.contains("Verification Code"));
    assert_eq!(sender.last_code("a@b.com"), Some(issued.code.as_str().to_string()));
}
