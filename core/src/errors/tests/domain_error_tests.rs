//! Unit tests for domain error types

use aa_shared::validation::{validate_credentials, validate_password_confirmation};

use crate::errors::{AuthError, DomainError, StoreError, ValidationError, VerificationError};

#[test]
fn test_bridge_conversions() {
    let error: DomainError = AuthError::InvalidCredentials.into();
    assert!(matches!(error, DomainError::Auth(AuthError::InvalidCredentials)));

    let error: DomainError = StoreError::Duplicate.into();
    assert_eq!(error.to_string(), "Record already exists");

    let error: DomainError = VerificationError::CodeMismatch.into();
    assert_eq!(error.to_string(), "Invalid verification code");
}

#[test]
fn test_retry_after_minutes_rounds_up() {
    let error = VerificationError::RateLimited { retry_after_secs: 61 };
    assert_eq!(error.retry_after_minutes(), Some(2));

    let error = VerificationError::RateLimited { retry_after_secs: 900 };
    assert_eq!(error.retry_after_minutes(), Some(15));

    assert_eq!(VerificationError::CodeExpired.retry_after_minutes(), None);
}

#[test]
fn test_store_unavailable_flag() {
    let error = StoreError::Unavailable {
        reason: "relation \"user_profile\" does not exist".to_string(),
    };
    assert!(error.is_unavailable());
    assert!(!StoreError::Duplicate.is_unavailable());
}

#[test]
fn test_field_error_mapping() {
    let error: ValidationError = validate_credentials("", "secret1", 6).unwrap_err().into();
    assert_eq!(
        error,
        ValidationError::RequiredField {
            field: "email".to_string()
        }
    );

    let error: ValidationError = validate_credentials("a@b", "secret1", 6).unwrap_err().into();
    assert_eq!(error, ValidationError::InvalidEmail);

    let error: ValidationError = validate_credentials("a@b.com", "abc", 6).unwrap_err().into();
    assert_eq!(error, ValidationError::PasswordTooShort { min: 6 });

    let error: ValidationError = validate_password_confirmation("secret1", "secret2", 6)
        .unwrap_err()
        .into();
    assert_eq!(error, ValidationError::PasswordMismatch);
}
