//! Common validation utilities

use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex is valid")
});

/// Field-level validation failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Check if an email address looks deliverable
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email.trim())
}

/// Lower-case and trim an email address so that keys derived from it are stable
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate a sign-in / sign-up form
pub fn validate_credentials(
    email: &str,
    password: &str,
    min_password_length: usize,
) -> Result<(), FieldError> {
    if email.trim().is_empty() {
        return Err(FieldError::new("email", "Email is required"));
    }
    if !is_valid_email(email) {
        return Err(FieldError::new("email", "Invalid email address"));
    }
    validate_password(password, min_password_length)
}

/// Validate a password against the minimum length
pub fn validate_password(password: &str, min_length: usize) -> Result<(), FieldError> {
    if password.is_empty() {
        return Err(FieldError::new("password", "Password is required"));
    }
    if password.chars().count() < min_length {
        return Err(FieldError::new(
            "password",
            format!("Password must be at least {} characters", min_length),
        ));
    }
    Ok(())
}

/// Validate that a password and its confirmation match
pub fn validate_password_confirmation(
    password: &str,
    confirmation: &str,
    min_length: usize,
) -> Result<(), FieldError> {
    validate_password(password, min_length)?;
    if password != confirmation {
        return Err(FieldError::new("repeat_password", "Passwords do not match"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("a@b.com"));
        assert!(is_valid_email("  parent.one@clinic.co.id "));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("no at sign.com"));
        assert!(!is_valid_email("a b@c.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  A@B.Com "), "a@b.com");
    }

    #[test]
    fn test_credentials() {
        assert!(validate_credentials("a@b.com", "secret1", 6).is_ok());
        assert_eq!(validate_credentials("", "secret1", 6).unwrap_err().field, "email");
        assert_eq!(validate_credentials("a@b.com", "abc", 6).unwrap_err().field, "password");
    }

    #[test]
    fn test_password_confirmation() {
        assert!(validate_password_confirmation("secret1", "secret1", 6).is_ok());
        let err = validate_password_confirmation("secret1", "secret2", 6).unwrap_err();
        assert_eq!(err.field, "repeat_password");
    }
}
