//! Password reset through the auth provider's recovery codes
//!
//! The provider emails the code and exchanges it for a recovery session; the
//! new password is set with that session, which is then signed out so the
//! user signs in again with the new password.

use chrono::{DateTime, Duration, Utc};
use std::fmt;

use aa_shared::masking::mask_email;
use aa_shared::validation::{is_valid_email, validate_password_confirmation};

use crate::domain::value_objects::app_route::AppRoute;
use crate::domain::value_objects::issued_code::CodePurpose;
use crate::errors::{AuthError, DomainResult, ValidationError, VerificationError};
use crate::services::rate_limiter::RateLimitStatus;

use super::coordinator::AuthFlow;
use super::types::UserAction;

/// A pending password reset
#[derive(Clone)]
pub struct PasswordResetSession {
    pub email: String,
    /// When the provider accepted the recovery request
    pub requested_at: DateTime<Utc>,
    /// Codes entered after this are refused without asking the provider
    pub expires_at: DateTime<Utc>,
    code_verified: bool,
}

impl PasswordResetSession {
    pub fn new(email: impl Into<String>, requested_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            email: email.into(),
            requested_at,
            expires_at: requested_at + ttl,
            code_verified: false,
        }
    }

    /// True once the provider accepted the code and holds a recovery session
    pub fn is_code_verified(&self) -> bool {
        self.code_verified
    }
}

impl fmt::Debug for PasswordResetSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordResetSession")
            .field("email", &mask_email(&self.email))
            .field("expires_at", &self.expires_at)
            .field("code_verified", &self.code_verified)
            .finish()
    }
}

/// Returned by `request_password_reset`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordResetPrompt {
    pub email: String,
    pub expires_at: DateTime<Utc>,
    /// Requests left in the current window
    pub remaining_attempts: u32,
    pub action: UserAction,
}

impl AuthFlow {
    /// Ask the provider to email a recovery code, subject to the password-reset limit.
    ///
    /// # Arguments
    /// * `email` - Account address; whitespace is trimmed
    ///
    /// # Errors
    /// * `ValidationError` for a blank or malformed address
    /// * `VerificationError::DispatchInProgress` while a request for the same address runs
    /// * `VerificationError::RateLimited` once the window's requests are used up
    /// * `AuthError` when the provider refuses the request; nothing is counted then
    pub async fn request_password_reset(&self, email: &str) -> DomainResult<PasswordResetPrompt> {
        let email = email.trim();
        if email.is_empty() {
            return Err(ValidationError::RequiredField {
                field: "email".to_string(),
            }
            .into());
        }
        if !is_valid_email(email) {
            return Err(ValidationError::InvalidEmail.into());
        }

        let _guard = self
            .in_flight
            .try_acquire(CodePurpose::PasswordReset, email)
            .ok_or(VerificationError::DispatchInProgress)?;

        let status = self.reset_limiter.status(email).await;
        if let Err(e) = status.into_result() {
            tracing::warn!(
                email = %mask_email(email),
                retry_after_secs = status.retry_after_secs(),
                event = "password_reset_rate_limited",
                "Password reset rejected by rate limit"
            );
            return Err(e.into());
        }

        self.auth.reset_password_for_email(email).await.map_err(|e| {
            tracing::warn!(
                email = %mask_email(email),
                error = %e,
                event = "password_reset_request_failed",
                "Provider refused the recovery request"
            );
            e
        })?;

        let remaining_attempts = match self.reset_limiter.record_attempt(email).await {
            Ok(RateLimitStatus::Allowed { remaining }) => remaining,
            Ok(RateLimitStatus::Limited { .. }) => 0,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to record password reset attempt");
                self.reset_limiter.policy().max_attempts.saturating_sub(1)
            }
        };

        let session = PasswordResetSession::new(
            email,
            self.clock.now(),
            Duration::minutes(self.config.code_ttl_minutes),
        );
        let prompt = PasswordResetPrompt {
            email: email.to_string(),
            expires_at: session.expires_at,
            remaining_attempts,
            action: UserAction::EnterCode,
        };
        *self.reset.lock().await = Some(session);

        tracing::info!(
            email = %mask_email(email),
            remaining_attempts = remaining_attempts,
            event = "password_reset_requested",
            "Password reset code requested"
        );
        Ok(prompt)
    }

    /// Exchange the emailed recovery code for a recovery session
    pub async fn verify_reset_code(&self, code: &str) -> DomainResult<()> {
        let now = self.clock.now();
        let (email, expires_at) = {
            let reset = self.reset.lock().await;
            let session = reset.as_ref().ok_or(VerificationError::NoActiveSession)?;
            (session.email.clone(), session.expires_at)
        };

        let code = code.trim();
        if code.is_empty() {
            return Err(VerificationError::EmptyCode.into());
        }
        if self.config.enforce_code_expiry && now > expires_at {
            return Err(VerificationError::CodeExpired.into());
        }

        match self.auth.verify_recovery_code(&email, code).await {
            Ok(_) => {}
            Err(AuthError::RecoveryCodeRejected) => {
                tracing::info!(
                    email = %mask_email(&email),
                    event = "password_reset_code_rejected",
                    "Recovery code rejected"
                );
                return Err(VerificationError::CodeMismatch.into());
            }
            Err(e) => return Err(e.into()),
        }

        let mut reset = self.reset.lock().await;
        match reset.as_mut() {
            Some(session) if session.email == email => {
                session.code_verified = true;
                Ok(())
            }
            _ => Err(VerificationError::NoActiveSession.into()),
        }
    }

    /// Set the new password with the recovery session, then sign it out.
    ///
    /// # Arguments
    /// * `new_password` - Replacement password, at least the configured minimum length
    /// * `confirm_password` - Must equal `new_password`
    ///
    /// # Returns
    /// `AppRoute::SignIn`, also published as the current route.
    pub async fn complete_password_reset(
        &self,
        new_password: &str,
        confirm_password: &str,
    ) -> DomainResult<AppRoute> {
        let email = {
            let reset = self.reset.lock().await;
            let session = reset.as_ref().ok_or(VerificationError::NoActiveSession)?;
            if !session.code_verified {
                return Err(VerificationError::ResetNotVerified.into());
            }
            session.email.clone()
        };

        validate_password_confirmation(
            new_password,
            confirm_password,
            self.config.min_password_length,
        )
        .map_err(ValidationError::from)?;

        match self.auth.update_password(new_password).await {
            Ok(()) => {}
            Err(AuthError::SamePassword) => return Err(VerificationError::SamePassword.into()),
            Err(e) => {
                tracing::warn!(
                    email = %mask_email(&email),
                    error = %e,
                    event = "password_update_failed",
                    "Provider refused the new password"
                );
                return Err(e.into());
            }
        }

        if let Err(e) = self.auth.sign_out().await {
            tracing::warn!(error = %e, "Sign-out of recovery session failed");
        }
        if let Err(e) = self.reset_limiter.reset(&email).await {
            tracing::warn!(error = %e, "Failed to clear password reset counter");
        }
        *self.reset.lock().await = None;

        tracing::info!(
            email = %mask_email(&email),
            event = "password_reset_completed",
            "Password updated"
        );
        self.set_route(AppRoute::SignIn);
        Ok(AppRoute::SignIn)
    }

    /// Copy of the pending password reset, if any
    pub async fn password_reset_session(&self) -> Option<PasswordResetSession> {
        self.reset.lock().await.clone()
    }
}
