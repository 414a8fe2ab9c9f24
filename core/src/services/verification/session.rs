//! Verification session state machine

use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use aa_shared::masking::mask_email;

use crate::domain::value_objects::issued_code::IssuedCode;
use crate::errors::VerificationError;

use super::types::{LeaveDecision, VerificationState};

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// State of one verification attempt, owned by the auth flow
#[derive(Clone)]
pub struct VerificationSession {
    id: u64,
    pub email: String,
    /// Known once the account exists
    pub user_id: Option<String>,
    /// Kept to re-establish the auth session after the code is accepted
    password: Option<String>,
    issued: IssuedCode,
    /// Last code the user submitted
    pub entered_code: Option<String>,
    /// Codes re-sent since the verification started
    pub resend_count: u32,
    pub last_resend_at: Option<DateTime<Utc>>,
    state: VerificationState,
    last_error: Option<VerificationError>,
}

impl VerificationSession {
    /// Start a verification awaiting `issued`
    ///
    /// # Arguments
    /// * `email` - Address the code was sent to
    /// * `user_id` - Account id, when already known
    /// * `password` - Sign-in password, kept until the code is accepted
    /// * `issued` - The code and how it was delivered
    pub fn new(
        email: impl Into<String>,
        user_id: Option<String>,
        password: Option<String>,
        issued: IssuedCode,
    ) -> Self {
        Self {
            id: NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed),
            email: email.into(),
            user_id,
            password,
            issued,
            entered_code: None,
            resend_count: 0,
            last_resend_at: None,
            state: VerificationState::AwaitingCode,
            last_error: None,
        }
    }

    /// Distinguishes this attempt from any later one for the same email
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn state(&self) -> VerificationState {
        self.state
    }

    pub fn issued(&self) -> &IssuedCode {
        &self.issued
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    pub fn last_error(&self) -> Option<&VerificationError> {
        self.last_error.as_ref()
    }

    /// Check an entered code.
    ///
    /// On success the session is left in `Verifying` until `complete` or
    /// `abort_verifying`; on failure it is back in `AwaitingCode` with the error recorded.
    pub fn begin_check(
        &mut self,
        entered: &str,
        now: DateTime<Utc>,
        enforce_expiry: bool,
    ) -> Result<(), VerificationError> {
        if self.state != VerificationState::AwaitingCode {
            return Err(VerificationError::InvalidState {
                state: self.state.to_string(),
            });
        }

        let entered = entered.trim();
        if entered.is_empty() {
            return self.reject(VerificationError::EmptyCode);
        }

        self.entered_code = Some(entered.to_string());
        self.state = VerificationState::Verifying;

        if enforce_expiry && self.issued.is_expired_at(now) {
            return self.reject(VerificationError::CodeExpired);
        }
        if !self.issued.code.matches(entered) {
            tracing::info!(
                email = %mask_email(&self.email),
                event = "verification_code_mismatch",
                "Entered code does not match"
            );
            return self.reject(VerificationError::CodeMismatch);
        }

        self.last_error = None;
        Ok(())
    }

    /// Post-match steps failed; return to `AwaitingCode` with `error` recorded
    pub fn abort_verifying(&mut self, error: VerificationError) {
        if self.state == VerificationState::Verifying {
            self.state = VerificationState::AwaitingCode;
        }
        self.last_error = Some(error);
    }

    pub fn complete(&mut self) {
        self.state = VerificationState::Verified;
        self.last_error = None;
        self.password = None;
    }

    /// Replace the issued code after a resend
    pub fn supersede(&mut self, issued: IssuedCode, now: DateTime<Utc>) {
        self.issued = issued;
        self.entered_code = None;
        self.resend_count = self.resend_count.saturating_add(1);
        self.last_resend_at = Some(now);
        self.last_error = None;
        if self.state == VerificationState::Verifying {
            self.state = VerificationState::AwaitingCode;
        }
    }

    /// Back navigation while a code is pending needs confirmation
    pub fn leave_decision(&self) -> LeaveDecision {
        match self.state {
            VerificationState::AwaitingCode | VerificationState::Verifying => {
                LeaveDecision::ConfirmationRequired
            }
            VerificationState::Verified => LeaveDecision::Allowed,
        }
    }

    fn reject(&mut self, error: VerificationError) -> Result<(), VerificationError> {
        self.state = VerificationState::AwaitingCode;
        self.last_error = Some(error.clone());
        Err(error)
    }
}

impl fmt::Debug for VerificationSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerificationSession")
            .field("id", &self.id)
            .field("email", &mask_email(&self.email))
            .field("user_id", &self.user_id)
            .field("has_password", &self.password.is_some())
            .field("delivery", &self.issued.delivery)
            .field("resend_count", &self.resend_count)
            .field("state", &self.state)
            .field("last_error", &self.last_error)
            .finish()
    }
}
