//! Outcomes returned by the auth flow

use crate::domain::value_objects::app_route::AppRoute;
use crate::domain::value_objects::issued_code::CodeDelivery;
use crate::errors::VerificationError;
use crate::services::verification::VerificationSession;

/// What the screen should offer the user next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    /// Code was emailed; wait for input
    EnterCode,
    /// Email failed; display the fallback code
    ShowFallbackCode,
    /// Recoverable failure; let the user try again
    Retry,
    /// Session could not be re-established
    ReturnToSignIn,
}

/// Snapshot of the active verification handed to the verification screen
#[derive(Debug, Clone)]
pub struct VerificationPrompt {
    /// Copy of the verification as it stood when the prompt was built
    pub session: VerificationSession,
    /// `ShowFallbackCode` when the email could not be sent
    pub action: UserAction,
}

impl VerificationPrompt {
    pub fn from_session(session: &VerificationSession) -> Self {
        let action = match session.issued().delivery {
            CodeDelivery::Fallback => UserAction::ShowFallbackCode,
            CodeDelivery::Emailed { .. } => UserAction::EnterCode,
        };
        Self {
            session: session.clone(),
            action,
        }
    }

    pub fn email(&self) -> &str {
        &self.session.email
    }

    /// Code to show on screen when the email could not be sent
    pub fn fallback_code(&self) -> Option<&str> {
        self.session.issued().fallback_code()
    }
}

/// Result of `AuthFlow::sign_in`
#[derive(Debug, Clone)]
pub enum SignInOutcome {
    /// Verified, or the record store failed open
    Home,
    /// A code was issued; show the verification screen
    VerificationRequired(VerificationPrompt),
}

/// Result of `AuthFlow::sign_up`
#[derive(Debug, Clone)]
pub enum SignUpOutcome {
    /// New (or resumed unverified) account; a code was issued
    VerificationRequired(VerificationPrompt),
    /// A verified account already uses this email
    AccountExists,
}

/// Result of `AuthFlow::submit_code`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Account unlocked; `route` has been published
    Verified { route: AppRoute },
    /// Code refused or not yet confirmed by the gate; the verification stays active
    Rejected { error: VerificationError, action: UserAction },
    /// Credentials were lost; verification was discarded
    ReturnToSignIn,
}
