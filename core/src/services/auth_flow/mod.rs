//! Auth flow coordinator
//!
//! Single owner of the verification state machine: sign-in, sign-up, app
//! start, session events, resend, code submission, abandonment, onboarding
//! and password reset. Publishes the current route on a watch channel.

mod config;
mod coordinator;
mod in_flight;
mod password_reset;
mod types;

#[cfg(test)]
mod tests;

pub use config::{AuthFlowConfig, ONBOARDING_COMPLETED_KEY, PASSWORD_RESET_PURPOSE, RESEND_PURPOSE};
pub use coordinator::{AuthFlow, Collaborators};
pub use in_flight::{DispatchGuard, InFlightDispatches};
pub use password_reset::{PasswordResetPrompt, PasswordResetSession};
pub use types::{SignInOutcome, SignUpOutcome, SubmitOutcome, UserAction, VerificationPrompt};
