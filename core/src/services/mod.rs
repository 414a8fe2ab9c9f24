//! Business services containing the verification and gating logic.

pub mod auth_flow;
pub mod clock;
pub mod code_issuer;
pub mod gate;
pub mod rate_limiter;
pub mod session;
pub mod verification;
pub mod verification_status;

#[cfg(test)]
pub(crate) mod mocks;

// Re-export commonly used types
pub use auth_flow::{
    AuthFlow, AuthFlowConfig, Collaborators, PasswordResetPrompt, SignInOutcome, SignUpOutcome,
    SubmitOutcome, UserAction, VerificationPrompt,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use code_issuer::{CodeIssuer, CodeIssuerConfig, EmailMessage, EmailSenderTrait};
pub use gate::{decide, GateEvaluation, GateEvaluator};
pub use rate_limiter::{RateLimitStatus, ResendRateLimiter};
pub use session::{AuthProvider, SessionResolver};
pub use verification::{LeaveDecision, VerificationSession, VerificationState};
pub use verification_status::VerificationStatusStore;
