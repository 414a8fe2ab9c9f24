//! Verification session: ephemeral state for one verification attempt
//!
//! States move `AwaitingCode -> Verifying -> Verified`; a rejected code drops
//! back to `AwaitingCode` with a visible error.

mod session;
mod types;


pub use session::VerificationSession;
pub use types::{LeaveDecision, VerificationState};
