//! Domain entities representing core business objects.

pub mod resend_counter;
pub mod session;
pub mod verification_code;
pub mod verification_record;


// Re-export commonly used types
pub use resend_counter::ResendCounterState;
pub use session::{SignedUpUser, UserSession};
pub use verification_code::{CodeFormat, VerificationCode, DEFAULT_CODE_TTL_MINUTES};
pub use verification_record::{RecordLookup, VerificationRecord};
