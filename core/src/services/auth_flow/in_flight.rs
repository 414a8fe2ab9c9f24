//! Guard against concurrent code dispatches for the same email

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use aa_shared::validation::normalize_email;

use crate::domain::value_objects::issued_code::CodePurpose;

/// Set of (purpose, email) pairs with a dispatch in progress
#[derive(Clone, Default)]
pub struct InFlightDispatches {
    keys: Arc<Mutex<HashSet<String>>>,
}

impl InFlightDispatches {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the dispatch slot, or `None` if one is already running
    pub fn try_acquire(&self, purpose: CodePurpose, email: &str) -> Option<DispatchGuard> {
        let key = format!("{}:{}", purpose.as_str(), normalize_email(email));
        let mut keys = self.keys.lock().unwrap_or_else(PoisonError::into_inner);
        if !keys.insert(key.clone()) {
            return None;
        }
        Some(DispatchGuard {
            keys: Arc::clone(&self.keys),
            key,
        })
    }

    pub fn is_in_flight(&self, purpose: CodePurpose, email: &str) -> bool {
        let key = format!("{}:{}", purpose.as_str(), normalize_email(email));
        self.keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&key)
    }
}

/// Releases the slot on drop
pub struct DispatchGuard {
    keys: Arc<Mutex<HashSet<String>>>,
    key: String,
}

impl Drop for DispatchGuard {
    fn drop(&mut self) {
        self.keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_rejected_until_drop() {
        let in_flight = InFlightDispatches::new();

        let guard = in_flight.try_acquire(CodePurpose::EmailVerification, "a@b.com");
        assert!(guard.is_some());
        assert!(in_flight
            .try_acquire(CodePurpose::EmailVerification, " A@B.com")
            .is_none());
        assert!(in_flight
            .try_acquire(CodePurpose::PasswordReset, "a@b.com")
            .is_some());

        drop(guard);
        assert!(!in_flight.is_in_flight(CodePurpose::EmailVerification, "a@b.com"));
        assert!(in_flight
            .try_acquire(CodePurpose::EmailVerification, "a@b.com")
            .is_some());
    }
}
