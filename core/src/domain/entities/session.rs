//! Authenticated user session as reported by the auth collaborator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Read-only copy of the auth provider's session
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSession {
    /// Opaque identifier, stable per account
    pub user_id: String,

    pub email: String,

    pub access_token: String,

    pub refresh_token: Option<String>,

    /// `None` means the provider did not report an expiry
    pub expires_at: Option<DateTime<Utc>>,
}

impl UserSession {
    pub fn new(
        user_id: impl Into<String>,
        email: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            email: email.into(),
            access_token: access_token.into(),
            refresh_token: None,
            expires_at: None,
        }
    }

    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// A session whose expiry has passed is treated as absent
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|expires_at| expires_at <= now).unwrap_or(false)
    }
}

impl fmt::Debug for UserSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserSession")
            .field("user_id", &self.user_id)
            .field("email", &aa_shared::masking::mask_email(&self.email))
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

/// Account created by a sign-up call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedUpUser {
    pub user_id: String,
    pub email: String,
    /// Present when the provider signs the user in immediately
    pub session: Option<UserSession>,
}
