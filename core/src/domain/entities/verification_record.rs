//! Persistent per-user verification record (`user_profile` row).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row per authenticated account; absence means "unverified, not yet provisioned"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationRecord {
    /// Auth account identifier, unique
    pub user_uuid: String,

    pub user_email: String,

    pub created_at: DateTime<Utc>,

    /// Flipped to `true` only by a successful code check
    pub is_verified: bool,
}

impl VerificationRecord {
    /// Creates an unverified record
    pub fn new(user_uuid: impl Into<String>, user_email: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            user_uuid: user_uuid.into(),
            user_email: user_email.into(),
            created_at,
            is_verified: false,
        }
    }

    /// Creates a record that is already verified (upsert path)
    pub fn verified(user_uuid: impl Into<String>, user_email: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            is_verified: true,
            ..Self::new(user_uuid, user_email, created_at)
        }
    }

    pub fn mark_verified(&mut self) {
        self.is_verified = true;
    }
}

/// Outcome of looking up a verification record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordLookup {
    Found(VerificationRecord),
    /// Normal outcome for a first-time user
    NotFound,
    /// Store unreachable or schema missing
    Unavailable(String),
    /// Store answered with an error that is not an outage (auth, corrupt row)
    Failed(String),
}

impl RecordLookup {
    pub fn record(&self) -> Option<&VerificationRecord> {
        match self {
            RecordLookup::Found(record) => Some(record),
            _ => None,
        }
    }
}
