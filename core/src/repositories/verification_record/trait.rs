//! Verification record repository trait.
//!
//! Implementations back the `user_profile` table. Infrastructure failures
//! (store unreachable, table missing) must be reported as
//! `StoreError::Unavailable` so the gate can apply its failure policy.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::entities::verification_record::VerificationRecord;
use crate::errors::StoreError;

#[async_trait]
pub trait VerificationRecordRepository: Send + Sync {
    /// Find the record for an auth account
    ///
    /// # Returns
    /// * `Ok(Some(record))` - Record found
    /// * `Ok(None)` - No record yet (first-time user)
    /// * `Err(StoreError::Unavailable)` - Store unreachable or schema missing
    async fn find_by_user(&self, user_uuid: &str) -> Result<Option<VerificationRecord>, StoreError>;

    /// Find a record by email, used by sign-up to detect existing accounts
    async fn find_by_email(&self, email: &str) -> Result<Option<VerificationRecord>, StoreError>;

    /// Insert a new record
    ///
    /// # Returns
    /// * `Err(StoreError::Duplicate)` - A record for `user_uuid` already exists
    async fn insert(&self, record: &VerificationRecord) -> Result<(), StoreError>;

    /// Set `is_verified = true`, provisioning the record if it does not exist.
    ///
    /// Must be idempotent.
    async fn mark_verified(
        &self,
        user_uuid: &str,
        user_email: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}
