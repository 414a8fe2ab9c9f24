//! Verification status store implementation

use std::sync::Arc;

use aa_shared::masking::mask_email;

use crate::domain::entities::verification_record::{RecordLookup, VerificationRecord};
use crate::errors::{DomainResult, StoreError};
use crate::repositories::VerificationRecordRepository;
use crate::services::clock::Clock;

/// Reads and writes per-user verification records, creating them lazily
#[derive(Clone)]
pub struct VerificationStatusStore {
    repository: Arc<dyn VerificationRecordRepository>,
    clock: Arc<dyn Clock>,
}

impl VerificationStatusStore {
    pub fn new(repository: Arc<dyn VerificationRecordRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// Look up the record for an account. Not-found is a normal outcome.
    ///
    /// # Returns
    /// * `Unavailable` for an outage (unreachable store, missing table)
    /// * `Failed` for any other store error
    pub async fn lookup(&self, user_id: &str) -> RecordLookup {
        match self.repository.find_by_user(user_id).await {
            Ok(record) => Self::to_lookup(record),
            Err(e) => {
                tracing::warn!(
                    user_id = user_id,
                    error = %e,
                    event = "verification_lookup_failed",
                    "Verification record lookup failed"
                );
                Self::failed_lookup(e)
            }
        }
    }

    /// Look up a record by email (sign-up duplicate detection)
    pub async fn lookup_by_email(&self, email: &str) -> RecordLookup {
        match self.repository.find_by_email(email.trim()).await {
            Ok(record) => Self::to_lookup(record),
            Err(e) => {
                tracing::warn!(
                    email = %mask_email(email),
                    error = %e,
                    event = "verification_lookup_failed",
                    "Verification record lookup by email failed"
                );
                Self::failed_lookup(e)
            }
        }
    }

    /// Provision an unverified record.
    ///
    /// A duplicate key is swallowed: the existing record is re-read and returned
    /// when possible, otherwise the record that would have been created.
    pub async fn create(&self, user_id: &str, email: &str) -> DomainResult<VerificationRecord> {
        let record = VerificationRecord::new(user_id, email.trim(), self.clock.now());

        match self.repository.insert(&record).await {
            Ok(()) => {
                tracing::info!(
                    user_id = user_id,
                    email = %mask_email(email),
                    event = "verification_record_created",
                    "Created unverified record"
                );
                Ok(record)
            }
            Err(StoreError::Duplicate) => {
                tracing::debug!(
                    user_id = user_id,
                    event = "verification_record_exists",
                    "Record already provisioned"
                );
                match self.repository.find_by_user(user_id).await {
                    Ok(Some(existing)) => Ok(existing),
                    _ => Ok(record),
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Mark an account verified, provisioning it verified if missing. Idempotent.
    pub async fn mark_verified(&self, user_id: &str, email: &str) -> DomainResult<()> {
        self.repository
            .mark_verified(user_id, email.trim(), self.clock.now())
            .await?;
        tracing::info!(
            user_id = user_id,
            email = %mask_email(email),
            event = "verification_record_verified",
            "Account marked verified"
        );
        Ok(())
    }

    /// Only an outage is `Unavailable`; anything else must not reach the fail-open policy
    fn failed_lookup(error: StoreError) -> RecordLookup {
        if error.is_unavailable() {
            RecordLookup::Unavailable(error.to_string())
        } else {
            RecordLookup::Failed(error.to_string())
        }
    }

    fn to_lookup(record: Option<VerificationRecord>) -> RecordLookup {
        match record {
            Some(record) => RecordLookup::Found(record),
            None => RecordLookup::NotFound,
        }
    }
}
