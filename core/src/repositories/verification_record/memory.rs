//! In-memory verification record repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::entities::verification_record::VerificationRecord;
use crate::errors::StoreError;

use super::trait_::VerificationRecordRepository;

/// Verification records kept in process memory.
///
/// `set_unavailable(true)` makes every call fail as if the table were missing.
#[derive(Clone, Default)]
pub struct InMemoryVerificationRecordRepository {
    records: Arc<RwLock<HashMap<String, VerificationRecord>>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryVerificationRecordRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable {
                reason: "relation \"user_profile\" does not exist".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl VerificationRecordRepository for InMemoryVerificationRecordRepository {
    async fn find_by_user(&self, user_uuid: &str) -> Result<Option<VerificationRecord>, StoreError> {
        self.check_available()?;
        Ok(self.records.read().await.get(user_uuid).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<VerificationRecord>, StoreError> {
        self.check_available()?;
        let email = email.trim().to_lowercase();
        Ok(self
            .records
            .read()
            .await
            .values()
            .find(|r| r.user_email.to_lowercase() == email)
            .cloned())
    }

    async fn insert(&self, record: &VerificationRecord) -> Result<(), StoreError> {
        self.check_available()?;
        let mut records = self.records.write().await;
        if records.contains_key(&record.user_uuid) {
            return Err(StoreError::Duplicate);
        }
        records.insert(record.user_uuid.clone(), record.clone());
        Ok(())
    }

    async fn mark_verified(
        &self,
        user_uuid: &str,
        user_email: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.check_available()?;
        let mut records = self.records.write().await;
        records
            .entry(user_uuid.to_string())
            .and_modify(|r| r.mark_verified())
            .or_insert_with(|| VerificationRecord::verified(user_uuid, user_email, at));
        Ok(())
    }
}
