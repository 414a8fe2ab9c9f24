//! Tests for the in-memory verification record repository

use chrono::Utc;

use crate::domain::entities::verification_record::VerificationRecord;
use crate::errors::StoreError;
use crate::repositories::verification_record::{
    InMemoryVerificationRecordRepository, VerificationRecordRepository,
};

#[tokio::test]
async fn test_insert_and_find() {
    let repo = InMemoryVerificationRecordRepository::new();
    let record = VerificationRecord::new("user-1", "a@b.com", Utc::now());

    repo.insert(&record).await.unwrap();

    assert_eq!(repo.find_by_user("user-1").await.unwrap(), Some(record.clone()));
    assert_eq!(repo.find_by_email("A@B.com").await.unwrap(), Some(record));
    assert_eq!(repo.find_by_user("user-2").await.unwrap(), None);
}

#[tokio::test]
async fn test_duplicate_insert() {
    let repo = InMemoryVerificationRecordRepository::new();
    let record = VerificationRecord::new("user-1", "a@b.com", Utc::now());

    repo.insert(&record).await.unwrap();
    assert_eq!(repo.insert(&record).await, Err(StoreError::Duplicate));
}

#[tokio::test]
async fn test_mark_verified_is_idempotent_upsert() {
    let repo = InMemoryVerificationRecordRepository::new();
    let now = Utc::now();

    repo.mark_verified("user-1", "a@b.com", now).await.unwrap();
    repo.mark_verified("user-1", "a@b.com", now).await.unwrap();

    let record = repo.find_by_user("user-1").await.unwrap().unwrap();
    assert!(record.is_verified);
    assert_eq!(repo.len().await, 1);
}

#[tokio::test]
async fn test_unavailable() {
    let repo = InMemoryVerificationRecordRepository::new();
    repo.set_unavailable(true);

    let err = repo.find_by_user("user-1").await.unwrap_err();
    assert!(err.is_unavailable());

    repo.set_unavailable(false);
    assert!(repo.find_by_user("user-1").await.is_ok());
}
