//! MySQL implementation of the VerificationRecordRepository trait.
//!
//! Server error 1146 (no such table) is reported as `StoreError::Unavailable`
//! so the gate can apply its failure policy; 1062 (duplicate entry) as
//! `StoreError::Duplicate`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::mysql::{MySqlDatabaseError, MySqlRow};
use sqlx::{MySqlPool, Row};

use aa_core::errors::StoreError;
use aa_core::{VerificationRecord, VerificationRecordRepository};
use aa_shared::masking::mask_email;

use crate::InfrastructureError;

const ER_DUP_ENTRY: u16 = 1062;
const ER_NO_SUCH_TABLE: u16 = 1146;

/// Map a SQLx error to the store taxonomy
pub(crate) fn map_db_error(error: sqlx::Error) -> StoreError {
    match &error {
        sqlx::Error::Database(db) => {
            match db.try_downcast_ref::<MySqlDatabaseError>().map(|e| e.number()) {
                Some(ER_NO_SUCH_TABLE) => StoreError::Unavailable {
                    reason: db.message().to_string(),
                },
                Some(ER_DUP_ENTRY) => StoreError::Duplicate,
                _ => StoreError::Backend {
                    message: db.message().to_string(),
                },
            }
        }
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StoreError::Unavailable {
            reason: error.to_string(),
        },
        _ => StoreError::Backend {
            message: error.to_string(),
        },
    }
}

/// Table names are interpolated into SQL, so only plain identifiers are accepted
pub(crate) fn is_valid_table_name(table: &str) -> bool {
    !table.is_empty()
        && table.len() <= 64
        && table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// MySQL implementation of VerificationRecordRepository
pub struct MySqlVerificationRecordRepository {
    pool: MySqlPool,
    table: String,
}

impl MySqlVerificationRecordRepository {
    pub fn new(pool: MySqlPool, table: impl Into<String>) -> Result<Self, InfrastructureError> {
        let table = table.into();
        if !is_valid_table_name(&table) {
            return Err(InfrastructureError::Config(format!(
                "Invalid table name: {}",
                table
            )));
        }
        Ok(Self { pool, table })
    }

    /// Create the table if it does not exist
    pub async fn ensure_table(&self) -> Result<(), InfrastructureError> {
        let query = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                user_uuid VARCHAR(64) NOT NULL PRIMARY KEY,
                user_email VARCHAR(320) NOT NULL,
                created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                is_verified BOOLEAN NOT NULL DEFAULT FALSE,
                INDEX idx_user_email (user_email)
            )
            "#,
            self.table
        );
        sqlx::query(&query).execute(&self.pool).await?;
        tracing::info!(table = %self.table, "Verification table ready");
        Ok(())
    }

    fn row_to_record(row: &MySqlRow) -> Result<VerificationRecord, StoreError> {
        let corrupt = |e: sqlx::Error| StoreError::Corrupt {
            message: e.to_string(),
        };
        Ok(VerificationRecord {
            user_uuid: row.try_get("user_uuid").map_err(corrupt)?,
            user_email: row.try_get("user_email").map_err(corrupt)?,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at").map_err(corrupt)?,
            is_verified: row.try_get("is_verified").map_err(corrupt)?,
        })
    }

    async fn find_where(&self, column: &str, value: &str) -> Result<Option<VerificationRecord>, StoreError> {
        let query = format!(
            "SELECT user_uuid, user_email, created_at, is_verified FROM {} WHERE {} = ? LIMIT 1",
            self.table, column
        );
        let row = sqlx::query(&query)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?;

        row.as_ref().map(Self::row_to_record).transpose()
    }
}

#[async_trait]
impl VerificationRecordRepository for MySqlVerificationRecordRepository {
    async fn find_by_user(&self, user_uuid: &str) -> Result<Option<VerificationRecord>, StoreError> {
        self.find_where("user_uuid", user_uuid).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<VerificationRecord>, StoreError> {
        self.find_where("user_email", email).await
    }

    async fn insert(&self, record: &VerificationRecord) -> Result<(), StoreError> {
        let query = format!(
            "INSERT INTO {} (user_uuid, user_email, created_at, is_verified) VALUES (?, ?, ?, ?)",
            self.table
        );
        sqlx::query(&query)
            .bind(&record.user_uuid)
            .bind(&record.user_email)
            .bind(record.created_at)
            .bind(record.is_verified)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        tracing::debug!(
            user_id = %record.user_uuid,
            email = %mask_email(&record.user_email),
            "Inserted verification record"
        );
        Ok(())
    }

    async fn mark_verified(
        &self,
        user_uuid: &str,
        user_email: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let query = format!(
            r#"
            INSERT INTO {} (user_uuid, user_email, created_at, is_verified)
            VALUES (?, ?, ?, TRUE)
            ON DUPLICATE KEY UPDATE is_verified = TRUE, user_email = VALUES(user_email)
            "#,
            self.table
        );
        sqlx::query(&query)
            .bind(user_uuid)
            .bind(user_email)
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;
        Ok(())
    }
}
