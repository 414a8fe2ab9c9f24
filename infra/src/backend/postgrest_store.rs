//! Verification records in the hosted `user_profile` table via PostgREST
//!
//! Error codes:
//! - `PGRST116` (no rows for a single-object request) -> not found
//! - `42P01` / `PGRST205` (table missing) -> `StoreError::Unavailable`
//! - `23505` (unique violation) -> `StoreError::Duplicate`

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use aa_core::errors::StoreError;
use aa_core::{VerificationRecord, VerificationRecordRepository};
use aa_shared::masking::mask_email;
use aa_shared::BackendConfig;

use super::client::BackendClient;
use super::supabase_auth::SupabaseAuthProvider;
use crate::InfrastructureError;

const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

#[derive(Debug, Default, Deserialize)]
struct PostgrestError {
    code: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ProfileRow {
    user_uuid: String,
    user_email: String,
    #[serde(default = "Utc::now")]
    created_at: DateTime<Utc>,
    #[serde(default)]
    is_verified: bool,
}

impl From<ProfileRow> for VerificationRecord {
    fn from(row: ProfileRow) -> Self {
        VerificationRecord {
            user_uuid: row.user_uuid,
            user_email: row.user_email,
            created_at: row.created_at,
            is_verified: row.is_verified,
        }
    }
}

impl From<&VerificationRecord> for ProfileRow {
    fn from(record: &VerificationRecord) -> Self {
        ProfileRow {
            user_uuid: record.user_uuid.clone(),
            user_email: record.user_email.clone(),
            created_at: record.created_at,
            is_verified: record.is_verified,
        }
    }
}

/// Map a PostgREST error response to the store taxonomy
pub(crate) fn map_store_error(status: StatusCode, body: &str) -> StoreError {
    let error: PostgrestError = serde_json::from_str(body).unwrap_or_default();
    let message = error.message.unwrap_or_else(|| body.to_string());
    match error.code.as_deref() {
        Some("42P01") | Some("PGRST205") => StoreError::Unavailable { reason: message },
        Some("23505") => StoreError::Duplicate,
        _ if status.is_server_error() => StoreError::Unavailable {
            reason: format!("{}: {}", status.as_u16(), message),
        },
        _ => StoreError::Backend {
            message: format!("{}: {}", status.as_u16(), message),
        },
    }
}

fn transport_error(e: reqwest::Error) -> StoreError {
    InfrastructureError::Http(e).into()
}

/// `VerificationRecordRepository` backed by the hosted REST API
pub struct PostgrestVerificationRecordRepository {
    client: BackendClient,
    table: String,
    auth: Option<Arc<SupabaseAuthProvider>>,
}

impl PostgrestVerificationRecordRepository {
    pub fn new(config: BackendConfig) -> Result<Self, InfrastructureError> {
        let table = config.profile_table.clone();
        Ok(Self {
            client: BackendClient::new(config)?,
            table,
            auth: None,
        })
    }

    /// Send requests with the signed-in user's token so row-level policies apply
    pub fn with_auth(mut self, auth: Arc<SupabaseAuthProvider>) -> Self {
        self.auth = Some(auth);
        self
    }

    async fn request(&self, method: Method) -> RequestBuilder {
        let token = match &self.auth {
            Some(auth) => auth.access_token().await,
            None => None,
        };
        self.client.rest(method, &self.table, token.as_deref())
    }

    async fn find_one(&self, column: &str, value: &str) -> Result<Option<VerificationRecord>, StoreError> {
        let filter = format!("eq.{}", value);
        let response = self
            .request(Method::GET)
            .await
            .query(&[("select", "*"), (column, filter.as_str())])
            .header("Accept", SINGLE_OBJECT)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status.is_success() {
            let row: ProfileRow = response.json().await.map_err(|e| StoreError::Corrupt {
                message: e.to_string(),
            })?;
            return Ok(Some(row.into()));
        }

        let body = response.text().await.unwrap_or_default();
        let error: PostgrestError = serde_json::from_str(&body).unwrap_or_default();
        if error.code.as_deref() == Some("PGRST116") {
            return Ok(None);
        }
        Err(map_store_error(status, &body))
    }

    async fn check(response: Response) -> Result<(), StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(map_store_error(status, &body))
    }
}

#[async_trait]
impl VerificationRecordRepository for PostgrestVerificationRecordRepository {
    async fn find_by_user(&self, user_uuid: &str) -> Result<Option<VerificationRecord>, StoreError> {
        self.find_one("user_uuid", user_uuid).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<VerificationRecord>, StoreError> {
        self.find_one("user_email", email).await
    }

    async fn insert(&self, record: &VerificationRecord) -> Result<(), StoreError> {
        let response = self
            .request(Method::POST)
            .await
            .header("Prefer", "return=minimal")
            .json(&ProfileRow::from(record))
            .send()
            .await
            .map_err(transport_error)?;
        Self::check(response).await?;

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
        // Upsert on the primary key leaves created_at of an existing row alone
        let response = self
            .request(Method::POST)
            .await
            .query(&[("on_conflict", "user_uuid")])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&serde_json::json!({
                "user_uuid": user_uuid,
                "user_email": user_email,
                "is_verified": true,
            }))
            .send()
            .await
            .map_err(transport_error)?;
        Self::check(response).await?;

        tracing::debug!(user_id = %user_uuid, at = %at, "Marked record verified");
        Ok(())
    }
}
