//! Hosted auth provider over the GoTrue REST API
//!
//! Keeps the current session in memory and publishes every transition on a
//! broadcast channel. Expired sessions are refreshed on `get_session` when a
//! refresh token is available.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::{Method, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::{broadcast, RwLock};

use aa_core::{AuthError, AuthEvent, AuthProvider, SignedUpUser, UserSession};
use aa_shared::masking::mask_email;
use aa_shared::BackendConfig;

use super::client::BackendClient;
use crate::InfrastructureError;

const EVENT_CAPACITY: usize = 32;

#[derive(Debug, Deserialize)]
struct GoTrueUser {
    id: String,
    email: Option<String>,
    /// Empty when sign-up hit an existing address with confirmations enabled
    identities: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
struct GoTrueSession {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    expires_at: Option<i64>,
    user: GoTrueUser,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(GoTrueSession),
    User(GoTrueUser),
}

#[derive(Debug, Default, Deserialize)]
struct GoTrueError {
    error: Option<String>,
    error_code: Option<String>,
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
}

impl GoTrueError {
    fn text(&self) -> String {
        self.msg
            .as_ref()
            .or(self.error_description.as_ref())
            .or(self.message.as_ref())
            .or(self.error.as_ref())
            .cloned()
            .unwrap_or_default()
    }
}

/// Map a GoTrue error response to the auth taxonomy
pub(crate) fn map_auth_error(status: StatusCode, body: &str) -> AuthError {
    let error: GoTrueError = serde_json::from_str(body).unwrap_or_default();
    let text = error.text();
    let lower = text.to_lowercase();

    match (error.error_code.as_deref(), error.error.as_deref()) {
        (Some("invalid_credentials"), _) | (_, Some("invalid_grant"))
            if !lower.contains("refresh") =>
        {
            AuthError::InvalidCredentials
        }
        (Some("user_already_exists") | Some("email_exists"), _) => AuthError::AccountExists,
        (Some("session_not_found"), _) => AuthError::SessionMissing,
        (Some("session_expired") | Some("bad_jwt"), _) => AuthError::SessionExpired,
        (Some("otp_expired"), _) => AuthError::RecoveryCodeRejected,
        (Some("same_password"), _) => AuthError::SamePassword,
        _ if lower.contains("token has expired or is invalid") => AuthError::RecoveryCodeRejected,
        _ if lower.contains("invalid login credentials") => AuthError::InvalidCredentials,
        _ if lower.contains("already registered") => AuthError::AccountExists,
        _ => AuthError::Provider {
            message: format!("{}: {}", status.as_u16(), text),
        },
    }
}

fn transport_error(e: reqwest::Error) -> AuthError {
    AuthError::Provider {
        message: e.to_string(),
    }
}

/// `AuthProvider` backed by the hosted GoTrue API
pub struct SupabaseAuthProvider {
    client: BackendClient,
    session: RwLock<Option<UserSession>>,
    events: broadcast::Sender<AuthEvent>,
}

impl SupabaseAuthProvider {
    pub fn new(config: BackendConfig) -> Result<Self, InfrastructureError> {
        let client = BackendClient::new(config)?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        tracing::info!(auth_url = %client.config().auth_url(), "Auth provider initialized");
        Ok(Self {
            client,
            session: RwLock::new(None),
            events,
        })
    }

    /// Install a session persisted from an earlier run
    pub async fn restore_session(&self, session: UserSession) {
        *self.session.write().await = Some(session.clone());
        self.emit(AuthEvent::SignedIn(session));
    }

    /// Access token of the current session, if signed in
    pub async fn access_token(&self) -> Option<String> {
        self.session
            .read()
            .await
            .as_ref()
            .map(|s| s.access_token.clone())
    }

    fn emit(&self, event: AuthEvent) {
        tracing::debug!(auth_event = event.name(), "Publishing auth event");
        // No receivers is fine
        let _ = self.events.send(event);
    }

    async fn read_error(response: Response) -> AuthError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        map_auth_error(status, &body)
    }

    async fn token_grant(
        &self,
        grant_type: &str,
        body: serde_json::Value,
    ) -> Result<GoTrueSession, AuthError> {
        let response = self
            .client
            .auth(Method::POST, &format!("/token?grant_type={}", grant_type))
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(Self::read_error(response).await);
        }
        response.json().await.map_err(transport_error)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Option<UserSession>, AuthError> {
        match self
            .token_grant("refresh_token", json!({ "refresh_token": refresh_token }))
            .await
        {
            Ok(raw) => {
                let session = to_session(raw, None);
                *self.session.write().await = Some(session.clone());
                tracing::info!(user_id = %session.user_id, event = "session_refreshed", "Session refreshed");
                self.emit(AuthEvent::TokenRefreshed(session.clone()));
                Ok(Some(session))
            }
            Err(AuthError::Provider { message }) if !message.starts_with('4') => {
                Err(AuthError::Provider { message })
            }
            Err(e) => {
                tracing::warn!(error = %e, event = "session_refresh_rejected", "Refresh token rejected, signing out");
                *self.session.write().await = None;
                self.emit(AuthEvent::SignedOut);
                Ok(None)
            }
        }
    }
}

fn to_session(raw: GoTrueSession, fallback_email: Option<&str>) -> UserSession {
    let expires_at = raw
        .expires_at
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .or_else(|| raw.expires_in.map(|secs| Utc::now() + Duration::seconds(secs)));
    let email = raw
        .user
        .email
        .or_else(|| fallback_email.map(str::to_string))
        .unwrap_or_default();

    let mut session = UserSession::new(raw.user.id, email, raw.access_token);
    session.refresh_token = raw.refresh_token;
    session.expires_at = expires_at;
    session
}

#[async_trait]
impl AuthProvider for SupabaseAuthProvider {
    async fn get_session(&self) -> Result<Option<UserSession>, AuthError> {
        let current = self.session.read().await.clone();
        let session = match current {
            Some(session) => session,
            None => return Ok(None),
        };
        if !session.is_expired_at(Utc::now()) {
            return Ok(Some(session));
        }
        match session.refresh_token.as_deref() {
            Some(refresh_token) => self.refresh(refresh_token).await,
            None => Ok(Some(session)),
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<UserSession, AuthError> {
        let raw = self
            .token_grant("password", json!({ "email": email, "password": password }))
            .await?;
        let session = to_session(raw, Some(email));
        *self.session.write().await = Some(session.clone());

        tracing::info!(
            user_id = %session.user_id,
            email = %mask_email(email),
            event = "provider_signed_in",
            "Signed in with password"
        );
        self.emit(AuthEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<SignedUpUser, AuthError> {
        let response = self
            .client
            .auth(Method::POST, "/signup")
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(Self::read_error(response).await);
        }

        match response.json::<SignUpResponse>().await.map_err(transport_error)? {
            SignUpResponse::Session(raw) => {
                let session = to_session(raw, Some(email));
                *self.session.write().await = Some(session.clone());
                self.emit(AuthEvent::SignedIn(session.clone()));
                Ok(SignedUpUser {
                    user_id: session.user_id.clone(),
                    email: session.email.clone(),
                    session: Some(session),
                })
            }
            SignUpResponse::User(user) => {
                if matches!(&user.identities, Some(identities) if identities.is_empty()) {
                    return Err(AuthError::AccountExists);
                }
                Ok(SignedUpUser {
                    user_id: user.id,
                    email: user.email.unwrap_or_else(|| email.to_string()),
                    session: None,
                })
            }
        }
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let previous = self.session.write().await.take();
        if let Some(session) = previous {
            let result = self
                .client
                .auth_as(Method::POST, "/logout", &session.access_token)
                .send()
                .await;
            match result {
                Ok(response) if response.status().is_success() => {}
                Ok(response) => {
                    tracing::warn!(status = response.status().as_u16(), "Remote sign-out rejected");
                }
                Err(e) => tracing::warn!(error = %e, "Remote sign-out failed"),
            }
        }
        self.emit(AuthEvent::SignedOut);
        Ok(())
    }

    async fn update_password(&self, new_password: &str) -> Result<(), AuthError> {
        let session = self
            .session
            .read()
            .await
            .clone()
            .ok_or(AuthError::SessionMissing)?;

        let response = self
            .client
            .auth_as(Method::PUT, "/user", &session.access_token)
            .json(&json!({ "password": new_password }))
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(Self::read_error(response).await);
        }
        tracing::info!(user_id = %session.user_id, event = "password_updated", "Password updated");
        self.emit(AuthEvent::UserUpdated(session));
        Ok(())
    }

    async fn reset_password_for_email(&self, email: &str) -> Result<(), AuthError> {
        let response = self
            .client
            .auth(Method::POST, "/recover")
            .json(&json!({ "email": email }))
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(Self::read_error(response).await);
        }
        tracing::info!(email = %mask_email(email), event = "recovery_requested", "Recovery requested");
        Ok(())
    }

    async fn verify_recovery_code(&self, email: &str, code: &str) -> Result<UserSession, AuthError> {
        let response = self
            .client
            .auth(Method::POST, "/verify")
            .json(&json!({ "type": "recovery", "email": email, "token": code }))
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(Self::read_error(response).await);
        }
        let raw: GoTrueSession = response.json().await.map_err(transport_error)?;
        let session = to_session(raw, Some(email));
        *self.session.write().await = Some(session.clone());

        tracing::info!(
            user_id = %session.user_id,
            email = %mask_email(email),
            event = "recovery_verified",
            "Recovery code accepted"
        );
        self.emit(AuthEvent::PasswordRecovery(session.clone()));
        Ok(session)
    }
}
