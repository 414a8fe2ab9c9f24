//! Trait for auth provider integration

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::domain::entities::session::{SignedUpUser, UserSession};
use crate::domain::value_objects::auth_event::AuthEvent;
use crate::errors::AuthError;

/// Hosted authentication service
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Current session, if any
    async fn get_session(&self) -> Result<Option<UserSession>, AuthError>;

    /// Stream of session transitions
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<UserSession, AuthError>;

    /// Returns `AuthError::AccountExists` when the email is already registered
    async fn sign_up(&self, email: &str, password: &str) -> Result<SignedUpUser, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Change the password of the signed-in user.
    ///
    /// Needs a live session (a recovery session will do); fails with
    /// `AuthError::SamePassword` when the password is unchanged.
    async fn update_password(&self, new_password: &str) -> Result<(), AuthError>;

    /// Ask the provider to email its own recovery code for the account.
    ///
    /// Succeeds for unknown addresses too, so accounts cannot be enumerated.
    async fn reset_password_for_email(&self, email: &str) -> Result<(), AuthError>;

    /// Exchange an emailed recovery code for a short-lived recovery session.
    ///
    /// Publishes `AuthEvent::PasswordRecovery`; a wrong or expired code is
    /// `AuthError::RecoveryCodeRejected`.
    async fn verify_recovery_code(&self, email: &str, code: &str) -> Result<UserSession, AuthError>;
}
