//! Session transitions broadcast by the auth collaborator.

use crate::domain::entities::session::UserSession;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(UserSession),
    SignedOut,
    TokenRefreshed(UserSession),
    UserUpdated(UserSession),
    /// A recovery code was exchanged for a session that may only change the password
    PasswordRecovery(UserSession),
}

impl AuthEvent {
    pub fn session(&self) -> Option<&UserSession> {
        match self {
            AuthEvent::SignedIn(session)
            | AuthEvent::TokenRefreshed(session)
            | AuthEvent::UserUpdated(session)
            | AuthEvent::PasswordRecovery(session) => Some(session),
            AuthEvent::SignedOut => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AuthEvent::SignedIn(_) => "signed_in",
            AuthEvent::SignedOut => "signed_out",
            AuthEvent::TokenRefreshed(_) => "token_refreshed",
            AuthEvent::UserUpdated(_) => "user_updated",
            AuthEvent::PasswordRecovery(_) => "password_recovery",
        }
    }
}
