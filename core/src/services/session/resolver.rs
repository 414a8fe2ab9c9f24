//! Session resolver

use std::sync::Arc;
use tokio::sync::broadcast;

use aa_shared::masking::mask_email;

use crate::domain::entities::session::UserSession;
use crate::domain::value_objects::auth_event::AuthEvent;
use crate::services::clock::Clock;

use super::traits::AuthProvider;

#[derive(Clone)]
pub struct SessionResolver {
    auth: Arc<dyn AuthProvider>,
    clock: Arc<dyn Clock>,
}

impl SessionResolver {
    pub fn new(auth: Arc<dyn AuthProvider>, clock: Arc<dyn Clock>) -> Self {
        Self { auth, clock }
    }

    /// Current live session.
    ///
    /// Provider errors fail closed: they are logged and reported as no session.
    pub async fn resolve(&self) -> Option<UserSession> {
        match self.auth.get_session().await {
            Ok(Some(session)) if session.is_expired_at(self.clock.now()) => {
                tracing::info!(
                    email = %mask_email(&session.email),
                    event = "session_expired",
                    "Ignoring expired session"
                );
                None
            }
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    event = "session_resolve_failed",
                    "Failed to read session, treating as signed out"
                );
                None
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.auth.subscribe()
    }
}
