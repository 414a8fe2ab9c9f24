//! Auth flow coordinator implementation

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

use aa_shared::masking::mask_email;
use aa_shared::validation::{validate_credentials, validate_password_confirmation};
use aa_shared::VerificationConfig;

use crate::domain::entities::session::UserSession;
use crate::domain::entities::verification_record::RecordLookup;
use crate::domain::value_objects::app_route::AppRoute;
use crate::domain::value_objects::auth_event::AuthEvent;
use crate::domain::value_objects::gate_decision::GateDecision;
use crate::domain::value_objects::issued_code::CodePurpose;
use crate::errors::{AuthError, DomainError, DomainResult, ValidationError, VerificationError};
use crate::repositories::{KeyValueStore, VerificationRecordRepository};
use crate::services::clock::Clock;
use crate::services::code_issuer::{CodeIssuer, CodeIssuerConfig, EmailSenderTrait};
use crate::services::gate::GateEvaluator;
use crate::services::rate_limiter::ResendRateLimiter;
use crate::services::session::{AuthProvider, SessionResolver};
use crate::services::verification::{LeaveDecision, VerificationSession, VerificationState};
use crate::services::verification_status::VerificationStatusStore;

use super::config::{AuthFlowConfig, ONBOARDING_COMPLETED_KEY, PASSWORD_RESET_PURPOSE, RESEND_PURPOSE};
use super::in_flight::InFlightDispatches;
use super::password_reset::PasswordResetSession;
use super::types::{SignInOutcome, SignUpOutcome, SubmitOutcome, UserAction, VerificationPrompt};

/// External collaborators the flow is built from
#[derive(Clone)]
pub struct Collaborators {
    /// Hosted auth service holding the session
    pub auth: Arc<dyn AuthProvider>,
    /// Server-side `is_verified` flags
    pub records: Arc<dyn VerificationRecordRepository>,
    /// Transactional email API for verification codes
    pub email: Arc<dyn EmailSenderTrait>,
    /// Device storage for the onboarding flag and rate-limit counters
    pub key_value: Arc<dyn KeyValueStore>,
    pub clock: Arc<dyn Clock>,
}

/// Owns the active verification and drives every screen transition
pub struct AuthFlow {
    pub(super) auth: Arc<dyn AuthProvider>,
    key_value: Arc<dyn KeyValueStore>,
    pub(super) clock: Arc<dyn Clock>,
    resolver: SessionResolver,
    status: VerificationStatusStore,
    gate: GateEvaluator,
    issuer: CodeIssuer,
    resend_limiter: ResendRateLimiter,
    pub(super) reset_limiter: ResendRateLimiter,
    pub(super) config: VerificationConfig,
    /// At most one verification is active at a time
    verification: Mutex<Option<VerificationSession>>,
    pub(super) reset: Mutex<Option<PasswordResetSession>>,
    pub(super) in_flight: InFlightDispatches,
    /// Bumped by every evaluation and user action; older results are dropped
    generation: AtomicU64,
    route: watch::Sender<AppRoute>,
}

impl AuthFlow {
    /// Wire the flow's services from its collaborators
    ///
    /// # Arguments
    /// * `collaborators` - External services the flow talks to
    /// * `config` - Verification, rate-limit and email settings
    ///
    /// # Returns
    /// A flow with no active verification and the route at `AppRoute::default()`
    pub fn new(collaborators: Collaborators, config: AuthFlowConfig) -> Self {
        let Collaborators {
            auth,
            records,
            email,
            key_value,
            clock,
        } = collaborators;

        let resolver = SessionResolver::new(auth.clone(), clock.clone());
        let status = VerificationStatusStore::new(records, clock.clone());
        let gate = GateEvaluator::new(
            resolver.clone(),
            status.clone(),
            config.verification.store_failure_policy,
        );
        let issuer = CodeIssuer::new(
            email,
            clock.clone(),
            CodeIssuerConfig::from_settings(&config.verification, &config.app_name),
        );
        let resend_limiter = ResendRateLimiter::new(
            key_value.clone(),
            clock.clone(),
            RESEND_PURPOSE,
            config.rate_limit.resend,
        )
        .with_enabled(config.rate_limit.enabled);
        let reset_limiter = ResendRateLimiter::new(
            key_value.clone(),
            clock.clone(),
            PASSWORD_RESET_PURPOSE,
            config.rate_limit.password_reset,
        )
        .with_enabled(config.rate_limit.enabled);
        let (route, _) = watch::channel(AppRoute::default());

        Self {
            auth,
            key_value,
            clock,
            resolver,
            status,
            gate,
            issuer,
            resend_limiter,
            reset_limiter,
            config: config.verification,
            verification: Mutex::new(None),
            reset: Mutex::new(None),
            in_flight: InFlightDispatches::new(),
            generation: AtomicU64::new(0),
            route,
        }
    }

    /// Receiver of the current route
    pub fn subscribe_route(&self) -> watch::Receiver<AppRoute> {
        self.route.subscribe()
    }

    /// Route most recently published
    pub fn current_route(&self) -> AppRoute {
        self.route.borrow().clone()
    }

    /// Copy of the active verification, if any
    pub async fn verification_session(&self) -> Option<VerificationSession> {
        self.verification.lock().await.clone()
    }

    /// Decide the first screen on launch.
    ///
    /// An unverified user is sent a fresh code unless a verification is already active.
    pub async fn on_app_start(&self) -> AppRoute {
        let generation = self.begin_evaluation();
        let onboarding_completed = self.onboarding_completed().await;
        let evaluation = self.gate.evaluate().await;

        let route = match &evaluation.decision {
            GateDecision::NeedsVerification { email } => {
                if !self.has_verification_for(email).await {
                    let user_id = evaluation.session.as_ref().map(|s| s.user_id.clone());
                    match self.start_verification(user_id, email, None).await {
                        Ok(_) | Err(DomainError::Verification(VerificationError::DispatchInProgress)) => {}
                        Err(e) => tracing::warn!(
                            email = %mask_email(email),
                            error = %e,
                            event = "verification_start_failed",
                            "Could not start verification on launch"
                        ),
                    }
                }
                AppRoute::Verification {
                    email: email.clone(),
                }
            }
            decision => AppRoute::from_decision(decision, onboarding_completed),
        };

        tracing::info!(route = ?route, event = "app_start_routed", "App start evaluated");
        if !self.publish_if_current(generation, route.clone())
            && self.resolver.resolve().await.is_none()
        {
            // Signed out while the launch evaluation was dispatching
            self.discard_verification().await;
        }
        route
    }

    /// Re-run the gate after a session transition.
    ///
    /// Returns the published route, or `None` if a newer transition superseded
    /// this one. A recovery session is left to the password reset and never
    /// routes anywhere.
    pub async fn handle_auth_event(&self, event: AuthEvent) -> Option<AppRoute> {
        tracing::info!(auth_event = event.name(), event = "auth_event_received", "Session changed");

        let session = match event {
            AuthEvent::PasswordRecovery(_) => return None,
            AuthEvent::SignedOut => {
                self.discard_verification().await;
                // Nothing published before the sign-out may outlive it
                self.set_route(AppRoute::SignIn);
                return Some(AppRoute::SignIn);
            }
            AuthEvent::SignedIn(session)
            | AuthEvent::TokenRefreshed(session)
            | AuthEvent::UserUpdated(session) => session,
        };

        let generation = self.begin_evaluation();
        let evaluation = self.gate.evaluate_session(session).await;
        match &evaluation.decision {
            GateDecision::NeedsVerification { email } => {
                self.discard_verification_unless_for(email).await
            }
            GateDecision::Verified => {
                let email = evaluation.session.as_ref().map(|s| s.email.as_str());
                self.discard_verification_unless_checking(email.unwrap_or_default())
                    .await
            }
            GateDecision::Unauthenticated => self.discard_verification().await,
        }
        let route = AppRoute::from_decision(&evaluation.decision, true);
        self.publish_if_current(generation, route.clone()).then_some(route)
    }

    /// Re-evaluate against whatever session the provider currently holds
    pub async fn refresh_route(&self) -> Option<AppRoute> {
        let generation = self.begin_evaluation();
        let evaluation = self.gate.evaluate().await;
        if evaluation.session.is_none() {
            self.discard_verification().await;
        }
        let route = AppRoute::from_decision(&evaluation.decision, true);
        self.publish_if_current(generation, route.clone()).then_some(route)
    }

    /// Feed auth provider transitions into `handle_auth_event` until the stream closes
    pub fn spawn_auth_listener(self: &Arc<Self>) -> JoinHandle<()> {
        let flow = Arc::clone(self);
        let mut events = self.resolver.subscribe();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        flow.handle_auth_event(event).await;
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped = skipped, "Auth events dropped, re-evaluating");
                        flow.refresh_route().await;
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }

    /// Password sign-in followed by the gate
    ///
    /// # Arguments
    /// * `email` - Account address; whitespace is trimmed
    /// * `password` - Kept on the verification to re-establish a lost session
    ///
    /// # Returns
    /// `Home` for a verified account, otherwise a prompt for the code just issued
    pub async fn sign_in(&self, email: &str, password: &str) -> DomainResult<SignInOutcome> {
        validate_credentials(email, password, self.config.min_password_length)
            .map_err(ValidationError::from)?;
        let email = email.trim();

        let session = self.auth.sign_in_with_password(email, password).await.map_err(|e| {
            tracing::warn!(
                email = %mask_email(email),
                error = %e,
                event = "sign_in_failed",
                "Sign-in rejected"
            );
            e
        })?;
        tracing::info!(
            user_id = %session.user_id,
            email = %mask_email(email),
            event = "signed_in",
            "User signed in"
        );

        let user_id = session.user_id.clone();
        let evaluation = self.gate.evaluate_session(session).await;
        match evaluation.decision {
            GateDecision::NeedsVerification { email } => {
                let prompt = self
                    .start_verification(Some(user_id), &email, Some(password.to_string()))
                    .await?;
                self.set_route(AppRoute::Verification { email });
                Ok(SignInOutcome::VerificationRequired(prompt))
            }
            GateDecision::Verified | GateDecision::Unauthenticated => {
                self.set_route(AppRoute::Home);
                Ok(SignInOutcome::Home)
            }
        }
    }

    /// Create an account (or resume an unverified one) and start verification
    ///
    /// # Arguments
    /// * `email` - Account address; whitespace is trimmed
    /// * `password` - New password, at least the configured minimum length
    /// * `repeat_password` - Must equal `password`
    ///
    /// # Returns
    /// `AccountExists` when a verified account (or the provider) already has the
    /// address, otherwise a prompt for the code just issued
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        repeat_password: &str,
    ) -> DomainResult<SignUpOutcome> {
        let min = self.config.min_password_length;
        validate_credentials(email, password, min).map_err(ValidationError::from)?;
        validate_password_confirmation(password, repeat_password, min)
            .map_err(ValidationError::from)?;
        let email = email.trim();

        let user_id = match self.status.lookup_by_email(email).await {
            RecordLookup::Found(record) if record.is_verified => {
                tracing::info!(
                    email = %mask_email(email),
                    event = "sign_up_account_exists",
                    "Verified account already exists"
                );
                return Ok(SignUpOutcome::AccountExists);
            }
            RecordLookup::Found(record) => {
                tracing::info!(
                    email = %mask_email(email),
                    event = "sign_up_resume_unverified",
                    "Existing unverified account, sending a new code"
                );
                record.user_uuid
            }
            RecordLookup::NotFound | RecordLookup::Unavailable(_) | RecordLookup::Failed(_) => {
                let user = match self.auth.sign_up(email, password).await {
                    Ok(user) => user,
                    Err(AuthError::AccountExists) => return Ok(SignUpOutcome::AccountExists),
                    Err(e) => return Err(e.into()),
                };
                if let Err(e) = self.status.create(&user.user_id, email).await {
                    tracing::warn!(
                        user_id = %user.user_id,
                        error = %e,
                        event = "verification_record_create_failed",
                        "Could not provision record at sign-up"
                    );
                }
                user.user_id
            }
        };

        let prompt = self
            .start_verification(Some(user_id), email, Some(password.to_string()))
            .await?;
        self.set_route(AppRoute::Verification {
            email: email.to_string(),
        });
        Ok(SignUpOutcome::VerificationRequired(prompt))
    }

    /// Send a new code, superseding the previous one.
    ///
    /// Without an active verification, one is started for the current session.
    ///
    /// # Errors
    /// * `VerificationError::RateLimited` once the window's resends are used up
    /// * `VerificationError::DispatchInProgress` while another send for the email runs
    /// * `VerificationError::NoActiveSession` with neither a verification nor a session
    pub async fn resend_code(&self) -> DomainResult<VerificationPrompt> {
        let active = self
            .verification
            .lock()
            .await
            .as_ref()
            .map(|s| (s.email.clone(), s.user_id.clone()));

        let (email, user_id, fresh) = match active {
            Some((email, user_id)) => (email, user_id, false),
            None => {
                let session = self
                    .resolver
                    .resolve()
                    .await
                    .ok_or(VerificationError::NoActiveSession)?;
                (session.email, Some(session.user_id), true)
            }
        };

        let _guard = self
            .in_flight
            .try_acquire(CodePurpose::EmailVerification, &email)
            .ok_or(VerificationError::DispatchInProgress)?;

        let status = self.resend_limiter.status(&email).await;
        if let Err(e) = status.into_result() {
            tracing::warn!(
                email = %mask_email(&email),
                retry_after_secs = status.retry_after_secs(),
                event = "resend_rate_limited",
                "Resend rejected by rate limit"
            );
            return Err(e.into());
        }

        let issued = self.issuer.issue(&email).await;
        if let Err(e) = self.resend_limiter.record_attempt(&email).await {
            tracing::warn!(error = %e, "Failed to record resend attempt");
        }

        let mut verification = self.verification.lock().await;
        match verification.as_mut() {
            Some(session) if session.email == email => {
                session.supersede(issued, self.clock.now());
                Ok(VerificationPrompt::from_session(session))
            }
            // Signed out (or switched account) while the email was in flight
            Some(_) => Err(VerificationError::NoActiveSession.into()),
            None if !fresh => Err(VerificationError::NoActiveSession.into()),
            None => {
                let session = VerificationSession::new(email, user_id, None, issued);
                let prompt = VerificationPrompt::from_session(&session);
                *verification = Some(session);
                Ok(prompt)
            }
        }
    }

    /// Check an entered code and, on a match, unlock the account.
    ///
    /// The code is compared locally. On a match the auth session is
    /// re-established if needed, the record is marked verified and the gate
    /// re-run; the account is only routed home when the gate agrees.
    ///
    /// # Arguments
    /// * `code` - Code as typed by the user; whitespace is trimmed
    ///
    /// # Returns
    /// * `Verified` with the published route on success
    /// * `Rejected` when the code or the post-match gate check fails; the
    ///   session stays active so the user can retry
    /// * `ReturnToSignIn` when no auth session can be re-established
    ///
    /// Fails with `NoActiveSession` if the verification was abandoned (or
    /// the user signed out) while the check was in progress.
    pub async fn submit_code(&self, code: &str) -> DomainResult<SubmitOutcome> {
        let now = self.clock.now();
        let (session_id, email, user_id, password) = {
            let mut verification = self.verification.lock().await;
            let session = verification
                .as_mut()
                .ok_or(VerificationError::NoActiveSession)?;

            match session.begin_check(code, now, self.config.enforce_code_expiry) {
                Ok(()) => {}
                Err(error @ VerificationError::InvalidState { .. }) => return Err(error.into()),
                Err(error) => {
                    return Ok(SubmitOutcome::Rejected {
                        error,
                        action: UserAction::Retry,
                    })
                }
            }
            (
                session.id(),
                session.email.clone(),
                session.user_id.clone(),
                session.password().map(str::to_string),
            )
        };

        let (auth_session, reauthenticated) =
            match self.confirm_session(&email, password.as_deref()).await {
                Some(confirmed) => confirmed,
                None => return Ok(self.force_sign_in().await),
            };
        if !self.is_active(session_id).await {
            return Err(self.abandoned_during_check(&email, reauthenticated).await);
        }
        let user_id = if auth_session.user_id.is_empty() {
            user_id.unwrap_or_default()
        } else {
            auth_session.user_id.clone()
        };

        if let Err(e) = self.status.mark_verified(&user_id, &email).await {
            tracing::warn!(
                user_id = %user_id,
                error = %e,
                event = "verification_record_update_failed",
                "Code accepted but record not updated, deferring to the gate"
            );
        }
        if !self.is_active(session_id).await {
            return Err(self.abandoned_during_check(&email, reauthenticated).await);
        }

        let evaluation = self.gate.evaluate_session(auth_session).await;

        let mut verification = self.verification.lock().await;
        let session = match verification.as_mut() {
            Some(session) if session.id() == session_id => session,
            _ => {
                drop(verification);
                return Err(self.abandoned_during_check(&email, reauthenticated).await);
            }
        };
        match evaluation.decision {
            GateDecision::Verified => {}
            GateDecision::NeedsVerification { .. } => {
                tracing::warn!(
                    user_id = %user_id,
                    email = %mask_email(&email),
                    event = "verification_status_unconfirmed",
                    "Code matched but the gate still reports unverified"
                );
                let error = VerificationError::StatusUnconfirmed;
                session.abort_verifying(error.clone());
                return Ok(SubmitOutcome::Rejected {
                    error,
                    action: UserAction::Retry,
                });
            }
            GateDecision::Unauthenticated => {
                drop(verification);
                return Ok(self.force_sign_in().await);
            }
        }

        session.complete();
        *verification = None;
        // Published under the lock so a concurrent sign-out is ordered after it
        self.set_route(AppRoute::Home);
        drop(verification);

        if let Err(e) = self.resend_limiter.reset(&email).await {
            tracing::warn!(error = %e, "Failed to clear resend counter");
        }
        tracing::info!(
            user_id = %user_id,
            email = %mask_email(&email),
            event = "email_verified",
            "Email verified"
        );
        Ok(SubmitOutcome::Verified {
            route: AppRoute::Home,
        })
    }

    /// Back navigation from the verification screen
    pub async fn request_leave(&self) -> LeaveDecision {
        self.verification
            .lock()
            .await
            .as_ref()
            .map(VerificationSession::leave_decision)
            .unwrap_or(LeaveDecision::Allowed)
    }

    /// The user confirmed leaving: sign out and drop the verification
    pub async fn confirm_abandon(&self) -> AppRoute {
        self.discard_verification().await;
        if let Err(e) = self.auth.sign_out().await {
            tracing::warn!(error = %e, event = "sign_out_failed", "Sign-out failed");
        }
        tracing::info!(event = "verification_abandoned", "Verification abandoned");
        self.set_route(AppRoute::SignIn);
        AppRoute::SignIn
    }

    /// Persist the onboarding flag and leave the onboarding screen
    pub async fn complete_onboarding(&self) -> DomainResult<()> {
        self.key_value.set_item(ONBOARDING_COMPLETED_KEY, "true").await?;
        if self.current_route() == AppRoute::Onboarding {
            self.set_route(AppRoute::SignIn);
        }
        Ok(())
    }

    /// Unreadable storage counts as not completed
    pub async fn onboarding_completed(&self) -> bool {
        match self.key_value.get_item(ONBOARDING_COMPLETED_KEY).await {
            Ok(value) => value.is_some(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read onboarding flag");
                false
            }
        }
    }

    async fn start_verification(
        &self,
        user_id: Option<String>,
        email: &str,
        password: Option<String>,
    ) -> DomainResult<VerificationPrompt> {
        let _guard = self
            .in_flight
            .try_acquire(CodePurpose::EmailVerification, email)
            .ok_or(VerificationError::DispatchInProgress)?;

        let issued = self.issuer.issue(email).await;
        let session = VerificationSession::new(email, user_id, password, issued);
        let prompt = VerificationPrompt::from_session(&session);
        *self.verification.lock().await = Some(session);

        tracing::info!(
            email = %mask_email(email),
            fallback = prompt.fallback_code().is_some(),
            event = "verification_started",
            "Verification started"
        );
        Ok(prompt)
    }

    // Live session for `email`, signing in again with the stored password if it was lost.
    // The flag is set when the session came from that second sign-in.
    async fn confirm_session(
        &self,
        email: &str,
        password: Option<&str>,
    ) -> Option<(UserSession, bool)> {
        if let Some(session) = self.resolver.resolve().await {
            if session.email.eq_ignore_ascii_case(email) {
                return Some((session, false));
            }
        }

        let password = match password {
            Some(password) => password,
            None => {
                tracing::warn!(
                    email = %mask_email(email),
                    event = "verification_session_lost",
                    "Session lost and no stored credentials"
                );
                return None;
            }
        };

        match self.auth.sign_in_with_password(email, password).await {
            Ok(session) => Some((session, true)),
            Err(e) => {
                tracing::warn!(
                    email = %mask_email(email),
                    error = %e,
                    event = "verification_reauth_failed",
                    "Could not re-establish session"
                );
                None
            }
        }
    }

    async fn is_active(&self, session_id: u64) -> bool {
        self.verification
            .lock()
            .await
            .as_ref()
            .map(|s| s.id() == session_id)
            .unwrap_or(false)
    }

    // The verification was discarded mid-check; undo our own re-authentication.
    async fn abandoned_during_check(&self, email: &str, reauthenticated: bool) -> DomainError {
        tracing::info!(
            email = %mask_email(email),
            event = "verification_check_abandoned",
            "Verification discarded while the code was being confirmed"
        );
        if reauthenticated {
            if let Err(e) = self.auth.sign_out().await {
                tracing::debug!(error = %e, "Sign-out after abandoned check failed");
            }
        }
        VerificationError::NoActiveSession.into()
    }

    async fn force_sign_in(&self) -> SubmitOutcome {
        self.discard_verification().await;
        if let Err(e) = self.auth.sign_out().await {
            tracing::debug!(error = %e, "Sign-out after lost session failed");
        }
        self.set_route(AppRoute::SignIn);
        SubmitOutcome::ReturnToSignIn
    }

    async fn has_verification_for(&self, email: &str) -> bool {
        self.verification
            .lock()
            .await
            .as_ref()
            .map(|s| s.email.eq_ignore_ascii_case(email))
            .unwrap_or(false)
    }

    async fn discard_verification(&self) {
        if self.verification.lock().await.take().is_some() {
            tracing::info!(event = "verification_discarded", "Verification state discarded");
        }
    }

    async fn discard_verification_unless_for(&self, email: &str) {
        let mut verification = self.verification.lock().await;
        if let Some(session) = verification.as_ref() {
            if !session.email.eq_ignore_ascii_case(email) {
                *verification = None;
            }
        }
    }

    // A code check in flight for the same account finishes the session itself.
    async fn discard_verification_unless_checking(&self, email: &str) {
        let mut verification = self.verification.lock().await;
        if let Some(session) = verification.as_ref() {
            let checking = session.state() == VerificationState::Verifying
                && session.email.eq_ignore_ascii_case(email);
            if !checking {
                *verification = None;
            }
        }
    }

    fn begin_evaluation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    // Drop results of evaluations that a newer transition has overtaken.
    fn publish_if_current(&self, generation: u64, route: AppRoute) -> bool {
        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!(generation = generation, route = ?route, "Discarding stale route");
            return false;
        }
        self.route.send_replace(route);
        true
    }

    /// Publish the result of a user action, overtaking pending evaluations
    pub(super) fn set_route(&self, route: AppRoute) {
        self.begin_evaluation();
        self.route.send_replace(route);
    }
}
