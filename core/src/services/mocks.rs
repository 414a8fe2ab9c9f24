//! Mock collaborators shared by the service unit tests

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, Notify};

use chrono::{DateTime, Utc};

use crate::domain::entities::session::{SignedUpUser, UserSession};
use crate::domain::entities::verification_code::{CodeFormat, VerificationCode};
use crate::domain::entities::verification_record::VerificationRecord;
use crate::domain::value_objects::auth_event::AuthEvent;
use crate::errors::{AuthError, StoreError};
use crate::repositories::{InMemoryVerificationRecordRepository, VerificationRecordRepository};
use crate::services::code_issuer::{EmailMessage, EmailSenderTrait};
use crate::services::session::AuthProvider;

// Mock email sender for testing
pub struct MockEmailSender {
    pub sent: Arc<Mutex<Vec<EmailMessage>>>,
    should_fail: AtomicBool,
    hold: Option<Arc<Notify>>,
    pub entered: Arc<Notify>,
}

impl MockEmailSender {
    pub fn new(should_fail: bool) -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            should_fail: AtomicBool::new(should_fail),
            hold: None,
            entered: Arc::new(Notify::new()),
        }
    }

    /// Sender that parks every dispatch until `release` is notified
    pub fn held(release: Arc<Notify>) -> Self {
        Self {
            hold: Some(release),
            ..Self::new(false)
        }
    }

    pub fn set_should_fail(&self, should_fail: bool) {
        self.should_fail.store(should_fail, Ordering::SeqCst);
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn last_message(&self, to: &str) -> Option<EmailMessage> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|m| m.to == to)
            .cloned()
    }

    /// The code embedded in the last message to `to`
    pub fn last_code(&self, to: &str) -> Option<String> {
        let message = self.last_message(to)?;
        let text = message.text?;
        text.split(|c: char| !c.is_ascii_digit())
            .find(|part| part.len() == 4 || part.len() == 6)
            .map(str::to_string)
    }
}

#[async_trait]
impl EmailSenderTrait for MockEmailSender {
    async fn send_email(&self, message: &EmailMessage) -> Result<String, String> {
        if let Some(release) = &self.hold {
            self.entered.notify_one();
            release.notified().await;
        }
        if self.should_fail.load(Ordering::SeqCst) {
            return Err("Network request failed".to_string());
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push(message.clone());
        Ok(format!("mock-email-{}", sent.len()))
    }
}

// Mock record repository: in-memory rows plus injected failures
#[derive(Clone, Default)]
pub struct MockRecordRepository {
    inner: InMemoryVerificationRecordRepository,
    error: Arc<Mutex<Option<StoreError>>>,
    hold: Arc<Mutex<Option<Arc<Notify>>>>,
    pub entered: Arc<Notify>,
}

impl MockRecordRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.set_unavailable(unavailable);
    }

    /// Every call fails with `error` until cleared with `None`
    pub fn fail_with(&self, error: Option<StoreError>) {
        *self.error.lock().unwrap() = error;
    }

    /// Park `mark_verified` until `release` is notified
    pub fn hold_mark_verified(&self, release: Arc<Notify>) {
        *self.hold.lock().unwrap() = Some(release);
    }

    pub async fn len(&self) -> usize {
        self.inner.len().await
    }

    fn check(&self) -> Result<(), StoreError> {
        match self.error.lock().unwrap().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl VerificationRecordRepository for MockRecordRepository {
    async fn find_by_user(&self, user_uuid: &str) -> Result<Option<VerificationRecord>, StoreError> {
        self.check()?;
        self.inner.find_by_user(user_uuid).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<VerificationRecord>, StoreError> {
        self.check()?;
        self.inner.find_by_email(email).await
    }

    async fn insert(&self, record: &VerificationRecord) -> Result<(), StoreError> {
        self.check()?;
        self.inner.insert(record).await
    }

    async fn mark_verified(
        &self,
        user_uuid: &str,
        user_email: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let hold = self.hold.lock().unwrap().clone();
        if let Some(release) = hold {
            self.entered.notify_one();
            release.notified().await;
        }
        self.check()?;
        self.inner.mark_verified(user_uuid, user_email, at).await
    }
}

struct Account {
    user_id: String,
    password: String,
}

// Mock auth provider for testing
pub struct MockAuthProvider {
    accounts: Mutex<HashMap<String, Account>>,
    current: Mutex<Option<UserSession>>,
    recovery_codes: Mutex<HashMap<String, String>>,
    fail_get_session: AtomicBool,
    pub calls: Mutex<Vec<String>>,
    events: broadcast::Sender<AuthEvent>,
}

impl MockAuthProvider {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            accounts: Mutex::new(HashMap::new()),
            current: Mutex::new(None),
            recovery_codes: Mutex::new(HashMap::new()),
            fail_get_session: AtomicBool::new(false),
            calls: Mutex::new(Vec::new()),
            events,
        }
    }

    /// Register an account, returning its user id
    pub fn add_account(&self, email: &str, password: &str) -> String {
        let user_id = format!("user-{}", uuid::Uuid::new_v4());
        self.accounts.lock().unwrap().insert(
            email.to_string(),
            Account {
                user_id: user_id.clone(),
                password: password.to_string(),
            },
        );
        user_id
    }

    pub fn password_of(&self, email: &str) -> Option<String> {
        self.accounts
            .lock()
            .unwrap()
            .get(email)
            .map(|a| a.password.clone())
    }

    pub fn set_session(&self, session: Option<UserSession>) {
        *self.current.lock().unwrap() = session;
    }

    pub fn current_session(&self) -> Option<UserSession> {
        self.current.lock().unwrap().clone()
    }

    /// The recovery code "emailed" by the last `reset_password_for_email`
    pub fn recovery_code(&self, email: &str) -> Option<String> {
        self.recovery_codes.lock().unwrap().get(email).cloned()
    }

    pub fn set_fail_get_session(&self, fail: bool) {
        self.fail_get_session.store(fail, Ordering::SeqCst);
    }

    pub fn was_called(&self, name: &str) -> bool {
        self.calls.lock().unwrap().iter().any(|c| c == name)
    }

    fn record(&self, name: &str) {
        self.calls.lock().unwrap().push(name.to_string());
    }

    fn open_session(&self, user_id: &str, email: &str) -> UserSession {
        let session = UserSession::new(user_id, email, format!("token-{}", user_id));
        *self.current.lock().unwrap() = Some(session.clone());
        let _ = self.events.send(AuthEvent::SignedIn(session.clone()));
        session
    }
}

impl Default for MockAuthProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthProvider for MockAuthProvider {
    async fn get_session(&self) -> Result<Option<UserSession>, AuthError> {
        if self.fail_get_session.load(Ordering::SeqCst) {
            return Err(AuthError::Provider {
                message: "network error".to_string(),
            });
        }
        Ok(self.current.lock().unwrap().clone())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<UserSession, AuthError> {
        self.record("sign_in_with_password");
        let user_id = {
            let accounts = self.accounts.lock().unwrap();
            match accounts.get(email) {
                Some(account) if account.password == password => account.user_id.clone(),
                _ => return Err(AuthError::InvalidCredentials),
            }
        };
        Ok(self.open_session(&user_id, email))
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<SignedUpUser, AuthError> {
        self.record("sign_up");
        if self.accounts.lock().unwrap().contains_key(email) {
            return Err(AuthError::AccountExists);
        }
        let user_id = self.add_account(email, password);
        let session = self.open_session(&user_id, email);
        Ok(SignedUpUser {
            user_id,
            email: email.to_string(),
            session: Some(session),
        })
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.record("sign_out");
        *self.current.lock().unwrap() = None;
        let _ = self.events.send(AuthEvent::SignedOut);
        Ok(())
    }

    async fn update_password(&self, new_password: &str) -> Result<(), AuthError> {
        self.record("update_password");
        let session = self
            .current
            .lock()
            .unwrap()
            .clone()
            .ok_or(AuthError::SessionMissing)?;
        {
            let mut accounts = self.accounts.lock().unwrap();
            let account = accounts
                .get_mut(&session.email)
                .ok_or(AuthError::SessionMissing)?;
            if account.password == new_password {
                return Err(AuthError::SamePassword);
            }
            account.password = new_password.to_string();
        }
        let _ = self.events.send(AuthEvent::UserUpdated(session));
        Ok(())
    }

    async fn reset_password_for_email(&self, email: &str) -> Result<(), AuthError> {
        self.record("reset_password_for_email");
        // Unknown addresses succeed silently
        if self.accounts.lock().unwrap().contains_key(email) {
            let code = VerificationCode::generate(CodeFormat::SixDigit);
            self.recovery_codes
                .lock()
                .unwrap()
                .insert(email.to_string(), code.as_str().to_string());
        }
        Ok(())
    }

    async fn verify_recovery_code(&self, email: &str, code: &str) -> Result<UserSession, AuthError> {
        self.record("verify_recovery_code");
        {
            let mut codes = self.recovery_codes.lock().unwrap();
            match codes.get(email) {
                Some(expected) if expected == code => {
                    codes.remove(email);
                }
                _ => return Err(AuthError::RecoveryCodeRejected),
            }
        }
        let user_id = self
            .accounts
            .lock()
            .unwrap()
            .get(email)
            .map(|a| a.user_id.clone())
            .ok_or(AuthError::RecoveryCodeRejected)?;
        let session = UserSession::new(user_id.clone(), email, format!("recovery-{}", user_id));
        *self.current.lock().unwrap() = Some(session.clone());
        let _ = self.events.send(AuthEvent::PasswordRecovery(session.clone()));
        Ok(session)
    }
}
