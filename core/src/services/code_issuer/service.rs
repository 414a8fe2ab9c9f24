//! Code issuer implementation

use chrono::Duration;
use std::collections::HashMap;
use std::sync::Arc;

use aa_shared::masking::mask_email;
use aa_shared::VerificationConfig;

use crate::domain::entities::verification_code::{CodeFormat, VerificationCode};
use crate::domain::value_objects::issued_code::{CodeDelivery, IssuedCode};
use crate::services::clock::Clock;

use super::templates::{verification_email, EmailTemplate};
use super::traits::{EmailMessage, EmailSenderTrait};

/// Configuration for the code issuer
#[derive(Debug, Clone)]
pub struct CodeIssuerConfig {
    pub format: CodeFormat,
    /// Lifetime advertised in the email and enforced on submission
    pub ttl_minutes: i64,
    /// Product name shown in the email
    pub app_name: String,
}

impl Default for CodeIssuerConfig {
    fn default() -> Self {
        Self {
            format: CodeFormat::FourDigit,
            ttl_minutes: crate::domain::entities::DEFAULT_CODE_TTL_MINUTES,
            app_name: "AhliAnak".to_string(),
        }
    }
}

impl CodeIssuerConfig {
    pub fn from_settings(verification: &VerificationConfig, app_name: &str) -> Self {
        let format = CodeFormat::from_length(verification.code_length).unwrap_or_else(|| {
            tracing::warn!(
                code_length = verification.code_length,
                "Unsupported code length, using 4 digits"
            );
            CodeFormat::FourDigit
        });
        Self {
            format,
            ttl_minutes: verification.code_ttl_minutes,
            app_name: app_name.to_string(),
        }
    }
}

/// Issues one-time codes by email, falling back to an on-screen code when dispatch fails
#[derive(Clone)]
pub struct CodeIssuer {
    sender: Arc<dyn EmailSenderTrait>,
    clock: Arc<dyn Clock>,
    config: CodeIssuerConfig,
}

impl CodeIssuer {
    pub fn new(
        sender: Arc<dyn EmailSenderTrait>,
        clock: Arc<dyn Clock>,
        config: CodeIssuerConfig,
    ) -> Self {
        Self {
            sender,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &CodeIssuerConfig {
        &self.config
    }

    /// Generate a verification code, email it and report how it was delivered.
    ///
    /// Never fails: on any dispatch error a fresh code is generated locally and
    /// returned with `CodeDelivery::Fallback` so the caller can show it.
    ///
    /// # Arguments
    /// * `email` - Recipient; surrounding whitespace is trimmed
    pub async fn issue(&self, email: &str) -> IssuedCode {
        let code = VerificationCode::generate(self.config.format);
        let message = self.render(email, &code);

        match self.sender.send_email(&message).await {
            Ok(message_id) => {
                tracing::info!(
                    email = %mask_email(email),
                    message_id = %message_id,
                    event = "code_emailed",
                    "Verification code emailed"
                );
                self.issued(code, CodeDelivery::Emailed { message_id })
            }
            Err(e) => {
                let fallback = VerificationCode::generate(self.config.format);
                tracing::warn!(
                    email = %mask_email(email),
                    error = %e,
                    event = "code_email_failed",
                    "Email dispatch failed, using on-screen fallback code"
                );
                tracing::debug!(
                    email = %mask_email(email),
                    code = fallback.as_str(),
                    "Fallback code shown to user"
                );
                self.issued(fallback, CodeDelivery::Fallback)
            }
        }
    }

    fn issued(&self, code: VerificationCode, delivery: CodeDelivery) -> IssuedCode {
        let issued_at = self.clock.now();
        IssuedCode {
            code,
            issued_at,
            expires_at: issued_at + Duration::minutes(self.config.ttl_minutes),
            delivery,
        }
    }

    fn render(&self, email: &str, code: &VerificationCode) -> EmailMessage {
        let EmailTemplate { subject, html, text } =
            verification_email(&self.config.app_name, code.as_str(), self.config.ttl_minutes);

        // A unique reference keeps mail clients from threading successive codes
        let mut headers = HashMap::new();
        headers.insert("X-Entity-Ref-ID".to_string(), uuid::Uuid::new_v4().to_string());

        EmailMessage {
            to: email.trim().to_string(),
            subject,
            html,
            text: Some(text),
            headers,
        }
    }
}
