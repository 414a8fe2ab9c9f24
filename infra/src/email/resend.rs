//! HTTP transactional email sender
//!
//! Posts `{from, to, subject, html, text, headers}` as JSON with a bearer
//! token. Only `200 OK` counts as accepted; the response `id` becomes the
//! message id.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use aa_core::{EmailMessage, EmailSenderTrait};
use aa_shared::masking::mask_email;
use aa_shared::EmailConfig;

use crate::InfrastructureError;

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    headers: &'a HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    message: Option<String>,
    name: Option<String>,
}

/// Email sender for the Resend HTTP API
pub struct ResendEmailSender {
    client: reqwest::Client,
    config: EmailConfig,
}

impl ResendEmailSender {
    /// Create a new sender
    pub fn new(config: EmailConfig) -> Result<Self, InfrastructureError> {
        if config.api_key.is_empty() {
            return Err(InfrastructureError::Config(
                "RESEND_API_KEY not set".to_string(),
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        tracing::info!(
            api_url = %config.api_url,
            from = %config.from,
            "Email sender initialized"
        );
        Ok(Self { client, config })
    }

    async fn post(&self, message: &EmailMessage) -> Result<String, InfrastructureError> {
        let request = SendRequest {
            from: &self.config.from,
            to: [message.to.as_str()],
            subject: &message.subject,
            html: &message.html,
            text: message.text.as_deref(),
            headers: &message.headers,
        };

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::OK {
            let body: SendResponse = response.json().await.unwrap_or(SendResponse { id: None });
            return Ok(body.id.unwrap_or_default());
        }

        let detail = match response.json::<ErrorResponse>().await {
            Ok(ErrorResponse {
                message: Some(message),
                name,
            }) => match name {
                Some(name) => format!("{}: {}", name, message),
                None => message,
            },
            _ => "no error detail".to_string(),
        };
        Err(InfrastructureError::Email(format!(
            "provider returned {}: {}",
            status.as_u16(),
            detail
        )))
    }
}

#[async_trait]
impl EmailSenderTrait for ResendEmailSender {
    async fn send_email(&self, message: &EmailMessage) -> Result<String, String> {
        match self.post(message).await {
            Ok(id) => {
                tracing::info!(
                    to = %mask_email(&message.to),
                    message_id = %id,
                    event = "email_sent",
                    "Email accepted by provider"
                );
                Ok(id)
            }
            Err(e) => {
                tracing::error!(
                    to = %mask_email(&message.to),
                    error = %e,
                    event = "email_send_failed",
                    "Failed to send email"
                );
                Err(e.to_string())
            }
        }
    }
}
