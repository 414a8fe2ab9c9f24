//! Traits for transactional email integration

use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;

/// A rendered email ready for dispatch. The sender adds the `from` address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
}

/// Trait for transactional email service integration
#[async_trait]
pub trait EmailSenderTrait: Send + Sync {
    /// Send an email, returning the provider's message id
    async fn send_email(&self, message: &EmailMessage) -> Result<String, String>;
}
