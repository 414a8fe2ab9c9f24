//! Email sender that only logs, for development

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};

use aa_core::{EmailMessage, EmailSenderTrait};
use aa_shared::masking::mask_email;

/// Logs every message instead of delivering it
#[derive(Debug, Default)]
pub struct LoggingEmailSender {
    sent: AtomicU64,
}

impl LoggingEmailSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of messages logged so far
    pub fn sent_count(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl EmailSenderTrait for LoggingEmailSender {
    async fn send_email(&self, message: &EmailMessage) -> Result<String, String> {
        let n = self.sent.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::info!(
            to = %mask_email(&message.to),
            subject = %message.subject,
            event = "email_logged",
            "Email not delivered (logging sender)"
        );
        if let Some(text) = &message.text {
            tracing::debug!(body = %text, "Logged email body");
        }
        Ok(format!("logged-{}", n))
    }
}
