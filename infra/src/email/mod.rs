//! Email Service Module
//!
//! Transactional email senders implementing `EmailSenderTrait`:
//!
//! - **ResendEmailSender**: HTTP JSON API with bearer auth
//! - **LoggingEmailSender**: writes messages to the log, for development

use std::sync::Arc;

use aa_core::EmailSenderTrait;
use aa_shared::EmailConfig;

pub mod logging;
pub mod resend;

pub use logging::LoggingEmailSender;
pub use resend::ResendEmailSender;


/// Create an email sender based on configuration
///
/// Unknown providers and a missing API key fall back to the logging sender,
/// which never fails; codes then reach the user only through the log.
pub fn create_email_sender(config: &EmailConfig) -> Arc<dyn EmailSenderTrait> {
    match config.provider.as_str() {
        "log" => Arc::new(LoggingEmailSender::new()),
        "resend" => match ResendEmailSender::new(config.clone()) {
            Ok(sender) => Arc::new(sender),
            Err(e) => {
                tracing::error!("Failed to initialize email sender: {}", e);
                tracing::warn!("Falling back to logging email sender");
                Arc::new(LoggingEmailSender::new())
            }
        },
        other => {
            tracing::warn!(
                "Unknown email provider '{}', using logging implementation",
                other
            );
            Arc::new(LoggingEmailSender::new())
        }
    }
}
