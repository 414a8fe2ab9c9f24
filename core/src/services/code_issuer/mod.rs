//! Code issuing: generation, email rendering and dispatch with local fallback

mod service;
pub mod templates;
mod traits;

#[cfg(test)]
mod tests;

pub use service::{CodeIssuer, CodeIssuerConfig};
pub use templates::{html_to_plain_text, EmailTemplate};
pub use traits::{EmailMessage, EmailSenderTrait};
