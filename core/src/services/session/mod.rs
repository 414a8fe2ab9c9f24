//! Session resolution against the auth collaborator
//!
//! Resolves the current session (expired or unreadable sessions count as
//! absent) and exposes the stream of session transitions.

mod resolver;
mod traits;

#[cfg(test)]
mod tests;

pub use resolver::SessionResolver;
pub use traits::AuthProvider;
