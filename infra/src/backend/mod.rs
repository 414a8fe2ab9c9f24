//! Hosted backend adapters
//!
//! The hosted backend exposes a GoTrue auth API under `/auth/v1` and a
//! PostgREST API under `/rest/v1`. Both take the project's anon key in the
//! `apikey` header.

mod client;
pub mod postgrest_store;
pub mod supabase_auth;

pub use client::BackendClient;
pub use postgrest_store::PostgrestVerificationRecordRepository;
pub use supabase_auth::SupabaseAuthProvider;

#[cfg(test)]
mod tests;
