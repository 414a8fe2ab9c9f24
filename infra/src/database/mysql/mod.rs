//! MySQL repository implementations

pub mod verification_record_repository_impl;

pub use verification_record_repository_impl::MySqlVerificationRecordRepository;
