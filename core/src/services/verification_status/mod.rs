//! Verification status store over the verification record repository

mod service;


pub use service::VerificationStatusStore;
