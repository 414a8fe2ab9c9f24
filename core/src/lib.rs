//! # AhliAnak Core
//!
//! Verification and session-gating logic for the AhliAnak client.
//! This crate contains domain entities, the error taxonomy, repository and
//! collaborator traits with in-memory implementations, and the services that
//! decide which screen a user may see.

pub mod domain;
pub mod errors;
pub mod repositories;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::entities::{
    CodeFormat, RecordLookup, ResendCounterState, SignedUpUser, UserSession, VerificationCode,
    VerificationRecord,
};
pub use domain::value_objects::{
    AppRoute, AuthEvent, CodeDelivery, CodePurpose, GateDecision, IssuedCode,
};
pub use errors::{
    AuthError, DomainError, DomainResult, StoreError, ValidationError, VerificationError,
};
pub use repositories::{
    InMemoryKeyValueStore, InMemoryVerificationRecordRepository, KeyValueStore,
    VerificationRecordRepository,
};
pub use services::{
    AuthFlow, AuthFlowConfig, AuthProvider, Clock, Collaborators, EmailMessage, EmailSenderTrait,
    ManualClock, SystemClock,
};
