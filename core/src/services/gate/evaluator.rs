//! Gate evaluator

use aa_shared::masking::mask_email;
use aa_shared::InfrastructureFailurePolicy;

use crate::domain::entities::session::UserSession;
use crate::domain::entities::verification_record::RecordLookup;
use crate::domain::value_objects::gate_decision::GateDecision;
use crate::services::session::SessionResolver;
use crate::services::verification_status::VerificationStatusStore;

/// Pure gate decision.
///
/// | session | record            | decision                                  |
/// |---------|-------------------|-------------------------------------------|
/// | none    | -                 | `Unauthenticated`                         |
/// | some    | not found         | `NeedsVerification`                       |
/// | some    | unverified        | `NeedsVerification`                       |
/// | some    | verified          | `Verified`                                |
/// | some    | store unavailable | `Verified` (fail-open) or `NeedsVerification` (fail-closed) |
/// | some    | store error       | `NeedsVerification` regardless of policy  |
pub fn decide(
    session: Option<&UserSession>,
    lookup: &RecordLookup,
    policy: InfrastructureFailurePolicy,
) -> GateDecision {
    let session = match session {
        Some(session) => session,
        None => return GateDecision::Unauthenticated,
    };
    let needs_verification = || GateDecision::NeedsVerification {
        email: session.email.clone(),
    };

    match lookup {
        RecordLookup::Found(record) if record.is_verified => GateDecision::Verified,
        RecordLookup::Found(_) | RecordLookup::NotFound | RecordLookup::Failed(_) => {
            needs_verification()
        }
        RecordLookup::Unavailable(_) => match policy {
            InfrastructureFailurePolicy::FailOpen => GateDecision::Verified,
            InfrastructureFailurePolicy::FailClosed => needs_verification(),
        },
    }
}

/// Decision together with the session it was made for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateEvaluation {
    pub decision: GateDecision,
    /// Session the decision was made for; `None` when unauthenticated
    pub session: Option<UserSession>,
}

/// Resolves the session, looks up (and lazily provisions) the record, and decides
#[derive(Clone)]
pub struct GateEvaluator {
    resolver: SessionResolver,
    store: VerificationStatusStore,
    policy: InfrastructureFailurePolicy,
}

impl GateEvaluator {
    /// # Arguments
    /// * `resolver` - Source of the current session
    /// * `store` - Verification records, provisioned lazily on first lookup
    /// * `policy` - Decision when the record store is unavailable
    pub fn new(
        resolver: SessionResolver,
        store: VerificationStatusStore,
        policy: InfrastructureFailurePolicy,
    ) -> Self {
        Self {
            resolver,
            store,
            policy,
        }
    }

    /// Evaluate the gate for whatever session the auth provider currently holds
    pub async fn evaluate(&self) -> GateEvaluation {
        match self.resolver.resolve().await {
            Some(session) => self.evaluate_session(session).await,
            None => GateEvaluation {
                decision: GateDecision::Unauthenticated,
                session: None,
            },
        }
    }

    /// Evaluate the gate for a session obtained directly (e.g. from sign-in)
    pub async fn evaluate_session(&self, session: UserSession) -> GateEvaluation {
        let lookup = self.store.lookup(&session.user_id).await;

        if lookup == RecordLookup::NotFound {
            if let Err(e) = self.store.create(&session.user_id, &session.email).await {
                tracing::warn!(
                    user_id = %session.user_id,
                    error = %e,
                    event = "verification_record_create_failed",
                    "Could not provision verification record"
                );
            }
        }

        match &lookup {
            RecordLookup::Unavailable(reason) => tracing::warn!(
                user_id = %session.user_id,
                reason = %reason,
                policy = ?self.policy,
                event = "verification_store_unavailable",
                "Verification store unavailable, applying failure policy"
            ),
            RecordLookup::Failed(reason) => tracing::warn!(
                user_id = %session.user_id,
                reason = %reason,
                event = "verification_store_error",
                "Verification store error, holding the gate closed"
            ),
            _ => {}
        }

        let decision = decide(Some(&session), &lookup, self.policy);
        tracing::debug!(
            user_id = %session.user_id,
            email = %mask_email(&session.email),
            decision = ?decision,
            "Gate evaluated"
        );

        GateEvaluation {
            decision,
            session: Some(session),
        }
    }
}
