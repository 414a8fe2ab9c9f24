//! Navigation targets derived from gate decisions.

use serde::{Deserialize, Serialize};

use super::gate_decision::GateDecision;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "route", rename_all = "snake_case")]
pub enum AppRoute {
    Onboarding,
    #[default]
    SignIn,
    Verification { email: String },
    Home,
}

impl AppRoute {
    /// Maps a gate decision onto a route.
    ///
    /// Unauthenticated users who have not finished onboarding see it first.
    pub fn from_decision(decision: &GateDecision, onboarding_completed: bool) -> Self {
        match decision {
            GateDecision::Unauthenticated if !onboarding_completed => AppRoute::Onboarding,
            GateDecision::Unauthenticated => AppRoute::SignIn,
            GateDecision::NeedsVerification { email } => AppRoute::Verification {
                email: email.clone(),
            },
            GateDecision::Verified => AppRoute::Home,
        }
    }
}
