//! Value objects exchanged between services and callers.

pub mod app_route;
pub mod auth_event;
pub mod gate_decision;
pub mod issued_code;

pub use app_route::AppRoute;
pub use auth_event::AuthEvent;
pub use gate_decision::GateDecision;
pub use issued_code::{CodeDelivery, CodePurpose, IssuedCode};
