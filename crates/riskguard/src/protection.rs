//! Ties risk evaluation, enforcement and feedback together per protected action.

pub mod coordinator;
pub mod decision;
pub mod lifecycle;

pub use coordinator::Coordinator;
pub use decision::{Decision, EnforcementOutcome};
pub use lifecycle::{ActionState, ProtectedAction};
