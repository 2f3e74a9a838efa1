pub mod config;
pub mod context;
pub mod enforcement;
pub mod error;
pub mod event;
pub mod http;
pub mod policy;
pub mod protection;
pub mod risk;
pub mod subject;

#[cfg(test)]
mod test_support;

pub use crate::config::{DenyScope, FailMode, ProtectionSettings, SettingsStore};
pub use crate::context::RequestContext;
pub use crate::enforcement::{EnforcementGateway, EnforcementInstruction, EnforcementMode};
pub use crate::error::{ProtectionError, ProtectionResult};
pub use crate::event::Event;
pub use crate::policy::{Classification, RiskVerdict, VerdictMode};
pub use crate::protection::{ActionState, Coordinator, Decision, EnforcementOutcome, ProtectedAction};
pub use crate::risk::RiskAssessor;
pub use crate::subject::{Actor, Subject};
