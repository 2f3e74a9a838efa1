pub mod castle;
pub mod client;
pub mod payload;

pub use castle::CastleClient;
pub use client::{RiskAssessor, SharedRiskAssessor};
pub use payload::{FilterRequest, RiskRequest, RiskResponse};
