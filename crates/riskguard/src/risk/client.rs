use std::sync::Arc;

use async_trait::async_trait;

use crate::context::RequestContext;
use crate::error::ProtectionResult;
use crate::event::Event;
use crate::policy::RiskVerdict;
use crate::subject::{Actor, Subject};

/// The external risk-assessment service.
#[async_trait]
pub trait RiskAssessor: Send + Sync {
    /// Score `event` for `actor` and parse the provider's verdict.
    async fn evaluate(
        &self,
        event: Event,
        actor: &Actor,
        context: &RequestContext,
    ) -> ProtectionResult<RiskVerdict>;

    /// Report that `event` happened. Carries no verdict.
    async fn notify(
        &self,
        event: Event,
        subject: &Subject,
        context: &RequestContext,
    ) -> ProtectionResult<()>;
}

pub type SharedRiskAssessor = Arc<dyn RiskAssessor>;
