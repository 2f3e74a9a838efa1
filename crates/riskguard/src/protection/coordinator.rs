use std::sync::Arc;

use crate::config::{DenyScope, FailMode, ProtectionSettings};
use crate::context::RequestContext;
use crate::enforcement::{
    CloudflareGateway, EnforcementInstruction, SharedEnforcementGateway,
};
use crate::error::{ProtectionError, ProtectionResult};
use crate::event::Event;
use crate::policy::{ActionDispatcher, Classification};
use crate::risk::{CastleClient, SharedRiskAssessor};
use crate::subject::{Actor, Subject};

use super::decision::{Decision, EnforcementOutcome};
use super::lifecycle::ProtectedAction;

/// Evaluates protected events, enforces the verdict once, and forwards
/// lifecycle feedback to the risk provider.
pub struct Coordinator {
    assessor: SharedRiskAssessor,
    gateway: SharedEnforcementGateway,
    fail_mode: FailMode,
    deny_scope: DenyScope,
}

impl Coordinator {
    pub fn new(assessor: SharedRiskAssessor, gateway: SharedEnforcementGateway) -> Self {
        Self {
            assessor,
            gateway,
            fail_mode: FailMode::default(),
            deny_scope: DenyScope::default(),
        }
    }

    /// Build the production coordinator (Castle + Cloudflare) from settings.
    pub fn from_settings(settings: &ProtectionSettings) -> ProtectionResult<Self> {
        settings.validate()?;
        let assessor = Arc::new(CastleClient::new(&settings.risk)?);
        let gateway = Arc::new(CloudflareGateway::new(&settings.enforcement)?);
        Ok(Self::new(assessor, gateway)
            .with_fail_mode(settings.fail_mode)
            .with_deny_scope(settings.deny_scope))
    }

    pub fn with_fail_mode(mut self, fail_mode: FailMode) -> Self {
        self.fail_mode = fail_mode;
        self
    }

    pub fn with_deny_scope(mut self, deny_scope: DenyScope) -> Self {
        self.deny_scope = deny_scope;
        self
    }

    pub fn fail_mode(&self) -> FailMode {
        self.fail_mode
    }

    /// Evaluate `event`, then install at most one firewall rule for the
    /// request's address. Enforcement failures are logged and recorded on the
    /// decision; they never fail the call.
    #[tracing::instrument(skip_all, fields(event = %event, ip = %context.ip))]
    pub async fn protect(
        &self,
        event: Event,
        actor: &Actor,
        context: &RequestContext,
    ) -> ProtectionResult<Decision> {
        let verdict = self.assessor.evaluate(event, actor, context).await?;
        let dispatcher = ActionDispatcher::new(&verdict);
        let classification = dispatcher.classification();
        let actor_id = &actor.id;
        tracing::info!("risk verdict {classification} for actor {actor_id}");

        let instruction = dispatcher
            .on_deny(|| EnforcementInstruction::block(context.ip))
            .or_else(|| dispatcher.on_challenge(|| EnforcementInstruction::challenge(context.ip)));
        let enforcement = match instruction {
            Some(instruction) => self.enforce(instruction).await,
            None => EnforcementOutcome::NotRequired,
        };

        Ok(Decision::evaluated(event, verdict, enforcement, self.deny_scope))
    }

    /// [`Coordinator::protect`] for an event given by name. Unknown names fail
    /// before any provider is called.
    pub async fn protect_named(
        &self,
        name: &str,
        actor: &Actor,
        context: &RequestContext,
    ) -> ProtectionResult<Decision> {
        let event = Event::parse(name)?;
        self.protect(event, actor, context).await
    }

    /// Like [`Coordinator::protect`], but an unavailable provider yields a
    /// decision according to the configured [`FailMode`]. Token rejections
    /// and unrecognized policies still fail.
    pub async fn protect_or_fallback(
        &self,
        event: Event,
        actor: &Actor,
        context: &RequestContext,
    ) -> ProtectionResult<Decision> {
        match self.protect(event, actor, context).await {
            Err(ProtectionError::AssessmentUnavailable(reason)) => {
                let classification = match self.fail_mode {
                    FailMode::Open => Classification::Allow,
                    FailMode::Closed => Classification::Deny,
                };
                tracing::warn!("risk assessment unavailable for {event}, failing {classification}: {reason}");
                Ok(Decision::fallback(event, classification))
            }
            other => other,
        }
    }

    /// Report a lifecycle event to the risk provider. Failures are logged and
    /// swallowed so they never affect the business action.
    pub async fn notify(&self, event: Event, subject: &Subject, context: &RequestContext) {
        if let Err(error) = self.assessor.notify(event, subject, context).await {
            tracing::warn!("risk feedback for {event} not delivered: {error}");
        }
    }

    /// Start a tracked protected action, firing its `attempted` feedback.
    pub async fn begin<'a>(
        &'a self,
        event: Event,
        subject: impl Into<Subject>,
        context: &'a RequestContext,
    ) -> ProtectedAction<'a> {
        ProtectedAction::begin(self, event, subject.into(), context).await
    }

    async fn enforce(&self, instruction: EnforcementInstruction) -> EnforcementOutcome {
        let (mode, ip) = (instruction.mode(), instruction.ip());
        match self.gateway.apply(&instruction).await {
            Ok(()) => {
                tracing::info!("applied {mode} rule for {ip}");
                EnforcementOutcome::Applied(instruction)
            }
            Err(error) => {
                tracing::warn!("failed to apply {mode} rule for {ip}: {error}");
                EnforcementOutcome::Failed { instruction, error }
            }
        }
    }
}
