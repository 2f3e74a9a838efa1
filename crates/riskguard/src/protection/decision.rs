use crate::config::DenyScope;
use crate::enforcement::EnforcementInstruction;
use crate::error::ProtectionError;
use crate::event::Event;
use crate::policy::{ActionDispatcher, Classification, RiskVerdict};

/// What happened at the firewall for one evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum EnforcementOutcome {
    /// Allow verdicts and fallback decisions install nothing.
    NotRequired,
    Applied(EnforcementInstruction),
    Failed {
        instruction: EnforcementInstruction,
        error: ProtectionError,
    },
}

impl EnforcementOutcome {
    pub fn instruction(&self) -> Option<&EnforcementInstruction> {
        match self {
            EnforcementOutcome::NotRequired => None,
            EnforcementOutcome::Applied(instruction) => Some(instruction),
            EnforcementOutcome::Failed { instruction, .. } => Some(instruction),
        }
    }
}

/// The result of protecting one action. Callers run their own deny/challenge
/// handlers through it and branch on [`Decision::is_blocked`].
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    event: Event,
    verdict: Option<RiskVerdict>,
    dispatcher: ActionDispatcher,
    enforcement: EnforcementOutcome,
    deny_scope: DenyScope,
}

impl Decision {
    pub(crate) fn evaluated(
        event: Event,
        verdict: RiskVerdict,
        enforcement: EnforcementOutcome,
        deny_scope: DenyScope,
    ) -> Self {
        Self {
            event,
            verdict: Some(verdict),
            dispatcher: ActionDispatcher::new(&verdict),
            enforcement,
            deny_scope,
        }
    }

    /// A decision made without a verdict because the provider was unavailable.
    /// Fallback denials always block the current action.
    pub(crate) fn fallback(event: Event, classification: Classification) -> Self {
        Self {
            event,
            verdict: None,
            dispatcher: ActionDispatcher::for_classification(classification),
            enforcement: EnforcementOutcome::NotRequired,
            deny_scope: DenyScope::CurrentAction,
        }
    }

    pub fn event(&self) -> Event {
        self.event
    }

    /// `None` for fallback decisions.
    pub fn verdict(&self) -> Option<&RiskVerdict> {
        self.verdict.as_ref()
    }

    pub fn classification(&self) -> Classification {
        self.dispatcher.classification()
    }

    pub fn is_fallback(&self) -> bool {
        self.verdict.is_none()
    }

    pub fn enforcement(&self) -> &EnforcementOutcome {
        &self.enforcement
    }

    pub fn on_deny<T>(&self, handler: impl FnOnce() -> T) -> Option<T> {
        self.dispatcher.on_deny(handler)
    }

    pub fn on_challenge<T>(&self, handler: impl FnOnce() -> T) -> Option<T> {
        self.dispatcher.on_challenge(handler)
    }

    /// Whether the caller must abort the action in flight.
    pub fn is_blocked(&self) -> bool {
        self.classification() == Classification::Deny
            && self.deny_scope == DenyScope::CurrentAction
    }
}
