//! State machine for a single protected action, e.g. one login attempt.
//!
//! ```text
//! Attempted ──evaluate──▶ Allowed | Challenged | Denied
//!     │
//!     └──evaluate error──▶ AssessmentFailed
//!
//! evaluate_or_fallback turns an unavailable provider into Allowed (fail
//! open) or Denied (fail closed) instead of AssessmentFailed.
//!
//! any non-terminal ──fail──▶ Failed       (fires `failed` feedback)
//! Attempted | Allowed | Challenged | Denied (not blocking) ──succeed──▶ Completed
//! ```

use std::fmt;

use crate::context::RequestContext;
use crate::error::{ProtectionError, ProtectionResult};
use crate::event::{Event, EventStage};
use crate::policy::Classification;
use crate::subject::{Actor, Subject};

use super::coordinator::Coordinator;
use super::decision::Decision;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionState {
    Attempted,
    AssessmentFailed,
    Allowed,
    Challenged,
    Denied,
    Completed,
    Failed,
}

impl ActionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ActionState::Completed | ActionState::Failed)
    }
}

impl fmt::Display for ActionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActionState::Attempted => "attempted",
            ActionState::AssessmentFailed => "assessment_failed",
            ActionState::Allowed => "allowed",
            ActionState::Challenged => "challenged",
            ActionState::Denied => "denied",
            ActionState::Completed => "completed",
            ActionState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// One in-flight protected action. Feedback notifications fire on entering
/// `Attempted` and `Failed` whatever the verdict was.
pub struct ProtectedAction<'a> {
    coordinator: &'a Coordinator,
    event: Event,
    subject: Subject,
    context: &'a RequestContext,
    state: ActionState,
    blocked: bool,
}

impl<'a> ProtectedAction<'a> {
    pub(crate) async fn begin(
        coordinator: &'a Coordinator,
        event: Event,
        subject: Subject,
        context: &'a RequestContext,
    ) -> ProtectedAction<'a> {
        if let Some(attempted) = event.at_stage(EventStage::Attempted) {
            coordinator.notify(attempted, &subject, context).await;
        }
        Self {
            coordinator,
            event,
            subject,
            context,
            state: ActionState::Attempted,
            blocked: false,
        }
    }

    pub fn event(&self) -> Event {
        self.event
    }

    pub fn state(&self) -> ActionState {
        self.state
    }

    /// Run the risk evaluation for this action. Only valid once, straight
    /// after `Attempted`.
    pub async fn evaluate(&mut self, actor: &Actor) -> ProtectionResult<Decision> {
        if self.state != ActionState::Attempted {
            return Err(self.illegal("evaluate"));
        }
        let result = self.coordinator.protect(self.event, actor, self.context).await;
        self.settle(result)
    }

    /// Like [`ProtectedAction::evaluate`], but an unavailable provider moves
    /// the action to `Allowed` or `Denied` according to the coordinator's
    /// [`FailMode`](crate::config::FailMode).
    pub async fn evaluate_or_fallback(&mut self, actor: &Actor) -> ProtectionResult<Decision> {
        if self.state != ActionState::Attempted {
            return Err(self.illegal("evaluate"));
        }
        let result = self
            .coordinator
            .protect_or_fallback(self.event, actor, self.context)
            .await;
        self.settle(result)
    }

    fn settle(&mut self, result: ProtectionResult<Decision>) -> ProtectionResult<Decision> {
        match result {
            Ok(decision) => {
                self.state = match decision.classification() {
                    Classification::Allow => ActionState::Allowed,
                    Classification::Challenge => ActionState::Challenged,
                    Classification::Deny => ActionState::Denied,
                };
                self.blocked = decision.is_blocked();
                Ok(decision)
            }
            Err(error) => {
                self.state = ActionState::AssessmentFailed;
                Err(error)
            }
        }
    }

    /// The business action went through. An evaluated action already told the
    /// provider about its success through the risk call; an unevaluated one
    /// reports it here.
    pub async fn succeed(&mut self) -> ProtectionResult<()> {
        match self.state {
            ActionState::Attempted => {
                if let Some(succeeded) = self.event.at_stage(EventStage::Succeeded) {
                    self.coordinator
                        .notify(succeeded, &self.subject, self.context)
                        .await;
                }
            }
            ActionState::Allowed | ActionState::Challenged => {}
            ActionState::Denied if !self.blocked => {}
            _ => return Err(self.illegal("succeed")),
        }
        self.state = ActionState::Completed;
        Ok(())
    }

    /// The business action itself failed (bad credentials, invalid form).
    pub async fn fail(&mut self) -> ProtectionResult<()> {
        if self.state.is_terminal() {
            return Err(self.illegal("fail"));
        }
        if let Some(failed) = self.event.at_stage(EventStage::Failed) {
            self.coordinator
                .notify(failed, &self.subject, self.context)
                .await;
        }
        self.state = ActionState::Failed;
        Ok(())
    }

    fn illegal(&self, operation: &str) -> ProtectionError {
        ProtectionError::InvalidState(format!(
            "cannot {operation} {} action in state {}",
            self.event, self.state
        ))
    }
}
