//! Wire shapes for the risk provider's `/risk` and `/filter` endpoints.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::RequestContext;
use crate::error::{ProtectionError, ProtectionResult};
use crate::event::Event;
use crate::policy::{RiskVerdict, VerdictMode};
use crate::subject::{Actor, Subject};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserPayload {
    pub id: String,
    pub email: String,
    pub name: String,
    /// Absent, not null, for accounts that were never activated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registered_at: Option<String>,
}

impl From<&Actor> for UserPayload {
    fn from(actor: &Actor) -> Self {
        Self {
            id: actor.id.clone(),
            email: actor.email.clone(),
            name: actor.name.clone(),
            registered_at: actor.registered_at_iso8601(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextPayload {
    pub ip: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, Value>,
}

impl ContextPayload {
    pub fn new(context: &RequestContext, scrubbed_headers: &[String]) -> Self {
        Self {
            ip: context.ip.to_string(),
            headers: context.transmitted_headers(scrubbed_headers),
        }
    }
}

/// Body of `POST /risk`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskRequest {
    #[serde(rename = "type")]
    pub event_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'static str>,
    pub request_token: String,
    pub user: UserPayload,
    pub context: ContextPayload,
}

impl RiskRequest {
    pub fn build(
        event: Event,
        actor: &Actor,
        context: &RequestContext,
        scrubbed_headers: &[String],
    ) -> ProtectionResult<Self> {
        let descriptor = event.descriptor();
        Ok(Self {
            event_type: descriptor.category.as_wire(),
            status: descriptor.stage.map(|stage| stage.as_wire()),
            name: descriptor.label,
            request_token: context.request_token()?.to_string(),
            user: actor.into(),
            context: ContextPayload::new(context, scrubbed_headers),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterParams {
    pub email: String,
}

/// Body of `POST /filter`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterRequest {
    #[serde(rename = "type")]
    pub event_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'static str>,
    pub request_token: String,
    pub params: FilterParams,
    pub context: ContextPayload,
}

impl FilterRequest {
    pub fn build(
        event: Event,
        subject: &Subject,
        context: &RequestContext,
        scrubbed_headers: &[String],
    ) -> ProtectionResult<Self> {
        let descriptor = event.descriptor();
        Ok(Self {
            event_type: descriptor.category.as_wire(),
            status: descriptor.stage.map(|stage| stage.as_wire()),
            name: descriptor.label,
            request_token: context.request_token()?.to_string(),
            params: FilterParams {
                email: subject.email().to_string(),
            },
            context: ContextPayload::new(context, scrubbed_headers),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PolicyPayload {
    pub action: String,
}

/// Body returned by `POST /risk`. The provider may send either or both parts.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RiskResponse {
    #[serde(default)]
    pub risk: Option<f64>,
    #[serde(default)]
    pub policy: Option<PolicyPayload>,
}

impl RiskResponse {
    /// Read the part `mode` makes authoritative.
    pub fn into_verdict(self, mode: VerdictMode) -> ProtectionResult<RiskVerdict> {
        match mode {
            VerdictMode::Score => {
                let risk = self.risk.ok_or_else(|| {
                    ProtectionError::AssessmentUnavailable("response has no risk score".to_string())
                })?;
                RiskVerdict::from_score(risk)
            }
            VerdictMode::Policy => {
                let policy = self.policy.ok_or_else(|| {
                    ProtectionError::AssessmentUnavailable("response has no policy".to_string())
                })?;
                RiskVerdict::from_policy_action(&policy.action)
            }
        }
    }
}

/// Error body the provider sends with 4xx responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderErrorBody {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}
