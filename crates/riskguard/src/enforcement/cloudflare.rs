//! Cloudflare IP access rules as the enforcement backend.

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::EnforcementSettings;
use crate::error::{ProtectionError, ProtectionResult};

use super::gateway::{EnforcementGateway, EnforcementInstruction, EnforcementMode};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleConfiguration {
    pub target: &'static str,
    pub value: String,
}

/// Body of an access-rule creation request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccessRuleRequest {
    pub configuration: RuleConfiguration,
    pub mode: EnforcementMode,
}

impl From<&EnforcementInstruction> for AccessRuleRequest {
    fn from(instruction: &EnforcementInstruction) -> Self {
        let target = match instruction.ip() {
            IpAddr::V4(_) => "ip",
            IpAddr::V6(_) => "ip6",
        };
        Self {
            configuration: RuleConfiguration {
                target,
                value: instruction.ip().to_string(),
            },
            mode: instruction.mode(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ApiEnvelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: String,
}

pub struct CloudflareGateway {
    http: Client,
    rules_url: String,
    api_email: String,
    api_key: String,
}

impl std::fmt::Debug for CloudflareGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareGateway")
            .field("rules_url", &self.rules_url)
            .finish()
    }
}

impl CloudflareGateway {
    pub fn new(settings: &EnforcementSettings) -> ProtectionResult<Self> {
        let required = |value: &Option<String>, name: &str| {
            value
                .clone()
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ProtectionError::InvalidConfig(format!("missing firewall {name}")))
        };
        let account_id = required(&settings.account_id, "account id")?;
        let api_email = required(&settings.api_email, "api email")?;
        let api_key = required(&settings.api_key, "api key")?;
        let http = Client::builder()
            .timeout(Duration::from_millis(settings.timeout_ms))
            .build()
            .map_err(|e| ProtectionError::InvalidConfig(format!("failed to build http client: {e}")))?;

        Ok(Self {
            http,
            rules_url: format!(
                "{}/accounts/{}/firewall/access_rules/rules",
                settings.base_url.trim_end_matches('/'),
                account_id
            ),
            api_email,
            api_key,
        })
    }
}

#[async_trait]
impl EnforcementGateway for CloudflareGateway {
    async fn apply(&self, instruction: &EnforcementInstruction) -> ProtectionResult<()> {
        let body = AccessRuleRequest::from(instruction);
        let response = self
            .http
            .post(&self.rules_url)
            .header("X-Auth-Email", &self.api_email)
            .header("X-Auth-Key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProtectionError::EnforcementFailed(format!("request failed: {e}")))?;

        let status = response.status();
        let envelope: ApiEnvelope = response.json().await.unwrap_or_default();
        if status.is_success() && envelope.success {
            return Ok(());
        }

        let detail = envelope
            .errors
            .first()
            .map(|error| match error.code {
                Some(code) => format!("{} (code {code})", error.message),
                None => error.message.clone(),
            })
            .unwrap_or_else(|| "no error detail".to_string());
        Err(ProtectionError::EnforcementFailed(format!(
            "{} rule for {} rejected with {status}: {detail}",
            instruction.mode(),
            instruction.ip()
        )))
    }
}
