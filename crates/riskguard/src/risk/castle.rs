//! HTTP adapter for the Castle risk API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;

use crate::config::RiskSettings;
use crate::context::RequestContext;
use crate::error::{ProtectionError, ProtectionResult};
use crate::event::Event;
use crate::policy::{RiskVerdict, VerdictMode};
use crate::subject::{Actor, Subject};

use super::client::RiskAssessor;
use super::payload::{FilterRequest, ProviderErrorBody, RiskRequest, RiskResponse};

const INVALID_REQUEST_TOKEN: &str = "invalid_request_token";

pub struct CastleClient {
    http: Client,
    base_url: String,
    api_secret: String,
    verdict_mode: VerdictMode,
    scrubbed_headers: Vec<String>,
}

impl std::fmt::Debug for CastleClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CastleClient")
            .field("base_url", &self.base_url)
            .field("verdict_mode", &self.verdict_mode)
            .finish()
    }
}

impl CastleClient {
    pub fn new(settings: &RiskSettings) -> ProtectionResult<Self> {
        let api_secret = settings
            .api_secret
            .clone()
            .filter(|secret| !secret.is_empty())
            .ok_or_else(|| ProtectionError::InvalidConfig("missing risk api secret".to_string()))?;
        let http = Client::builder()
            .timeout(Duration::from_millis(settings.timeout_ms))
            .build()
            .map_err(|e| ProtectionError::InvalidConfig(format!("failed to build http client: {e}")))?;
        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_secret,
            verdict_mode: settings.verdict_mode,
            scrubbed_headers: settings.scrubbed_headers.clone(),
        })
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ProtectionResult<reqwest::Response> {
        let url = format!("{}/{}", self.base_url, path);
        let response = self
            .http
            .post(&url)
            .basic_auth("", Some(&self.api_secret))
            .json(body)
            .send()
            .await
            .map_err(|e| ProtectionError::AssessmentUnavailable(format!("{path} request failed: {e}")))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error: ProviderErrorBody = response.json().await.unwrap_or_default();
        if status == StatusCode::UNPROCESSABLE_ENTITY
            && error.kind.as_deref() == Some(INVALID_REQUEST_TOKEN)
        {
            return Err(ProtectionError::InvalidRequestToken(
                error.message.unwrap_or_else(|| "rejected by provider".to_string()),
            ));
        }
        Err(ProtectionError::AssessmentUnavailable(format!(
            "{path} returned {status}{}",
            error.message.map(|m| format!(": {m}")).unwrap_or_default()
        )))
    }
}

#[async_trait]
impl RiskAssessor for CastleClient {
    async fn evaluate(
        &self,
        event: Event,
        actor: &Actor,
        context: &RequestContext,
    ) -> ProtectionResult<RiskVerdict> {
        let request = RiskRequest::build(event, actor, context, &self.scrubbed_headers)?;
        let (event_type, status, ip) = (&request.event_type, &request.status, &request.context.ip);
        tracing::debug!("risk request event={event} type={event_type} status={status:?} ip={ip}");
        let response: RiskResponse = self
            .post("risk", &request)
            .await?
            .json()
            .await
            .map_err(|e| ProtectionError::AssessmentUnavailable(format!("malformed risk response: {e}")))?;
        response.into_verdict(self.verdict_mode)
    }

    async fn notify(
        &self,
        event: Event,
        subject: &Subject,
        context: &RequestContext,
    ) -> ProtectionResult<()> {
        let request = FilterRequest::build(event, subject, context, &self.scrubbed_headers)?;
        let ip = &request.context.ip;
        tracing::debug!("filter request event={event} ip={ip}");
        self.post("filter", &request).await.map(|_| ())
    }
}
