//! Per-request network context handed to the risk provider.

use std::collections::BTreeMap;
use std::net::IpAddr;

use axum::http::HeaderMap;
use serde_json::Value;

use crate::error::{ProtectionError, ProtectionResult};

/// Origin address, inbound headers and the single-use anti-replay token of
/// one inbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub ip: IpAddr,
    pub headers: BTreeMap<String, String>,
    request_token: Option<String>,
}

impl RequestContext {
    pub fn new(ip: IpAddr) -> Self {
        Self {
            ip,
            headers: BTreeMap::new(),
            request_token: None,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_request_token(mut self, token: impl Into<String>) -> Self {
        self.request_token = Some(token.into());
        self
    }

    /// Build a context from the pieces an HTTP handler already has.
    /// Header values that are not visible ASCII are skipped.
    pub fn from_parts(ip: IpAddr, headers: &HeaderMap, request_token: Option<&str>) -> Self {
        let headers = headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        Self {
            ip,
            headers,
            request_token: request_token.map(str::to_string),
        }
    }

    /// The anti-replay token; a missing or blank token is a caller error.
    pub fn request_token(&self) -> ProtectionResult<&str> {
        match self.request_token.as_deref().map(str::trim) {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(ProtectionError::InvalidRequestToken(
                "missing request token".to_string(),
            )),
        }
    }

    /// Headers as they go over the wire: blank entries dropped, scrubbed
    /// names (case-insensitive) reduced to `true`.
    pub fn transmitted_headers(&self, scrubbed: &[String]) -> BTreeMap<String, Value> {
        self.headers
            .iter()
            .filter(|(name, value)| !name.trim().is_empty() && !value.trim().is_empty())
            .map(|(name, value)| {
                let scrub = scrubbed
                    .iter()
                    .any(|candidate| candidate.eq_ignore_ascii_case(name));
                let value = if scrub {
                    Value::Bool(true)
                } else {
                    Value::String(value.clone())
                };
                (name.clone(), value)
            })
            .collect()
    }
}
