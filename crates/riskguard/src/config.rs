//! Protection settings: environment loading, validation and JSON persistence.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ProtectionError, ProtectionResult};
use crate::policy::VerdictMode;

const DEFAULT_RISK_BASE_URL: &str = "https://api.castle.io/v1";
const DEFAULT_RISK_TIMEOUT_MS: u64 = 1000;
const DEFAULT_FIREWALL_BASE_URL: &str = "https://api.cloudflare.com/client/v4";
const DEFAULT_FIREWALL_TIMEOUT_MS: u64 = 5000;
const DEFAULT_SCRUBBED_HEADERS: [&str; 2] = ["cookie", "authorization"];

/// What a caller should assume when the risk provider cannot be reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailMode {
    Open,
    #[default]
    Closed,
}

/// Whether a deny verdict aborts the action in flight or only blocks the
/// address for later requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyScope {
    #[default]
    CurrentAction,
    FutureRequests,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskSettings {
    pub base_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_secret: Option<String>,
    pub timeout_ms: u64,
    pub verdict_mode: VerdictMode,
    pub scrubbed_headers: Vec<String>,
}

impl Default for RiskSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_RISK_BASE_URL.to_string(),
            api_secret: None,
            timeout_ms: DEFAULT_RISK_TIMEOUT_MS,
            verdict_mode: VerdictMode::default(),
            scrubbed_headers: DEFAULT_SCRUBBED_HEADERS
                .iter()
                .map(|name| name.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnforcementSettings {
    pub base_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub timeout_ms: u64,
}

impl Default for EnforcementSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_FIREWALL_BASE_URL.to_string(),
            account_id: None,
            api_email: None,
            api_key: None,
            timeout_ms: DEFAULT_FIREWALL_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtectionSettings {
    pub risk: RiskSettings,
    pub enforcement: EnforcementSettings,
    pub fail_mode: FailMode,
    pub deny_scope: DenyScope,
}

impl ProtectionSettings {
    /// Read settings from `RISKGUARD_*` variables, falling back to the
    /// providers' conventional variable names.
    pub fn from_env() -> ProtectionResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ProtectionResult<Self> {
        let get = |keys: &[&str]| {
            keys.iter()
                .find_map(|key| lookup(*key).filter(|value| !value.trim().is_empty()))
        };
        let number = |keys: &[&str], default: u64| {
            get(keys)
                .and_then(|value| value.trim().parse::<u64>().ok())
                .unwrap_or(default)
        };

        let verdict_mode = match get(&["RISKGUARD_VERDICT_MODE"]) {
            Some(value) => parse_choice(&value, "verdict mode")?,
            None => VerdictMode::default(),
        };
        let fail_mode = match get(&["RISKGUARD_FAIL_MODE"]) {
            Some(value) => parse_choice(&value, "fail mode")?,
            None => FailMode::default(),
        };
        let deny_scope = match get(&["RISKGUARD_DENY_SCOPE"]) {
            Some(value) => parse_choice(&value, "deny scope")?,
            None => DenyScope::default(),
        };
        let scrubbed_headers = get(&["RISKGUARD_SCRUBBED_HEADERS"])
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_else(|| RiskSettings::default().scrubbed_headers);

        Ok(Self {
            risk: RiskSettings {
                base_url: get(&["RISKGUARD_RISK_BASE_URL"])
                    .unwrap_or_else(|| DEFAULT_RISK_BASE_URL.to_string()),
                api_secret: get(&["RISKGUARD_RISK_API_SECRET", "CASTLE_API_SECRET"]),
                timeout_ms: number(&["RISKGUARD_RISK_TIMEOUT_MS"], DEFAULT_RISK_TIMEOUT_MS),
                verdict_mode,
                scrubbed_headers,
            },
            enforcement: EnforcementSettings {
                base_url: get(&["RISKGUARD_FIREWALL_BASE_URL"])
                    .unwrap_or_else(|| DEFAULT_FIREWALL_BASE_URL.to_string()),
                account_id: get(&["RISKGUARD_FIREWALL_ACCOUNT_ID", "CLOUDFLARE_ACCOUNT_ID"]),
                api_email: get(&["RISKGUARD_FIREWALL_API_EMAIL", "CLOUDFLARE_API_EMAIL"]),
                api_key: get(&["RISKGUARD_FIREWALL_API_KEY", "CLOUDFLARE_API_TOKEN"]),
                timeout_ms: number(&["RISKGUARD_FIREWALL_TIMEOUT_MS"], DEFAULT_FIREWALL_TIMEOUT_MS),
            },
            fail_mode,
            deny_scope,
        })
    }

    /// Check that both providers have the credentials they need.
    pub fn validate(&self) -> ProtectionResult<()> {
        let missing = [
            ("risk api secret", &self.risk.api_secret),
            ("firewall account id", &self.enforcement.account_id),
            ("firewall api email", &self.enforcement.api_email),
            ("firewall api key", &self.enforcement.api_key),
        ]
        .into_iter()
        .filter(|(_, value)| value.as_deref().map_or(true, |v| v.trim().is_empty()))
        .map(|(name, _)| name)
        .collect::<Vec<_>>();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ProtectionError::InvalidConfig(format!(
                "missing {}",
                missing.join(", ")
            )))
        }
    }

    /// A copy safe to log or return from an API (no secrets).
    pub fn redacted(&self) -> RedactedSettings {
        RedactedSettings {
            risk_base_url: self.risk.base_url.clone(),
            has_api_secret: has_value(&self.risk.api_secret),
            verdict_mode: self.risk.verdict_mode,
            firewall_base_url: self.enforcement.base_url.clone(),
            account_id: self.enforcement.account_id.clone(),
            has_api_key: has_value(&self.enforcement.api_key),
            fail_mode: self.fail_mode,
            deny_scope: self.deny_scope,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedactedSettings {
    pub risk_base_url: String,
    pub has_api_secret: bool,
    pub verdict_mode: VerdictMode,
    pub firewall_base_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    pub has_api_key: bool,
    pub fail_mode: FailMode,
    pub deny_scope: DenyScope,
}

fn has_value(value: &Option<String>) -> bool {
    value.as_ref().map(|v| !v.is_empty()).unwrap_or(false)
}

fn parse_choice<T: serde::de::DeserializeOwned>(value: &str, what: &str) -> ProtectionResult<T> {
    let normalized = value.trim().to_lowercase().replace('-', "_");
    serde_json::from_value(serde_json::Value::String(normalized))
        .map_err(|_| ProtectionError::InvalidConfig(format!("unknown {what}: {value}")))
}

/// Settings persisted as pretty JSON on disk.
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Load settings, returning defaults if the file does not exist.
    pub fn load(&self) -> ProtectionResult<ProtectionSettings> {
        if !self.path.exists() {
            return Ok(ProtectionSettings::default());
        }
        let data = fs::read_to_string(&self.path).map_err(config_error)?;
        serde_json::from_str(&data).map_err(config_error)
    }

    pub fn save(&self, settings: &ProtectionSettings) -> ProtectionResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(config_error)?;
        }
        let data = serde_json::to_string_pretty(settings).map_err(config_error)?;
        fs::write(&self.path, data).map_err(config_error)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn config_error(error: impl std::fmt::Display) -> ProtectionError {
    ProtectionError::InvalidConfig(error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let settings = ProtectionSettings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings, ProtectionSettings::default());
        assert_eq!(settings.risk.base_url, "https://api.castle.io/v1");
        assert_eq!(settings.fail_mode, FailMode::Closed);
        assert_eq!(settings.deny_scope, DenyScope::CurrentAction);
        assert_eq!(settings.risk.verdict_mode, VerdictMode::Policy);
    }

    #[test]
    fn provider_variable_names_are_fallbacks() {
        let settings = ProtectionSettings::from_lookup(lookup(&[
            ("CASTLE_API_SECRET", "castle-secret"),
            ("RISKGUARD_FIREWALL_API_KEY", "primary"),
            ("CLOUDFLARE_API_TOKEN", "fallback"),
            ("CLOUDFLARE_API_EMAIL", "ops@example.com"),
        ]))
        .unwrap();
        assert_eq!(settings.risk.api_secret.as_deref(), Some("castle-secret"));
        assert_eq!(settings.enforcement.api_key.as_deref(), Some("primary"));
        assert_eq!(settings.enforcement.api_email.as_deref(), Some("ops@example.com"));
    }

    #[test]
    fn empty_values_and_bad_numbers_fall_back() {
        let settings = ProtectionSettings::from_lookup(lookup(&[
            ("RISKGUARD_RISK_BASE_URL", ""),
            ("RISKGUARD_RISK_TIMEOUT_MS", "soon"),
        ]))
        .unwrap();
        assert_eq!(settings.risk.base_url, DEFAULT_RISK_BASE_URL);
        assert_eq!(settings.risk.timeout_ms, DEFAULT_RISK_TIMEOUT_MS);
    }

    #[test]
    fn modes_parse_and_unknown_modes_fail() {
        let settings = ProtectionSettings::from_lookup(lookup(&[
            ("RISKGUARD_VERDICT_MODE", "Score"),
            ("RISKGUARD_FAIL_MODE", "open"),
            ("RISKGUARD_DENY_SCOPE", "future-requests"),
            ("RISKGUARD_SCRUBBED_HEADERS", "cookie, x-api-key,"),
        ]))
        .unwrap();
        assert_eq!(settings.risk.verdict_mode, VerdictMode::Score);
        assert_eq!(settings.fail_mode, FailMode::Open);
        assert_eq!(settings.deny_scope, DenyScope::FutureRequests);
        assert_eq!(settings.risk.scrubbed_headers, vec!["cookie", "x-api-key"]);

        let err = ProtectionSettings::from_lookup(lookup(&[("RISKGUARD_FAIL_MODE", "sideways")]))
            .unwrap_err();
        assert!(matches!(err, ProtectionError::InvalidConfig(_)));
    }

    #[test]
    fn validate_lists_missing_credentials() {
        let err = ProtectionSettings::default().validate().unwrap_err();
        let ProtectionError::InvalidConfig(message) = err else {
            panic!("expected InvalidConfig");
        };
        assert!(message.contains("risk api secret"));
        assert!(message.contains("firewall api key"));

        let mut settings = ProtectionSettings::default();
        settings.risk.api_secret = Some("s".to_string());
        settings.enforcement.account_id = Some("acct".to_string());
        settings.enforcement.api_email = Some("ops@example.com".to_string());
        settings.enforcement.api_key = Some("k".to_string());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn redacted_hides_secrets() {
        let mut settings = ProtectionSettings::default();
        settings.risk.api_secret = Some("s3cr3t-value".to_string());
        let redacted = settings.redacted();
        assert!(redacted.has_api_secret);
        assert!(!redacted.has_api_key);
        let json = serde_json::to_string(&redacted).unwrap();
        assert!(!json.contains("s3cr3t-value"));
    }

    #[test]
    fn store_round_trips_and_defaults_when_missing() {
        let dir = tempdir().expect("tempdir");
        let store = SettingsStore::new(dir.path().join("nested").join("riskguard.json"));
        assert_eq!(store.load().unwrap(), ProtectionSettings::default());

        let mut settings = ProtectionSettings::default();
        settings.fail_mode = FailMode::Open;
        settings.enforcement.account_id = Some("acct-1".to_string());
        store.save(&settings).expect("save");
        assert!(store.path().is_file());
        assert_eq!(store.load().unwrap(), settings);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("riskguard.json");
        fs::write(&path, r#"{ "risk": { "verdict_mode": "score" } }"#).unwrap();
        let settings = SettingsStore::new(path).load().unwrap();
        assert_eq!(settings.risk.verdict_mode, VerdictMode::Score);
        assert_eq!(settings.risk.timeout_ms, DEFAULT_RISK_TIMEOUT_MS);
        assert_eq!(settings.enforcement.base_url, DEFAULT_FIREWALL_BASE_URL);
    }
}
