use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ProtectionError, ProtectionResult};

/// Scores at or above this are challenged.
pub const CHALLENGE_THRESHOLD: f64 = 0.6;
/// Scores at or above this are denied.
pub const DENY_THRESHOLD: f64 = 0.8;

/// Three-way outcome every verdict reduces to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Allow,
    Challenge,
    Deny,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Allow => "allow",
            Classification::Challenge => "challenge",
            Classification::Deny => "deny",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which part of the provider response is authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerdictMode {
    Score,
    #[default]
    Policy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskBucket {
    Low,
    Medium,
    High,
}

/// A provider risk score, guaranteed to lie in `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct RiskScore(f64);

impl RiskScore {
    pub fn new(value: f64) -> ProtectionResult<Self> {
        if (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ProtectionError::AssessmentUnavailable(format!(
                "risk score out of range: {value}"
            )))
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn bucket(&self) -> RiskBucket {
        if self.0 >= DENY_THRESHOLD {
            RiskBucket::High
        } else if self.0 >= CHALLENGE_THRESHOLD {
            RiskBucket::Medium
        } else {
            RiskBucket::Low
        }
    }
}

/// Parsed result of one risk evaluation. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RiskVerdict {
    Score(RiskScore),
    Policy(Classification),
}

impl RiskVerdict {
    pub fn from_score(value: f64) -> ProtectionResult<Self> {
        RiskScore::new(value).map(RiskVerdict::Score)
    }

    /// Map the provider's literal policy action. Anything outside
    /// allow/challenge/deny is a contract violation, never an allow.
    pub fn from_policy_action(action: &str) -> ProtectionResult<Self> {
        let classification = match action {
            "allow" => Classification::Allow,
            "challenge" => Classification::Challenge,
            "deny" => Classification::Deny,
            other => return Err(ProtectionError::UnrecognizedPolicy(other.to_string())),
        };
        Ok(RiskVerdict::Policy(classification))
    }

    pub fn classify(&self) -> Classification {
        match self {
            RiskVerdict::Score(score) => match score.bucket() {
                RiskBucket::Low => Classification::Allow,
                RiskBucket::Medium => Classification::Challenge,
                RiskBucket::High => Classification::Deny,
            },
            RiskVerdict::Policy(classification) => *classification,
        }
    }

    pub fn is_allow(&self) -> bool {
        self.classify() == Classification::Allow
    }

    pub fn is_challenge(&self) -> bool {
        self.classify() == Classification::Challenge
    }

    pub fn is_deny(&self) -> bool {
        self.classify() == Classification::Deny
    }
}
