/// Unified error type for the riskguard crate.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProtectionError {
    /// An event name outside the closed event table was looked up.
    #[error("unknown event: {0}")]
    UnknownEvent(String),

    #[error("invalid request token: {0}")]
    InvalidRequestToken(String),

    #[error("risk assessment unavailable: {0}")]
    AssessmentUnavailable(String),

    #[error("unrecognized policy action: {0}")]
    UnrecognizedPolicy(String),

    #[error("enforcement failed: {0}")]
    EnforcementFailed(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A protected action was driven through an illegal lifecycle transition.
    #[error("invalid state: {0}")]
    InvalidState(String),
}

impl ProtectionError {
    /// Stable machine-readable code, used in API error bodies and logs.
    pub fn code(&self) -> &'static str {
        match self {
            ProtectionError::UnknownEvent(_) => "unknown_event",
            ProtectionError::InvalidRequestToken(_) => "invalid_request_token",
            ProtectionError::AssessmentUnavailable(_) => "assessment_unavailable",
            ProtectionError::UnrecognizedPolicy(_) => "unrecognized_policy",
            ProtectionError::EnforcementFailed(_) => "enforcement_failed",
            ProtectionError::InvalidConfig(_) => "invalid_config",
            ProtectionError::InvalidState(_) => "invalid_state",
        }
    }
}

/// Result type alias using [`ProtectionError`].
pub type ProtectionResult<T> = Result<T, ProtectionError>;
