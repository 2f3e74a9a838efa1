use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProtectionResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnforcementMode {
    Block,
    Challenge,
}

impl EnforcementMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnforcementMode::Block => "block",
            EnforcementMode::Challenge => "challenge",
        }
    }
}

impl fmt::Display for EnforcementMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A block or challenge rule for one address. Fire-and-forget once issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnforcementInstruction {
    ip: IpAddr,
    mode: EnforcementMode,
}

impl EnforcementInstruction {
    pub fn new(ip: IpAddr, mode: EnforcementMode) -> Self {
        Self { ip, mode }
    }

    pub fn block(ip: IpAddr) -> Self {
        Self::new(ip, EnforcementMode::Block)
    }

    pub fn challenge(ip: IpAddr) -> Self {
        Self::new(ip, EnforcementMode::Challenge)
    }

    pub fn ip(&self) -> IpAddr {
        self.ip
    }

    pub fn mode(&self) -> EnforcementMode {
        self.mode
    }
}

/// The external firewall. Installing the same rule twice is harmless, but
/// implementations do not deduplicate.
#[async_trait]
pub trait EnforcementGateway: Send + Sync {
    async fn apply(&self, instruction: &EnforcementInstruction) -> ProtectionResult<()>;
}

pub type SharedEnforcementGateway = Arc<dyn EnforcementGateway>;
