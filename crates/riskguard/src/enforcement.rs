//! Network-address enforcement at an external firewall.

pub mod cloudflare;
pub mod gateway;

pub use cloudflare::CloudflareGateway;
pub use gateway::{
    EnforcementGateway, EnforcementInstruction, EnforcementMode, SharedEnforcementGateway,
};
