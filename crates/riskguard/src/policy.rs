//! Verdict classification and the allow/challenge/deny dispatcher.

pub mod action;
pub mod verdict;

pub use action::ActionDispatcher;
pub use verdict::{Classification, RiskBucket, RiskScore, RiskVerdict, VerdictMode};
