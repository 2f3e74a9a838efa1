//! Runs at most one handler for a verdict.

use super::verdict::{Classification, RiskVerdict};

/// Stateless dispatcher over a single classification. Because the
/// classification is one value, `on_deny` and `on_challenge` can never both
/// fire for the same verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionDispatcher {
    classification: Classification,
}

impl ActionDispatcher {
    pub fn new(verdict: &RiskVerdict) -> Self {
        Self::for_classification(verdict.classify())
    }

    pub fn for_classification(classification: Classification) -> Self {
        Self { classification }
    }

    pub fn classification(&self) -> Classification {
        self.classification
    }

    /// Invoke `handler` iff the verdict is a deny.
    pub fn on_deny<T>(&self, handler: impl FnOnce() -> T) -> Option<T> {
        (self.classification == Classification::Deny).then(handler)
    }

    /// Invoke `handler` iff the verdict is a challenge.
    pub fn on_challenge<T>(&self, handler: impl FnOnce() -> T) -> Option<T> {
        (self.classification == Classification::Challenge).then(handler)
    }
}
