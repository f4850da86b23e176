//! Boundary to the external prediction service.

mod client;
mod domain;

pub use client::HttpScoringClient;
pub use domain::{Decision, RiskCategory, RiskFactor, ScoringResult};

use std::future::Future;

use super::features::FeatureVector;

/// Which service endpoint a request targets.
///
/// Both endpoints share a contract; the split lets the service tell official assessments
/// apart from exploratory simulation traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoringMode {
    Assessment,
    Simulation,
}

impl ScoringMode {
    pub fn path(self) -> &'static str {
        match self {
            ScoringMode::Assessment => "/predict",
            ScoringMode::Simulation => "/what-if",
        }
    }
}

/// Anything able to score a feature vector. Implementations never retry on their own.
pub trait ScoringClient: Send + Sync {
    fn score(
        &self,
        vector: &FeatureVector,
        mode: ScoringMode,
    ) -> impl Future<Output = Result<ScoringResult, ScoringError>> + Send;
}

/// Failure raised at the scoring boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScoringError {
    #[error("scoring service unreachable: {0}")]
    Network(String),
    #[error("scoring service unavailable (HTTP {status})")]
    ServiceUnavailable { status: u16 },
    #[error("scoring service returned an invalid response: {0}")]
    InvalidResponse(String),
}

impl ScoringError {
    /// Message shown to the user when a scoring call fails.
    pub fn banner(&self) -> &'static str {
        match self {
            ScoringError::Network(_) | ScoringError::ServiceUnavailable { .. } => {
                "Failed to calculate risk. Ensure the scoring service is running."
            }
            ScoringError::InvalidResponse(_) => {
                "The scoring service returned an unexpected response."
            }
        }
    }
}
