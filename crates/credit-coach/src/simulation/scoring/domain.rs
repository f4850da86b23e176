use serde::{Deserialize, Serialize};

use super::ScoringError;

/// Lending decision returned by the prediction service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    Approve,
    Review,
    Reject,
}

impl Decision {
    pub fn label(self) -> &'static str {
        match self {
            Decision::Approve => "Approve",
            Decision::Review => "Review",
            Decision::Reject => "Reject",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskCategory {
    Low,
    Medium,
    High,
}

impl RiskCategory {
    pub fn label(self) -> &'static str {
        match self {
            RiskCategory::Low => "Low",
            RiskCategory::Medium => "Medium",
            RiskCategory::High => "High",
        }
    }
}

/// Feature attribution reported alongside a score. Positive impact increases risk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    pub feature: String,
    pub impact: f64,
    #[serde(default)]
    pub description: String,
}

/// Result of one scoring call. Produced by the service, never recomputed locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringResult {
    pub default_probability: f64,
    pub decision: Decision,
    pub risk_category: RiskCategory,
    #[serde(default)]
    pub risk_index: f64,
    #[serde(rename = "top_3_risk_factors")]
    pub top_risk_factors: Vec<RiskFactor>,
    #[serde(rename = "explanation_text")]
    pub explanation: String,
}

impl ScoringResult {
    pub const MAX_RISK_FACTORS: usize = 3;

    /// Reject payloads that parsed but violate the response contract.
    pub fn validate(self) -> Result<Self, ScoringError> {
        let probability = self.default_probability;
        if !probability.is_finite() || !(0.0..=1.0).contains(&probability) {
            return Err(ScoringError::InvalidResponse(format!(
                "default_probability {probability} outside [0, 1]"
            )));
        }

        if self.top_risk_factors.len() > Self::MAX_RISK_FACTORS {
            return Err(ScoringError::InvalidResponse(format!(
                "expected at most {} risk factors, got {}",
                Self::MAX_RISK_FACTORS,
                self.top_risk_factors.len()
            )));
        }

        if let Some(factor) = self
            .top_risk_factors
            .iter()
            .find(|factor| !factor.impact.is_finite())
        {
            return Err(ScoringError::InvalidResponse(format!(
                "risk factor '{}' has a non-finite impact",
                factor.feature
            )));
        }

        Ok(self)
    }

    pub fn is_rejection(&self) -> bool {
        self.decision == Decision::Reject
    }
}
