use serde::Serialize;

use super::scoring::{Decision, ScoringResult};

/// Qualitative framing of a counterfactual projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ImprovementLabel {
    #[serde(rename = "Likely Approval")]
    LikelyApproval,
    #[serde(rename = "Improved Chances")]
    ImprovedChances,
}

impl ImprovementLabel {
    pub fn label(self) -> &'static str {
        match self {
            ImprovementLabel::LikelyApproval => "Likely Approval",
            ImprovementLabel::ImprovedChances => "Improved Chances",
        }
    }
}

/// Baseline versus adjusted outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Improvement {
    pub baseline_probability: f64,
    pub adjusted_probability: f64,
    /// Adjusted minus baseline; negative means lower default risk.
    pub delta: f64,
    pub baseline_decision: Decision,
    pub adjusted_decision: Decision,
    pub label: Option<ImprovementLabel>,
}

impl Improvement {
    pub fn is_improvement(&self) -> bool {
        self.label.is_some()
    }
}

pub fn compare(baseline: &ScoringResult, adjusted: &ScoringResult) -> Improvement {
    let label = if adjusted.decision == Decision::Approve {
        Some(ImprovementLabel::LikelyApproval)
    } else if adjusted.default_probability < baseline.default_probability {
        Some(ImprovementLabel::ImprovedChances)
    } else {
        None
    };

    Improvement {
        baseline_probability: baseline.default_probability,
        adjusted_probability: adjusted.default_probability,
        delta: adjusted.default_probability - baseline.default_probability,
        baseline_decision: baseline.decision,
        adjusted_decision: adjusted.decision,
        label,
    }
}
