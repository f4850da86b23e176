mod rules;

pub use rules::CounterfactualRule;

use serde::{Deserialize, Serialize};

use super::features::{FeatureField, FeatureVector};
use rules::STANDARD_RULES;

/// Stateless evaluator that applies the remediation table to a feature vector.
#[derive(Debug, Clone)]
pub struct CounterfactualEngine {
    rules: Vec<CounterfactualRule>,
}

impl CounterfactualEngine {
    /// Rules are evaluated in the given order. A field claimed by an earlier rule is skipped
    /// by later ones.
    pub fn new(rules: Vec<CounterfactualRule>) -> Self {
        Self { rules }
    }

    pub fn standard() -> Self {
        Self::new(STANDARD_RULES.to_vec())
    }

    pub fn rules(&self) -> &[CounterfactualRule] {
        &self.rules
    }

    /// Derive suggestions and the adjusted vector.
    ///
    /// Every predicate sees the baseline; the triggered targets are written onto a copy of the
    /// baseline together, so rules never compound.
    pub fn generate(&self, vector: &FeatureVector) -> CounterfactualOutcome {
        let mut suggestions: Vec<Suggestion> = Vec::new();
        let mut adjusted = *vector;

        for rule in &self.rules {
            if suggestions.iter().any(|existing| existing.field == rule.field) {
                continue;
            }

            let current = vector.get(rule.field);
            if !(rule.applies)(current) {
                continue;
            }

            let target = rule.target_for(current);
            adjusted = adjusted.with(rule.field, target);
            suggestions.push(Suggestion {
                label: rule.label.to_string(),
                action: rule.action.to_string(),
                field: rule.field,
                current,
                target,
            });
        }

        CounterfactualOutcome {
            suggestions,
            adjusted,
        }
    }
}

impl Default for CounterfactualEngine {
    fn default() -> Self {
        Self::standard()
    }
}

/// One remediation step shown to the applicant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub label: String,
    pub action: String,
    pub field: FeatureField,
    pub current: f64,
    pub target: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CounterfactualOutcome {
    pub suggestions: Vec<Suggestion>,
    pub adjusted: FeatureVector,
}

impl CounterfactualOutcome {
    /// True when at least one rule fired and the adjusted vector is worth re-scoring.
    pub fn has_suggestions(&self) -> bool {
        !self.suggestions.is_empty()
    }
}
