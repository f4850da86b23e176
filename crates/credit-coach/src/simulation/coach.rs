use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::comparator::{compare, Improvement};
use super::counterfactual::{CounterfactualEngine, Suggestion};
use super::features::FeatureVector;
use super::scoring::{ScoringClient, ScoringError, ScoringMode, ScoringResult};

/// Projected effect of following the coaching plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Projection {
    /// No rule fired, so nothing was re-scored.
    NotNeeded,
    Available {
        adjusted: ScoringResult,
        improvement: Improvement,
    },
    /// Re-scoring failed; suggestions stand on their own.
    Unavailable { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoachingPlan {
    pub suggestions: Vec<Suggestion>,
    pub adjusted_features: FeatureVector,
    pub projection: Projection,
}

impl CoachingPlan {
    pub fn improvement(&self) -> Option<&Improvement> {
        match &self.projection {
            Projection::Available { improvement, .. } => Some(improvement),
            _ => None,
        }
    }
}

/// Official assessment plus the coaching plan when the application is rejected.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assessment {
    pub features: FeatureVector,
    pub baseline: ScoringResult,
    pub coaching: Option<CoachingPlan>,
}

/// Counterfactual coaching flow. Independent of any live simulation session.
#[derive(Debug)]
pub struct CreditCoach<C> {
    client: Arc<C>,
    engine: CounterfactualEngine,
}

impl<C> CreditCoach<C>
where
    C: ScoringClient,
{
    pub fn new(client: Arc<C>) -> Self {
        Self::with_engine(client, CounterfactualEngine::standard())
    }

    pub fn with_engine(client: Arc<C>, engine: CounterfactualEngine) -> Self {
        Self { client, engine }
    }

    pub fn engine(&self) -> &CounterfactualEngine {
        &self.engine
    }

    /// Score the applicant through `/predict` and coach only when rejected.
    pub async fn assess(&self, features: FeatureVector) -> Result<Assessment, ScoringError> {
        let baseline = self
            .client
            .score(&features, ScoringMode::Assessment)
            .await?;

        let coaching = if baseline.is_rejection() {
            Some(self.coach(&features, &baseline).await)
        } else {
            None
        };

        Ok(Assessment {
            features,
            baseline,
            coaching,
        })
    }

    /// Build suggestions for `features` and project their combined effect via `/what-if`.
    ///
    /// A failed projection never fails the plan.
    pub async fn coach(&self, features: &FeatureVector, baseline: &ScoringResult) -> CoachingPlan {
        let outcome = self.engine.generate(features);

        let projection = if !outcome.has_suggestions() {
            Projection::NotNeeded
        } else {
            match self
                .client
                .score(&outcome.adjusted, ScoringMode::Simulation)
                .await
            {
                Ok(adjusted) => {
                    let improvement = compare(baseline, &adjusted);
                    info!(
                        suggestions = outcome.suggestions.len(),
                        baseline = improvement.baseline_probability,
                        projected = improvement.adjusted_probability,
                        "coaching projection ready"
                    );
                    Projection::Available {
                        adjusted,
                        improvement,
                    }
                }
                Err(err) => {
                    warn!(error = %err, "coaching projection failed");
                    Projection::Unavailable {
                        reason: err.to_string(),
                    }
                }
            }
        };

        CoachingPlan {
            suggestions: outcome.suggestions,
            adjusted_features: outcome.adjusted,
            projection,
        }
    }
}
