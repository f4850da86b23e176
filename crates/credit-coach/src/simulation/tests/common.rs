use std::sync::Mutex;
use std::time::Duration;

use axum::response::Response;
use serde_json::Value;

use crate::simulation::features::{FeatureField, FeatureVector};
use crate::simulation::scheduler::SchedulerSettings;
use crate::simulation::scoring::{
    Decision, RiskCategory, RiskFactor, ScoringClient, ScoringError, ScoringMode, ScoringResult,
};

type Responder =
    Box<dyn Fn(&FeatureVector, ScoringMode) -> Result<ScoringResult, ScoringError> + Send + Sync>;
type Latency = Box<dyn Fn(&FeatureVector) -> Duration + Send + Sync>;

/// In-memory stand-in for the prediction service with scripted answers and latency.
pub(super) struct ScriptedScoringClient {
    calls: Mutex<Vec<(FeatureVector, ScoringMode)>>,
    responder: Responder,
    latency: Latency,
}

impl ScriptedScoringClient {
    pub(super) fn new<F>(responder: F) -> Self
    where
        F: Fn(&FeatureVector, ScoringMode) -> Result<ScoringResult, ScoringError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            calls: Mutex::new(Vec::new()),
            responder: Box::new(responder),
            latency: Box::new(|_| Duration::ZERO),
        }
    }

    /// Probability derived from monthly income so tests can tell which vector was scored.
    pub(super) fn income_driven() -> Self {
        Self::new(|vector, _| Ok(income_result(vector)))
    }

    pub(super) fn with_latency<F>(mut self, latency: F) -> Self
    where
        F: Fn(&FeatureVector) -> Duration + Send + Sync + 'static,
    {
        self.latency = Box::new(latency);
        self
    }

    pub(super) fn calls(&self) -> Vec<(FeatureVector, ScoringMode)> {
        self.calls.lock().expect("calls mutex poisoned").clone()
    }

    pub(super) fn call_count(&self) -> usize {
        self.calls.lock().expect("calls mutex poisoned").len()
    }
}

impl ScoringClient for ScriptedScoringClient {
    async fn score(
        &self,
        vector: &FeatureVector,
        mode: ScoringMode,
    ) -> Result<ScoringResult, ScoringError> {
        self.calls
            .lock()
            .expect("calls mutex poisoned")
            .push((*vector, mode));

        let latency = (self.latency)(vector);
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        (self.responder)(vector, mode)
    }
}

pub(super) fn scoring_result(probability: f64, decision: Decision) -> ScoringResult {
    let risk_category = if probability < 0.2 {
        RiskCategory::Low
    } else if probability < 0.5 {
        RiskCategory::Medium
    } else {
        RiskCategory::High
    };

    ScoringResult {
        default_probability: probability,
        decision,
        risk_category,
        risk_index: 0.0,
        top_risk_factors: vec![RiskFactor {
            feature: FeatureField::DebtRatio.wire_name().to_string(),
            impact: 0.4,
            description: "DebtRatio increases risk".to_string(),
        }],
        explanation: format!("Your default probability is {:.1}%.", probability * 100.0),
    }
}

pub(super) fn income_result(vector: &FeatureVector) -> ScoringResult {
    let probability = (1.0 - vector.monthly_income / 10_000.0).clamp(0.0, 1.0);
    let decision = if probability < 0.3 {
        Decision::Approve
    } else if probability < 0.6 {
        Decision::Review
    } else {
        Decision::Reject
    };
    scoring_result(probability, decision)
}

/// Intake default with a high debt ratio, high utilization and two 90-day delinquencies.
pub(super) fn rejected_profile() -> FeatureVector {
    FeatureVector::intake_default()
        .with(FeatureField::DebtRatio, 0.5)
        .with(FeatureField::RevolvingUtilization, 0.35)
        .with(FeatureField::Late90Days, 2.0)
}

pub(super) fn settings(debounce_ms: u64) -> SchedulerSettings {
    SchedulerSettings {
        debounce: Duration::from_millis(debounce_ms),
        mode: ScoringMode::Simulation,
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 16 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
