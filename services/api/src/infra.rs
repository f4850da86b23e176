use credit_coach::config::{normalize_scoring_url, ScoringConfig};
use credit_coach::error::AppError;
use credit_coach::simulation::{FeatureField, FeatureVector, HttpScoringClient};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// One `Field=Value` override from the command line. The value stays raw so it is coerced
/// exactly like form input.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FeatureAssignment {
    pub(crate) field: FeatureField,
    pub(crate) raw: String,
}

pub(crate) fn parse_assignment(raw: &str) -> Result<FeatureAssignment, String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected Field=Value, got '{raw}'"))?;

    let field = FeatureField::from_name(name.trim()).ok_or_else(|| {
        let known: Vec<&str> = FeatureField::ALL
            .iter()
            .map(|field| field.wire_name())
            .collect();
        format!("unknown feature '{}' (expected one of: {})", name.trim(), known.join(", "))
    })?;

    Ok(FeatureAssignment {
        field,
        raw: value.trim().to_string(),
    })
}

pub(crate) fn apply_assignments(
    vector: FeatureVector,
    assignments: &[FeatureAssignment],
) -> FeatureVector {
    assignments
        .iter()
        .fold(vector, |vector, assignment| {
            vector.with_input(assignment.field, &assignment.raw)
        })
}

pub(crate) fn scoring_client(
    config: &ScoringConfig,
    base_url: Option<String>,
) -> Result<Arc<HttpScoringClient>, AppError> {
    let mut config = config.clone();
    if let Some(base_url) = base_url {
        config.base_url = normalize_scoring_url(&base_url)?;
    }
    Ok(Arc::new(HttpScoringClient::new(&config)?))
}

pub(crate) fn format_percent(probability: f64) -> String {
    format!("{:.1}%", probability * 100.0)
}
