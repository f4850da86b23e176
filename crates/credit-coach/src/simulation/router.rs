use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};

use super::coach::{Assessment, CreditCoach};
use super::counterfactual::CounterfactualOutcome;
use super::features::FeatureVector;
use super::scoring::ScoringClient;
use crate::error::AppError;

/// Router builder exposing the coaching endpoints.
pub fn coach_router<C>(coach: Arc<CreditCoach<C>>) -> Router
where
    C: ScoringClient + 'static,
{
    Router::new()
        .route("/api/v1/coach", post(assess_handler::<C>))
        .route(
            "/api/v1/coach/counterfactuals",
            post(counterfactuals_handler::<C>),
        )
        .with_state(coach)
}

pub(crate) async fn assess_handler<C>(
    State(coach): State<Arc<CreditCoach<C>>>,
    Json(features): Json<FeatureVector>,
) -> Result<Json<Assessment>, AppError>
where
    C: ScoringClient + 'static,
{
    let assessment = coach.assess(features).await?;
    Ok(Json(assessment))
}

pub(crate) async fn counterfactuals_handler<C>(
    State(coach): State<Arc<CreditCoach<C>>>,
    Json(features): Json<FeatureVector>,
) -> Json<CounterfactualOutcome>
where
    C: ScoringClient + 'static,
{
    Json(coach.engine().generate(&features))
}
