use std::sync::Arc;
use std::time::Duration;

use super::common::*;
use crate::simulation::features::{FeatureField, FeatureVector};
use crate::simulation::scheduler::SimulationScheduler;
use crate::simulation::scoring::{ScoringError, ScoringMode};

fn with_income(income: f64) -> FeatureVector {
    FeatureVector::simulator_default().with(FeatureField::MonthlyIncome, income)
}

#[tokio::test(start_paused = true)]
async fn burst_of_edits_collapses_to_one_trailing_request() {
    let client = Arc::new(ScriptedScoringClient::income_driven());
    let (mut scheduler, mut ticks) = SimulationScheduler::spawn(Arc::clone(&client), settings(500));

    for income in [1000.0, 2000.0, 3000.0, 4000.0, 5000.0] {
        assert!(scheduler.submit(with_income(income)));
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    let tick = ticks.recv().await.expect("one response");
    assert_eq!(tick.sequence, 1);
    assert_eq!(tick.vector.monthly_income, 5000.0);
    assert_eq!(tick.submission, 5);
    assert_eq!(scheduler.submitted(), 5);

    let quiet = tokio::time::timeout(Duration::from_secs(5), ticks.recv()).await;
    assert!(quiet.is_err(), "no further requests expected");

    let calls = client.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0.monthly_income, 5000.0);
    assert_eq!(calls[0].1, ScoringMode::Simulation);
}

#[tokio::test(start_paused = true)]
async fn separated_edits_each_get_a_request() {
    let client = Arc::new(ScriptedScoringClient::income_driven());
    let (mut scheduler, mut ticks) = SimulationScheduler::spawn(Arc::clone(&client), settings(500));

    scheduler.submit(with_income(2000.0));
    let first = ticks.recv().await.expect("first response");
    scheduler.submit(with_income(8000.0));
    let second = ticks.recv().await.expect("second response");

    assert_eq!((first.sequence, second.sequence), (1, 2));
    let probability = second.outcome.expect("scored").default_probability;
    assert!((probability - 0.2).abs() < 1e-9);
    assert_eq!(client.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn slow_earlier_response_never_overwrites_a_newer_one() {
    let client = Arc::new(
        ScriptedScoringClient::income_driven().with_latency(|vector| {
            if vector.monthly_income < 1500.0 {
                Duration::from_secs(2)
            } else {
                Duration::from_millis(100)
            }
        }),
    );
    let (mut scheduler, mut ticks) = SimulationScheduler::spawn(Arc::clone(&client), settings(500));

    scheduler.submit(with_income(1000.0));
    tokio::time::sleep(Duration::from_millis(600)).await;
    scheduler.submit(with_income(2000.0));

    let applied = ticks.recv().await.expect("newer response");
    assert_eq!(applied.sequence, 2);
    assert_eq!(applied.vector.monthly_income, 2000.0);

    let late = tokio::time::timeout(Duration::from_secs(5), ticks.recv()).await;
    assert!(late.is_err(), "stale response must be discarded");
    assert_eq!(client.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn in_order_arrivals_are_all_applied() {
    let client = Arc::new(
        ScriptedScoringClient::income_driven().with_latency(|_| Duration::from_millis(800)),
    );
    let (mut scheduler, mut ticks) = SimulationScheduler::spawn(Arc::clone(&client), settings(500));

    scheduler.submit(with_income(1000.0));
    tokio::time::sleep(Duration::from_millis(600)).await;
    scheduler.submit(with_income(2000.0));

    let first = ticks.recv().await.expect("first response");
    let second = ticks.recv().await.expect("second response");
    assert_eq!((first.sequence, second.sequence), (1, 2));
}

#[tokio::test(start_paused = true)]
async fn failures_are_delivered_with_their_sequence() {
    let client = Arc::new(ScriptedScoringClient::new(|_, _| {
        Err(ScoringError::Network("connection refused".to_string()))
    }));
    let (mut scheduler, mut ticks) = SimulationScheduler::spawn(Arc::clone(&client), settings(500));

    scheduler.submit(FeatureVector::simulator_default());
    let tick = ticks.recv().await.expect("failure delivered");

    assert_eq!(tick.sequence, 1);
    assert!(matches!(tick.outcome, Err(ScoringError::Network(_))));
}

#[tokio::test(start_paused = true)]
async fn shutdown_cancels_pending_timer() {
    let client = Arc::new(ScriptedScoringClient::income_driven());
    let (mut scheduler, mut ticks) = SimulationScheduler::spawn(Arc::clone(&client), settings(500));

    scheduler.submit(with_income(3000.0));
    tokio::time::sleep(Duration::from_millis(100)).await;
    scheduler.shutdown();

    assert!(ticks.recv().await.is_none());
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(client.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn shutdown_drops_in_flight_responses() {
    let client = Arc::new(
        ScriptedScoringClient::income_driven().with_latency(|_| Duration::from_secs(3)),
    );
    let (mut scheduler, mut ticks) = SimulationScheduler::spawn(Arc::clone(&client), settings(500));

    scheduler.submit(with_income(3000.0));
    tokio::time::sleep(Duration::from_millis(700)).await;
    assert_eq!(client.call_count(), 1);
    scheduler.shutdown();

    assert!(ticks.recv().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn invalidation_discards_requests_already_issued() {
    let client = Arc::new(
        ScriptedScoringClient::income_driven().with_latency(|vector| {
            if vector.monthly_income < 1500.0 {
                Duration::from_secs(1)
            } else {
                Duration::from_secs(3)
            }
        }),
    );
    let (mut scheduler, mut ticks) =
        SimulationScheduler::spawn(Arc::clone(&client), settings(500));

    scheduler.submit(with_income(1000.0));
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert!(scheduler.invalidate());
    assert_eq!(scheduler.epoch(), 1);
    scheduler.submit(with_income(9000.0));

    let tick = ticks.recv().await.expect("post-invalidation response");
    assert_eq!(tick.sequence, 2);
    assert_eq!(tick.epoch, 1);
    assert_eq!(tick.vector.monthly_income, 9000.0);
}
