use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::features::{FeatureField, FeatureVector};
use super::history::{HistoryBuffer, HistorySample};
use super::scheduler::{SchedulerSettings, ScoredTick, SimulationScheduler};
use super::scoring::{ScoringClient, ScoringResult};

/// Live what-if session: owns the edited vector, the trend history and the last
/// known-good result. Sessions share nothing with each other.
#[derive(Debug)]
pub struct SimulationSession {
    initial: FeatureVector,
    current: FeatureVector,
    history: HistoryBuffer,
    last_result: Option<ScoringResult>,
    last_error: Option<String>,
    /// When the most recent response, successful or not, was applied.
    updated_at: Option<DateTime<Utc>>,
    /// Submission behind the most recently applied response.
    last_applied: u64,
    scheduler: SimulationScheduler,
    ticks: mpsc::UnboundedReceiver<ScoredTick>,
}

/// What a single applied response changed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionUpdate {
    Scored { sequence: u64, probability: f64 },
    Failed { sequence: u64, message: String },
}

/// Serializable view of the session for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub features: FeatureVector,
    pub result: Option<ScoringResult>,
    pub error: Option<String>,
    pub history: Vec<HistorySample>,
    pub trend: Option<f64>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl SimulationSession {
    /// Start a session and immediately schedule scoring of the initial vector.
    pub fn start<C>(client: Arc<C>, initial: FeatureVector, settings: SchedulerSettings) -> Self
    where
        C: ScoringClient + 'static,
    {
        let (mut scheduler, ticks) = SimulationScheduler::spawn(client, settings);
        scheduler.submit(initial);

        Self {
            initial,
            current: initial,
            history: HistoryBuffer::new(),
            last_result: None,
            last_error: None,
            updated_at: None,
            last_applied: 0,
            scheduler,
            ticks,
        }
    }

    pub fn features(&self) -> &FeatureVector {
        &self.current
    }

    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    pub fn last_result(&self) -> Option<&ScoringResult> {
        self.last_result.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// True once the response for the latest submitted edit has been applied.
    pub fn is_settled(&self) -> bool {
        self.last_applied == self.scheduler.submitted()
    }

    /// Replace one field and schedule a re-score of the new vector.
    pub fn edit(&mut self, field: FeatureField, value: f64) -> FeatureVector {
        self.replace(self.current.with(field, value))
    }

    /// Like [`edit`](Self::edit) but from raw text; unparseable input becomes zero.
    pub fn edit_input(&mut self, field: FeatureField, raw: &str) -> FeatureVector {
        self.replace(self.current.with_input(field, raw))
    }

    /// Restore the initial vector, clear the trend and drop any response still in flight.
    pub fn reset(&mut self) {
        self.scheduler.invalidate();
        self.history.clear();
        self.last_error = None;
        self.replace(self.initial);
    }

    /// Wait for the next accepted response and apply it. `None` once the scheduler is gone.
    pub async fn next_update(&mut self) -> Option<SessionUpdate> {
        loop {
            let tick = self.ticks.recv().await?;
            if let Some(update) = self.apply(tick) {
                return Some(update);
            }
        }
    }

    /// Apply every response that is already waiting without blocking.
    pub fn drain(&mut self) -> Vec<SessionUpdate> {
        let mut updates = Vec::new();
        while let Ok(tick) = self.ticks.try_recv() {
            updates.extend(self.apply(tick));
        }
        updates
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            features: self.current,
            result: self.last_result.clone(),
            error: self.last_error.clone(),
            history: self.history.samples(),
            trend: self.history.trend(),
            updated_at: self.updated_at,
        }
    }

    /// Tear the session down. Pending timers and in-flight requests are cancelled.
    pub fn stop(self) {
        self.scheduler.shutdown();
    }

    fn replace(&mut self, next: FeatureVector) -> FeatureVector {
        self.current = next;
        if !self.scheduler.submit(next) {
            warn!("simulation scheduler stopped; edit will not be scored");
        }
        next
    }

    fn apply(&mut self, tick: ScoredTick) -> Option<SessionUpdate> {
        if tick.epoch < self.scheduler.epoch() {
            debug!(sequence = tick.sequence, "ignoring response issued before reset");
            return None;
        }

        self.last_applied = tick.submission;
        self.updated_at = Some(Utc::now());
        let update = match tick.outcome {
            Ok(result) => {
                let probability = result.default_probability;
                self.history.append(probability);
                self.last_result = Some(result);
                self.last_error = None;
                info!(sequence = tick.sequence, probability, "simulation updated");
                SessionUpdate::Scored {
                    sequence: tick.sequence,
                    probability,
                }
            }
            Err(err) => {
                warn!(sequence = tick.sequence, error = %err, "simulation scoring failed");
                let message = err.banner().to_string();
                self.last_error = Some(message.clone());
                SessionUpdate::Failed {
                    sequence: tick.sequence,
                    message,
                }
            }
        };
        Some(update)
    }
}
