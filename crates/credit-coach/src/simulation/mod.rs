//! What-if simulation and counterfactual coaching.
//!
//! Edits flow through a [`SimulationSession`], which debounces them with a
//! [`SimulationScheduler`] before asking the [`ScoringClient`] for a new score and recording it
//! in a [`HistoryBuffer`]. Rejected assessments go through the [`CreditCoach`], which derives
//! remediation steps with the [`CounterfactualEngine`] and compares the projected outcome.

pub mod coach;
pub mod comparator;
pub mod counterfactual;
pub mod features;
pub mod history;
pub mod intake;
pub mod router;
pub mod scheduler;
pub mod scoring;
pub mod session;

#[cfg(test)]
mod tests;

pub use coach::{Assessment, CoachingPlan, CreditCoach, Projection};
pub use comparator::{compare, Improvement, ImprovementLabel};
pub use counterfactual::{CounterfactualEngine, CounterfactualOutcome, CounterfactualRule, Suggestion};
pub use features::{FeatureField, FeatureVector};
pub use history::{HistoryBuffer, HistorySample, HISTORY_CAPACITY};
pub use intake::{ApplicantCsvReader, ApplicantRow, IntakeError};
pub use router::coach_router;
pub use scheduler::{DebounceTimer, SchedulerSettings, ScoredTick, SequenceGate, SimulationScheduler};
pub use scoring::{
    Decision, HttpScoringClient, RiskCategory, RiskFactor, ScoringClient, ScoringError,
    ScoringMode, ScoringResult,
};
pub use session::{SessionSnapshot, SessionUpdate, SimulationSession};
