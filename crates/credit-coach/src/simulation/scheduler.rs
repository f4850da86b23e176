//! Trailing-edge debounce in front of the scoring client.
//!
//! A driver task owns one [`DebounceTimer`] and a set of in-flight requests. Each edit re-arms
//! the timer; when it expires the latest vector is scored under the next sequence number.
//! Responses pass through a [`SequenceGate`] so a slow, older response can never replace a
//! newer one. Dropping or shutting down the scheduler aborts the driver, which cancels the
//! timer and every in-flight request with it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, warn};

use super::features::FeatureVector;
use super::scoring::{ScoringClient, ScoringError, ScoringMode, ScoringResult};
use crate::config::SimulationConfig;

/// Single cancellable deadline. Arming replaces any previous deadline.
#[derive(Debug)]
pub struct DebounceTimer {
    window: Duration,
    deadline: Option<Instant>,
}

impl DebounceTimer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
        }
    }

    pub fn arm(&mut self) {
        self.deadline = Some(Instant::now() + self.window);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Resolves at the deadline; pends forever while disarmed.
    pub async fn expired(&self) {
        match self.deadline {
            Some(deadline) => sleep_until(deadline).await,
            None => std::future::pending::<()>().await,
        }
    }
}

/// Monotonic request numbering compared at apply time.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SequenceGate {
    issued: u64,
    applied: u64,
    floor: u64,
}

impl SequenceGate {
    pub fn issue(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    /// Accept a response unless a newer one was already applied or it predates an invalidation.
    pub fn accept(&mut self, sequence: u64) -> bool {
        if sequence <= self.applied || sequence <= self.floor {
            return false;
        }
        self.applied = sequence;
        true
    }

    /// Mark everything issued so far as stale.
    pub fn invalidate(&mut self) {
        self.floor = self.issued;
    }

    pub fn issued(&self) -> u64 {
        self.issued
    }

    pub fn applied(&self) -> u64 {
        self.applied
    }
}

/// Scheduler tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerSettings {
    pub debounce: Duration,
    pub mode: ScoringMode,
}

impl SchedulerSettings {
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self {
            debounce: config.debounce_window(),
            mode: ScoringMode::Simulation,
        }
    }
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self::from_config(&SimulationConfig::default())
    }
}

/// Response that made it through the sequence gate.
#[derive(Debug, Clone)]
pub struct ScoredTick {
    pub sequence: u64,
    /// Number of invalidations the driver had processed when the tick was sent.
    pub epoch: u64,
    /// Submission whose vector was scored; see [`SimulationScheduler::submitted`].
    pub submission: u64,
    pub vector: FeatureVector,
    pub outcome: Result<ScoringResult, ScoringError>,
}

#[derive(Debug)]
enum SchedulerCommand {
    Submit { submission: u64, vector: FeatureVector },
    Invalidate,
}

/// Handle to a running debounce driver.
#[derive(Debug)]
pub struct SimulationScheduler {
    commands: mpsc::UnboundedSender<SchedulerCommand>,
    driver: JoinHandle<()>,
    epoch: u64,
    submitted: u64,
}

impl SimulationScheduler {
    /// Start the driver on the current tokio runtime. Accepted responses arrive on the
    /// returned receiver in the order they were applied.
    pub fn spawn<C>(
        client: Arc<C>,
        settings: SchedulerSettings,
    ) -> (Self, mpsc::UnboundedReceiver<ScoredTick>)
    where
        C: ScoringClient + 'static,
    {
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (tick_tx, tick_rx) = mpsc::unbounded_channel();
        let driver = tokio::spawn(drive(client, settings, command_rx, tick_tx));

        (
            Self {
                commands,
                driver,
                epoch: 0,
                submitted: 0,
            },
            tick_rx,
        )
    }

    /// Queue a new vector. Returns false once the driver is gone.
    pub fn submit(&mut self, vector: FeatureVector) -> bool {
        let submission = self.submitted + 1;
        let sent = self
            .commands
            .send(SchedulerCommand::Submit { submission, vector })
            .is_ok();
        if sent {
            self.submitted = submission;
        }
        sent
    }

    /// Number of vectors accepted by [`submit`](Self::submit) so far.
    pub fn submitted(&self) -> u64 {
        self.submitted
    }

    /// Cancel the pending timer and mark every request issued so far as stale.
    ///
    /// Ticks already queued on the receiver carry an older [`epoch`](Self::epoch) and
    /// should be ignored by the caller.
    pub fn invalidate(&mut self) -> bool {
        self.epoch += 1;
        self.commands.send(SchedulerCommand::Invalidate).is_ok()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn shutdown(self) {
        // Drop aborts the driver.
    }
}

impl Drop for SimulationScheduler {
    fn drop(&mut self) {
        self.driver.abort();
    }
}

type RequestOutput = (u64, u64, FeatureVector, Result<ScoringResult, ScoringError>);

async fn drive<C>(
    client: Arc<C>,
    settings: SchedulerSettings,
    mut commands: mpsc::UnboundedReceiver<SchedulerCommand>,
    ticks: mpsc::UnboundedSender<ScoredTick>,
) where
    C: ScoringClient + 'static,
{
    let mut timer = DebounceTimer::new(settings.debounce);
    let mut gate = SequenceGate::default();
    let mut pending: Option<(u64, FeatureVector)> = None;
    let mut in_flight: JoinSet<RequestOutput> = JoinSet::new();
    let mut epoch: u64 = 0;

    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(SchedulerCommand::Submit { submission, vector }) => {
                    pending = Some((submission, vector));
                    timer.arm();
                }
                Some(SchedulerCommand::Invalidate) => {
                    pending = None;
                    timer.cancel();
                    gate.invalidate();
                    epoch += 1;
                }
                None => break,
            },
            _ = timer.expired(), if timer.is_armed() => {
                timer.cancel();
                if let Some((submission, vector)) = pending.take() {
                    let sequence = gate.issue();
                    debug!(sequence, "debounce window elapsed, issuing scoring request");
                    let client = Arc::clone(&client);
                    in_flight.spawn(async move {
                        let outcome = client.score(&vector, settings.mode).await;
                        (sequence, submission, vector, outcome)
                    });
                }
            },
            Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => match joined {
                Ok((sequence, submission, vector, outcome)) => {
                    if !gate.accept(sequence) {
                        debug!(sequence, applied = gate.applied(), "discarding stale scoring response");
                        continue;
                    }
                    let tick = ScoredTick {
                        sequence,
                        epoch,
                        submission,
                        vector,
                        outcome,
                    };
                    if ticks.send(tick).is_err() {
                        break;
                    }
                }
                Err(err) => warn!(error = %err, "scoring task ended abnormally"),
            },
        }
    }

    in_flight.abort_all();
}
