use std::collections::VecDeque;

use serde::Serialize;

/// Number of samples kept for the simulation trend.
pub const HISTORY_CAPACITY: usize = 10;

/// One point of the simulation trend. `index` is 1-based within the retained window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistorySample {
    pub index: usize,
    pub probability: f64,
}

/// Bounded FIFO of recent default probabilities.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryBuffer {
    capacity: usize,
    probabilities: VecDeque<f64>,
}

impl HistoryBuffer {
    pub fn new() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }

    /// A zero capacity is bumped to one so the latest sample is always visible.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            probabilities: VecDeque::with_capacity(capacity),
        }
    }

    pub fn append(&mut self, probability: f64) {
        if self.probabilities.len() == self.capacity {
            self.probabilities.pop_front();
        }
        self.probabilities.push_back(probability);
    }

    pub fn samples(&self) -> Vec<HistorySample> {
        self.probabilities
            .iter()
            .enumerate()
            .map(|(offset, probability)| HistorySample {
                index: offset + 1,
                probability: *probability,
            })
            .collect()
    }

    pub fn latest(&self) -> Option<f64> {
        self.probabilities.back().copied()
    }

    /// Change from the oldest retained sample to the newest.
    pub fn trend(&self) -> Option<f64> {
        match (self.probabilities.front(), self.probabilities.back()) {
            (Some(first), Some(last)) if self.probabilities.len() > 1 => Some(last - first),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.probabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probabilities.is_empty()
    }

    pub fn clear(&mut self) {
        self.probabilities.clear();
    }
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new()
    }
}
