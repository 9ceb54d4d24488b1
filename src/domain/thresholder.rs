//! Maps a validated signal to BUY / SELL / HOLD.

use crate::domain::config::{ActionThresholds, ConfidenceGate};
use crate::domain::signal::{Action, SignalRecord};

pub trait ActionThresholder: Send + Sync {
    fn action(&self, record: &SignalRecord) -> Action;
}

/// Strict comparisons: a signal sitting exactly on a threshold holds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ThresholdPolicy {
    pub thresholds: ActionThresholds,
    pub gate: ConfidenceGate,
}

impl ThresholdPolicy {
    pub fn new(thresholds: ActionThresholds, gate: ConfidenceGate) -> Self {
        Self { thresholds, gate }
    }

    pub fn decide(&self, combined: f64, confidence: f64) -> Action {
        if let Some(floor) = self.gate.min_floor {
            if confidence < floor {
                return Action::Hold;
            }
        }
        if combined > self.thresholds.buy {
            Action::Buy
        } else if combined < self.thresholds.sell {
            Action::Sell
        } else {
            Action::Hold
        }
    }
}

impl ActionThresholder for ThresholdPolicy {
    fn action(&self, record: &SignalRecord) -> Action {
        self.decide(record.combined_signal, record.confidence)
    }
}
