//! Endowment split for the payoff-relevant decision.

use serde::{Deserialize, Serialize};

/// A dictator-style split of the endowment between the participant and
/// the (possibly concealed) recipient.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitDecision {
    pub endowment: f64,
    pub kept: f64,
    pub assigned: f64,
}

impl SplitDecision {
    /// Build a split from the amount the participant chose to keep.
    /// The kept amount is clamped into [0, endowment] so the two parts
    /// always sum to the endowment.
    pub fn new(endowment: f64, kept: f64) -> Self {
        let kept = kept.clamp(0.0, endowment);
        Self {
            endowment,
            kept,
            assigned: endowment - kept,
        }
    }

    /// The participant's payoff is what they kept.
    pub fn payoff(&self) -> f64 {
        self.kept
    }
}
