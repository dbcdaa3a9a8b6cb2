//! Per-participant state record.
//!
//! Everything that previously lived in ad-hoc session dictionaries is a
//! named field here: declared preference ranges, computed scores, and the
//! trial store. One record per participant, owned by that participant's
//! session task and passed by handle through the pipeline.

use crate::trial::TrialStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Counterbalancing of the two administrations: half the participants run
/// rounds 1-14 in order, half start with the second IAT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundOrder {
    Direct,
    Rotated,
}

impl RoundOrder {
    /// Map a displayed round number to the block round actually played.
    /// Rounds past the IAT phase (15+) are untouched.
    pub fn actual_round(&self, displayed: u32) -> u32 {
        if !(1..=14).contains(&displayed) {
            return displayed;
        }
        match self {
            RoundOrder::Direct => displayed,
            RoundOrder::Rotated => {
                if displayed <= 7 {
                    displayed + 7
                } else {
                    displayed - 7
                }
            }
        }
    }
}

/// The participant's stated moral-acceptability range and reveal
/// preferences for one IAT administration. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferenceDeclaration {
    pub lower: f64,
    pub upper: f64,
    /// Reveal preference when the score falls below the range.
    /// `None` means no opinion, treated as consent downstream.
    pub reveal_below: Option<bool>,
    pub reveal_inside: Option<bool>,
    pub reveal_above: Option<bool>,
}

impl PreferenceDeclaration {
    /// Requires `lower < upper`.
    pub fn new(lower: f64, upper: f64) -> Result<Self, InvalidRange> {
        if !(lower < upper) {
            return Err(InvalidRange { lower, upper });
        }
        Ok(Self {
            lower,
            upper,
            reveal_below: None,
            reveal_inside: None,
            reveal_above: None,
        })
    }

    pub fn with_flags(
        mut self,
        below: Option<bool>,
        inside: Option<bool>,
        above: Option<bool>,
    ) -> Self {
        self.reveal_below = below;
        self.reveal_inside = inside;
        self.reveal_above = above;
        self
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("lower bound {lower} must be strictly below upper bound {upper}")]
pub struct InvalidRange {
    pub lower: f64,
    pub upper: f64,
}

/// Everything derived from one completed IAT administration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdministrationRecord {
    pub declaration: Option<PreferenceDeclaration>,
    /// Absence is a first-class outcome; `exclusion` says why.
    pub dscore: Option<f64>,
    pub exclusion: Option<String>,
    /// The participant's guess of their own result, verbatim.
    pub self_assessment: Option<String>,
    pub guess_correct: Option<bool>,
}

/// Per-round running counters maintained by the scheduler.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RoundCounters {
    pub iteration: u32,
    pub num_trials: u32,
    pub num_correct: u32,
    pub num_incorrect: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantState {
    pub code: String,
    pub round_order: RoundOrder,
    pub trials: TrialStore,
    pub counters: BTreeMap<u32, RoundCounters>,
    /// Keyed by administration index (1-based).
    pub administrations: BTreeMap<u8, AdministrationRecord>,
}

impl ParticipantState {
    pub fn new(code: impl Into<String>, round_order: RoundOrder) -> Self {
        Self {
            code: code.into(),
            round_order,
            trials: TrialStore::new(),
            counters: BTreeMap::new(),
            administrations: BTreeMap::new(),
        }
    }

    pub fn counters_mut(&mut self, round: u32) -> &mut RoundCounters {
        self.counters.entry(round).or_default()
    }

    pub fn counters(&self, round: u32) -> RoundCounters {
        self.counters.get(&round).copied().unwrap_or_default()
    }

    pub fn administration_mut(&mut self, index: u8) -> &mut AdministrationRecord {
        self.administrations.entry(index).or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_order_is_identity() {
        for r in 1..=14 {
            assert_eq!(RoundOrder::Direct.actual_round(r), r);
        }
    }

    #[test]
    fn test_rotated_order_swaps_halves() {
        assert_eq!(RoundOrder::Rotated.actual_round(1), 8);
        assert_eq!(RoundOrder::Rotated.actual_round(7), 14);
        assert_eq!(RoundOrder::Rotated.actual_round(8), 1);
        assert_eq!(RoundOrder::Rotated.actual_round(14), 7);
        // decision rounds are unaffected
        assert_eq!(RoundOrder::Rotated.actual_round(15), 15);
    }

    #[test]
    fn test_declaration_rejects_inverted_range() {
        assert!(PreferenceDeclaration::new(0.5, -0.5).is_err());
        assert!(PreferenceDeclaration::new(0.2, 0.2).is_err());
        assert!(PreferenceDeclaration::new(-0.5, 0.5).is_ok());
    }

    #[test]
    fn test_counters_default_to_zero() {
        let state = ParticipantState::new("p1", RoundOrder::Direct);
        let counters = state.counters(3);
        assert_eq!(counters.num_trials, 0);
        assert_eq!(counters.iteration, 0);
    }
}
