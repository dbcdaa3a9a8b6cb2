//! Persisted disclosure outcomes.
//!
//! The realized reveal/conceal decision and the exact label shown are
//! stored the first time a decision is made, before the monetary page is
//! rendered. Every later lookup is a pure read of the stored record; the
//! draw is never re-sampled on redisplay.

use crate::draw::{decision_draw, DecisionKey};
use crate::mechanism::reveal_threshold;
use sesgo_core::participant::PreferenceDeclaration;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Label shown when the category is concealed.
pub const CONCEALED_LABEL: &str = "member of the group";

/// One realized disclosure decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisclosureOutcome {
    pub revealed: bool,
    pub threshold: f64,
    pub draw: f64,
    /// Exactly what the participant was shown.
    pub label: String,
}

/// Outcome records keyed per decision.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutcomeStore {
    outcomes: BTreeMap<DecisionKey, DisclosureOutcome>,
}

impl OutcomeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide (or recall) the disclosure outcome for one decision.
    ///
    /// The first call computes the threshold, draws, and persists the
    /// outcome; subsequent calls return the stored record unchanged.
    pub fn decide(
        &mut self,
        key: DecisionKey,
        declaration: Option<&PreferenceDeclaration>,
        score: Option<f64>,
        category_label: &str,
    ) -> &DisclosureOutcome {
        self.outcomes.entry(key).or_insert_with_key(|key| {
            let threshold = reveal_threshold(declaration, score);
            let draw = decision_draw(key);
            let revealed = draw < threshold;
            let label = if revealed {
                category_label.to_string()
            } else {
                CONCEALED_LABEL.to_string()
            };
            tracing::debug!(
                participant = %key.participant,
                round = key.round,
                position = key.position,
                threshold,
                revealed,
                "disclosure decided"
            );
            DisclosureOutcome {
                revealed,
                threshold,
                draw,
                label,
            }
        })
    }

    pub fn get(&self, key: &DecisionKey) -> Option<&DisclosureOutcome> {
        self.outcomes.get(key)
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}
