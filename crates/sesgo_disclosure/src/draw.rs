//! Deterministic per-decision sampling.
//!
//! The seed is derived by hashing stable identifiers rather than taken
//! from ambient randomness, so repeated renders of the same decision page
//! always see the same draw.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Stable identity of one disclosure decision.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DecisionKey {
    pub participant: String,
    pub round: u32,
    /// Position of the decision within the round (0-based).
    pub position: u32,
}

impl DecisionKey {
    pub fn new(participant: impl Into<String>, round: u32, position: u32) -> Self {
        Self {
            participant: participant.into(),
            round,
            position,
        }
    }

    fn seed(&self) -> u64 {
        let mut hasher = Sha256::new();
        hasher.update(self.participant.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.round.to_le_bytes());
        hasher.update(self.position.to_le_bytes());
        let digest = hasher.finalize();
        u64::from_le_bytes(digest[..8].try_into().unwrap_or_default())
    }
}

/// One uniform draw in [0, 1) for the given decision.
pub fn decision_draw(key: &DecisionKey) -> f64 {
    let mut rng = StdRng::seed_from_u64(key.seed());
    rng.gen::<f64>()
}
