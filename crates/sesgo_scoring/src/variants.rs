//! Input adapters for the in-house scoring variants.
//!
//! Both feed [`compute_dscore`]; they only differ in where the latencies
//! come from and how blocks are labeled.

use crate::dscore::{compute_dscore, Dscore, LatencySample, ScoringSpec};
use sesgo_core::config::ScoringConfig;
use sesgo_core::trial::TrialStore;

/// Score one administration straight from the trial store.
///
/// `base_round` is the first block of the administration (1 or 8 in the
/// standard plan). The practice combined blocks are base+2 and base+5,
/// the test combined blocks base+3 and base+6; practice pairs with
/// practice and test with test. Correctness comes from the stored trial,
/// unanswered trials contribute nothing.
pub fn dscore_for_administration(
    trials: &TrialStore,
    base_round: u32,
    cfg: &ScoringConfig,
) -> Dscore {
    let blocks = [base_round + 2, base_round + 3, base_round + 5, base_round + 6];
    let samples: Vec<LatencySample> = blocks
        .iter()
        .flat_map(|&block| {
            trials.round(block).filter_map(move |t| {
                let latency_secs = t.reaction_time?;
                let correct = t.is_correct?;
                Some(LatencySample {
                    block,
                    latency_secs,
                    correct,
                })
            })
        })
        .collect();

    let spec = ScoringSpec::new(vec![
        (base_round + 2, base_round + 5),
        (base_round + 3, base_round + 6),
    ]);
    compute_dscore(&samples, &spec, cfg)
}

/// Score from four pre-split latency lists, all trials taken as correct.
///
/// This is the ingestion path for data sets recorded without per-trial
/// correctness (the error penalty never fires). The result is unrounded.
pub fn dscore_from_latency_lists(
    compatible_practice: &[f64],
    compatible_test: &[f64],
    incompatible_practice: &[f64],
    incompatible_test: &[f64],
    cfg: &ScoringConfig,
) -> Dscore {
    let mut samples = Vec::with_capacity(
        compatible_practice.len()
            + compatible_test.len()
            + incompatible_practice.len()
            + incompatible_test.len(),
    );
    let lists: [(u32, &[f64]); 4] = [
        (0, compatible_practice),
        (1, compatible_test),
        (2, incompatible_practice),
        (3, incompatible_test),
    ];
    for (block, latencies) in lists {
        samples.extend(latencies.iter().map(|&latency_secs| LatencySample {
            block,
            latency_secs,
            correct: true,
        }));
    }

    let spec = ScoringSpec::new(vec![(0, 2), (1, 3)]);
    compute_dscore(&samples, &spec, cfg)
}
