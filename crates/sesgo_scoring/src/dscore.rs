//! The unified Greenwald-style D-score algorithm.
//!
//! Pipeline, in order:
//! 1. fast-guess screen over the whole supplied set (before any trimming
//!    or block partitioning, in every variant),
//! 2. outlier trim,
//! 3. error penalty,
//! 4. per-pair standardized mean difference,
//! 5. arithmetic mean over the pairs that produced a value.

use sesgo_core::config::ScoringConfig;
use serde::{Deserialize, Serialize};

/// One trial's contribution to scoring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatencySample {
    pub block: u32,
    pub latency_secs: f64,
    pub correct: bool,
}

/// A compatible/incompatible sub-block pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockPair {
    pub compatible: u32,
    pub incompatible: u32,
}

/// Which sub-blocks pair up for one administration. The thresholds are
/// deliberately not here: they are shared across all variants so scores
/// stay comparable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringSpec {
    pub pairs: Vec<BlockPair>,
}

impl ScoringSpec {
    pub fn new(pairs: Vec<(u32, u32)>) -> Self {
        Self {
            pairs: pairs
                .into_iter()
                .map(|(compatible, incompatible)| BlockPair {
                    compatible,
                    incompatible,
                })
                .collect(),
        }
    }
}

/// Why an administration produced no score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Exclusion {
    NoData,
    TooManyFastGuesses { proportion: f64 },
    InsufficientTrials { block: u32 },
    ZeroVariance,
}

impl std::fmt::Display for Exclusion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Exclusion::NoData => write!(f, "excluded: no usable trials"),
            Exclusion::TooManyFastGuesses { proportion } => {
                write!(f, "excluded: too many fast trials ({:.0}%)", proportion * 100.0)
            }
            Exclusion::InsufficientTrials { block } => {
                write!(f, "excluded: insufficient trials in block {block}")
            }
            Exclusion::ZeroVariance => write!(f, "excluded: zero variance (pooled SD is 0)"),
        }
    }
}

/// The outcome of scoring one administration. Absence of a value is a
/// first-class outcome, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Dscore {
    Value(f64),
    Excluded(Exclusion),
}

impl Dscore {
    pub fn value(&self) -> Option<f64> {
        match self {
            Dscore::Value(v) => Some(*v),
            Dscore::Excluded(_) => None,
        }
    }

    pub fn exclusion(&self) -> Option<Exclusion> {
        match self {
            Dscore::Value(_) => None,
            Dscore::Excluded(e) => Some(*e),
        }
    }

    /// Human/export reason string for an absent score.
    pub fn reason(&self) -> Option<String> {
        self.exclusion().map(|e| e.to_string())
    }

    /// Round the value to `decimals` places (vendor variants use 4).
    pub fn rounded(self, decimals: u32) -> Self {
        match self {
            Dscore::Value(v) => {
                let factor = 10f64.powi(decimals as i32);
                Dscore::Value((v * factor).round() / factor)
            }
            excluded => excluded,
        }
    }
}

/// Compute the D-score for one administration.
///
/// The fast-guess proportion is measured over the entire supplied sample
/// set before the outlier trim and before block partitioning; every
/// variant goes through this same point.
pub fn compute_dscore(
    samples: &[LatencySample],
    spec: &ScoringSpec,
    cfg: &ScoringConfig,
) -> Dscore {
    if samples.is_empty() {
        return Dscore::Excluded(Exclusion::NoData);
    }

    let fast = samples
        .iter()
        .filter(|s| s.latency_secs < cfg.fast_guess_secs)
        .count();
    let proportion = fast as f64 / samples.len() as f64;
    if proportion > cfg.fast_guess_max_proportion {
        return Dscore::Excluded(Exclusion::TooManyFastGuesses { proportion });
    }

    // Trim outliers, then penalize errors. Errors inflate apparent bias
    // instead of being discarded.
    let usable: Vec<(u32, f64)> = samples
        .iter()
        .filter(|s| {
            s.latency_secs >= cfg.fast_guess_secs && s.latency_secs <= cfg.max_latency_secs
        })
        .map(|s| {
            let penalty = if s.correct { 0.0 } else { cfg.error_penalty_secs };
            (s.block, s.latency_secs + penalty)
        })
        .collect();

    let mut pair_values = Vec::with_capacity(spec.pairs.len());
    let mut first_failure = None;
    for pair in &spec.pairs {
        match score_pair(&usable, pair) {
            Ok(value) => pair_values.push(value),
            Err(failure) => {
                first_failure.get_or_insert(failure);
            }
        }
    }

    if pair_values.is_empty() {
        return Dscore::Excluded(first_failure.unwrap_or(Exclusion::NoData));
    }
    Dscore::Value(mean(&pair_values))
}

fn score_pair(usable: &[(u32, f64)], pair: &BlockPair) -> Result<f64, Exclusion> {
    let compatible: Vec<f64> = latencies_for(usable, pair.compatible);
    let incompatible: Vec<f64> = latencies_for(usable, pair.incompatible);

    if compatible.len() < 2 {
        return Err(Exclusion::InsufficientTrials {
            block: pair.compatible,
        });
    }
    if incompatible.len() < 2 {
        return Err(Exclusion::InsufficientTrials {
            block: pair.incompatible,
        });
    }

    let pooled: Vec<f64> = compatible
        .iter()
        .chain(incompatible.iter())
        .copied()
        .collect();
    // A constant pool has zero variance even when rounding noise in the
    // mean keeps the computed stdev a hair above it.
    if pooled.iter().all(|v| *v == pooled[0]) {
        return Err(Exclusion::ZeroVariance);
    }
    let sd = sample_stdev(&pooled);
    if sd == 0.0 {
        return Err(Exclusion::ZeroVariance);
    }

    Ok((mean(&incompatible) - mean(&compatible)) / sd)
}

fn latencies_for(usable: &[(u32, f64)], block: u32) -> Vec<f64> {
    usable
        .iter()
        .filter(|(b, _)| *b == block)
        .map(|(_, l)| *l)
        .collect()
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n-1 denominator). Callers guarantee n >= 2.
fn sample_stdev(values: &[f64]) -> f64 {
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}
