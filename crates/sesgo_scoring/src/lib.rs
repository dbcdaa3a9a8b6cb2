//! D-score computation for one IAT administration.
//!
//! One parameterized algorithm ([`compute_dscore`]) serves every variant;
//! the in-house trial-store extraction and the vendor CSV dialects are
//! thin input adapters over it. Absence of a score is an expected outcome
//! carried with a machine-readable reason, never an error.

pub mod classify;
pub mod dscore;
pub mod export;
pub mod variants;
pub mod vendor;

pub use classify::{classify, guess_matches, CategoryPair, Classification, Strength};
pub use export::{trial_rows, write_trials_csv, TrialRow};
pub use dscore::{
    compute_dscore, BlockPair, Dscore, Exclusion, LatencySample, ScoringSpec,
};
pub use variants::{dscore_for_administration, dscore_from_latency_lists};
pub use vendor::{dscore_from_csv, parse_vendor_csv, VendorLayout};
