//! CSV ingestion for externally recorded administrations.
//!
//! Two vendor layouts are supported: a four-block export where practice
//! and test combined blocks are separate, and a two-block export where
//! each condition is a single block. Header names and value encodings
//! vary between exports, so parsing is tolerant: rows that cannot be
//! understood are dropped, not fatal.

use crate::dscore::{compute_dscore, Dscore, LatencySample, ScoringSpec};
use sesgo_core::config::ScoringConfig;

/// Block numbering of a vendor export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorLayout {
    spec: ScoringSpec,
}

impl VendorLayout {
    /// Blocks 3/4 compatible, 6/7 incompatible (practice pairs with
    /// practice, test with test).
    pub fn four_block() -> Self {
        Self {
            spec: ScoringSpec::new(vec![(3, 6), (4, 7)]),
        }
    }

    /// Block 2 compatible, block 3 incompatible.
    pub fn two_block() -> Self {
        Self {
            spec: ScoringSpec::new(vec![(2, 3)]),
        }
    }

    pub fn spec(&self) -> &ScoringSpec {
        &self.spec
    }
}

/// Parse a vendor CSV into latency samples.
///
/// Column matching is case-insensitive. Latencies above 50 are taken as
/// milliseconds and converted; correctness accepts the common boolean
/// spellings, with an `error` column (inverted sense) as fallback.
/// Malformed rows are skipped.
pub fn parse_vendor_csv(data: &str) -> Vec<LatencySample> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(data.as_bytes());

    let headers: Vec<String> = match reader.headers() {
        Ok(h) => h.iter().map(|s| s.trim().to_ascii_lowercase()).collect(),
        Err(e) => {
            tracing::debug!("unreadable CSV header: {e}");
            return Vec::new();
        }
    };

    let find = |names: &[&str]| headers.iter().position(|h| names.contains(&h.as_str()));
    let block_col = find(&["block", "blocknum", "block_number"]);
    let latency_col = find(&["latency", "rt", "reaction_time", "latency_ms"]);
    let correct_col = find(&["correct", "correctness", "is_correct"]);
    let error_col = find(&["error", "err"]);

    let (block_col, latency_col) = match (block_col, latency_col) {
        (Some(b), Some(l)) => (b, l),
        _ => {
            tracing::debug!("CSV is missing a block or latency column");
            return Vec::new();
        }
    };

    let mut samples = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!("dropping row {line}: {e}");
                continue;
            }
        };
        let block: u32 = match record.get(block_col).and_then(|v| v.parse().ok()) {
            Some(b) => b,
            None => {
                tracing::debug!("dropping row {line}: bad block");
                continue;
            }
        };
        let raw_latency: f64 = match record.get(latency_col).and_then(|v| v.parse().ok()) {
            Some(l) => l,
            None => {
                tracing::debug!("dropping row {line}: bad latency");
                continue;
            }
        };
        // anything above 50 seconds cannot be a human latency in seconds
        let latency_secs = if raw_latency > 50.0 {
            raw_latency / 1000.0
        } else {
            raw_latency
        };

        let correct = match correct_col.and_then(|c| record.get(c)) {
            Some(v) => parse_bool(v).unwrap_or(false),
            None => match error_col.and_then(|c| record.get(c)) {
                // inverted sense: error=1 means incorrect
                Some(v) => !parse_bool(v).unwrap_or(true),
                None => true,
            },
        };

        samples.push(LatencySample {
            block,
            latency_secs,
            correct,
        });
    }
    samples
}

fn parse_bool(v: &str) -> Option<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "t" | "y" | "c" => Some(true),
        "0" | "false" | "no" | "f" | "n" | "e" => Some(false),
        _ => None,
    }
}

/// Parse and score a vendor CSV, rounded to four decimals as the vendor
/// tools report.
pub fn dscore_from_csv(data: &str, layout: &VendorLayout, cfg: &ScoringConfig) -> Dscore {
    let samples = parse_vendor_csv(data);
    compute_dscore(&samples, layout.spec(), cfg).rounded(4)
}
