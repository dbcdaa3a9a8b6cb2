//! The reveal-threshold truth table.

use sesgo_core::participant::PreferenceDeclaration;
use serde::{Deserialize, Serialize};

/// Reveal probability when the participant consented (or stated nothing).
pub const REVEAL_LIKELY: f64 = 0.80;
/// Reveal probability when the participant explicitly asked to conceal.
pub const REVEAL_UNLIKELY: f64 = 0.20;

/// Where the score landed relative to the declared acceptable range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RangeMembership {
    Below,
    Inside,
    Above,
    /// No declared range, or no score to locate in it.
    Undetermined,
}

impl RangeMembership {
    /// Bounds are inclusive: a score exactly on a bound counts as inside.
    pub fn locate(declaration: Option<&PreferenceDeclaration>, score: Option<f64>) -> Self {
        let (decl, score) = match (declaration, score) {
            (Some(d), Some(s)) => (d, s),
            _ => return RangeMembership::Undetermined,
        };
        if score < decl.lower {
            RangeMembership::Below
        } else if score > decl.upper {
            RangeMembership::Above
        } else {
            RangeMembership::Inside
        }
    }
}

/// Compute the reveal threshold for one decision.
///
/// Only the preference flag matching the side the score actually fell on
/// is consulted; a score below the range is never gated by the
/// above-range flag. An unset flag means no opinion and defaults to
/// reveal. Total over every input combination, always 0.80 or 0.20.
pub fn reveal_threshold(declaration: Option<&PreferenceDeclaration>, score: Option<f64>) -> f64 {
    let decl = match declaration {
        Some(d) => d,
        None => return REVEAL_LIKELY,
    };
    let flag = match RangeMembership::locate(Some(decl), score) {
        RangeMembership::Undetermined => None,
        RangeMembership::Below => decl.reveal_below,
        RangeMembership::Inside => decl.reveal_inside,
        RangeMembership::Above => decl.reveal_above,
    };
    match flag {
        Some(false) => REVEAL_UNLIKELY,
        Some(true) | None => REVEAL_LIKELY,
    }
}
