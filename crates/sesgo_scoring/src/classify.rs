//! Bucketing of a D-score into a named association strength.
//!
//! Pure lookup over the numeric score and the two category labels. An
//! absent score is its own category; it never collapses into Neutral.

use serde::{Deserialize, Serialize};

const NEUTRAL_BELOW: f64 = 0.15;
const MILD_BELOW: f64 = 0.35;
const MODERATE_BELOW: f64 = 0.65;

/// Magnitude bucket of a non-neutral score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strength {
    Mild,
    Moderate,
    Strong,
}

impl Strength {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strength::Mild => "Mild",
            Strength::Moderate => "Moderate",
            Strength::Strong => "Strong",
        }
    }
}

/// The two target category labels of an administration, in block order.
/// A positive score means `first` is the category associated with the
/// positive attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryPair {
    pub first: String,
    pub second: String,
}

impl CategoryPair {
    pub fn new(first: impl Into<String>, second: impl Into<String>) -> Self {
        Self {
            first: first.into(),
            second: second.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Classification {
    /// No score was produced for this administration.
    NoClassification,
    Neutral,
    Biased {
        strength: Strength,
        favored: String,
        disfavored: String,
    },
}

impl Classification {
    /// Short label for export rows and the participant-facing report.
    pub fn label(&self) -> &str {
        match self {
            Classification::NoClassification => "No classification",
            Classification::Neutral => "Neutral",
            Classification::Biased { strength, .. } => strength.as_str(),
        }
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Classification::NoClassification => write!(f, "No classification"),
            Classification::Neutral => write!(f, "Neutral"),
            Classification::Biased {
                strength,
                favored,
                disfavored,
            } => write!(f, "{}: {favored}+good, {disfavored}+bad", strength.as_str()),
        }
    }
}

/// Classify a (possibly absent) D-score against a category pair.
pub fn classify(dscore: Option<f64>, pair: &CategoryPair) -> Classification {
    let d = match dscore {
        Some(d) => d,
        None => return Classification::NoClassification,
    };
    let magnitude = d.abs();
    if magnitude < NEUTRAL_BELOW {
        return Classification::Neutral;
    }
    let strength = if magnitude <= MILD_BELOW {
        Strength::Mild
    } else if magnitude <= MODERATE_BELOW {
        Strength::Moderate
    } else {
        Strength::Strong
    };
    let (favored, disfavored) = if d > 0.0 {
        (pair.first.clone(), pair.second.clone())
    } else {
        (pair.second.clone(), pair.first.clone())
    };
    Classification::Biased {
        strength,
        favored,
        disfavored,
    }
}

/// Whether a participant's self-assessed strength label matches the
/// computed classification. Comparison is case-insensitive on the label.
pub fn guess_matches(guess: &str, classification: &Classification) -> bool {
    guess.trim().eq_ignore_ascii_case(classification.label())
}
