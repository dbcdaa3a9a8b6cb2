//! Flat trial export for offline analysis.
//!
//! One row per trial, wide enough to recompute any score downstream
//! without access to the live stores.

use sesgo_core::participant::ParticipantState;
use sesgo_core::trial::Trial;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Clone, Serialize)]
pub struct TrialRow {
    pub participant: String,
    pub round: u32,
    pub iteration: u32,
    pub timestamp: f64,
    pub stimulus_class: String,
    pub stimulus_category: String,
    pub stimulus: String,
    pub correct_side: String,
    pub response: Option<String>,
    pub reaction_time: Option<f64>,
    pub is_correct: Option<bool>,
    pub retries: u32,
}

impl TrialRow {
    fn from_trial(participant: &str, trial: &Trial) -> Self {
        Self {
            participant: participant.to_string(),
            round: trial.round,
            iteration: trial.iteration,
            timestamp: trial.timestamp,
            stimulus_class: format!("{:?}", trial.stimulus_cls).to_lowercase(),
            stimulus_category: trial.stimulus_cat.clone(),
            stimulus: trial.stimulus.clone(),
            correct_side: trial.correct.as_str().to_string(),
            response: trial.response.map(|s| s.as_str().to_string()),
            reaction_time: trial.reaction_time,
            is_correct: trial.is_correct,
            retries: trial.retries,
        }
    }
}

/// All of one participant's trials as export rows, in store order.
pub fn trial_rows(participant: &ParticipantState) -> Vec<TrialRow> {
    participant
        .trials
        .iter()
        .map(|t| TrialRow::from_trial(&participant.code, t))
        .collect()
}

/// Write one participant's trials as CSV, header included.
pub fn write_trials_csv<W: Write>(writer: W, participant: &ParticipantState) -> csv::Result<()> {
    let mut out = csv::Writer::from_writer(writer);
    for row in trial_rows(participant) {
        out.serialize(row)?;
    }
    out.flush()?;
    Ok(())
}
