//! Trial records and the per-participant trial store.
//!
//! A `Trial` is one categorization event: a stimulus shown on screen, an
//! expected side, and (once answered) the response with its latency. The
//! store is append-only; a trial is only ever mutated through the retry
//! path of the scheduler, which owns the store.

use serde::{Deserialize, Serialize};

/// Which response key the participant pressed (or should press).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

impl std::str::FromStr for Side {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" => Ok(Side::Left),
            "right" => Ok(Side::Right),
            _ => Err(()),
        }
    }
}

/// Category class of a stimulus: target categories are primary, attribute
/// categories are secondary. Pages style the two differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StimulusClass {
    Primary,
    Secondary,
}

/// A record of a single iteration.
///
/// Timestamps are seconds on the scheduler's monotonic clock, so that the
/// throttle comparisons and the stored values never disagree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trial {
    pub round: u32,
    /// 1-based, monotonically increasing per participant within a round.
    pub iteration: u32,
    pub timestamp: f64,

    pub stimulus_cls: StimulusClass,
    pub stimulus_cat: String,
    pub stimulus: String,
    pub correct: Side,

    pub response: Option<Side>,
    pub response_timestamp: Option<f64>,
    /// Client-reported reaction time in seconds; defined iff answered.
    pub reaction_time: Option<f64>,
    pub is_correct: Option<bool>,
    pub retries: u32,
    /// Bumped on every stored response. The retry rollback checks this to
    /// guarantee it undoes exactly one prior response.
    pub revision: u32,
}

impl Trial {
    pub fn answered(&self) -> bool {
        self.response.is_some()
    }
}

/// Derived progress snapshot for one round. Recomputed from the scheduler's
/// running counters, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub num_trials: u32,
    pub num_correct: u32,
    pub num_incorrect: u32,
    pub iteration: u32,
    pub total: u32,
}

/// Append-only collection of one participant's trials, across rounds.
///
/// Addressed only by the owning participant's session task; the score
/// engine reads it after the rounds end.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrialStore {
    trials: Vec<Trial>,
}

impl TrialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, trial: Trial) {
        self.trials.push(trial);
    }

    /// The current (latest-iteration) trial of a round, if one was generated.
    pub fn current(&self, round: u32, iteration: u32) -> Option<&Trial> {
        self.trials
            .iter()
            .find(|t| t.round == round && t.iteration == iteration)
    }

    pub fn current_mut(&mut self, round: u32, iteration: u32) -> Option<&mut Trial> {
        self.trials
            .iter_mut()
            .find(|t| t.round == round && t.iteration == iteration)
    }

    /// Remove the current trial of a round. Only the debug fast-forward
    /// path uses this; ordinary flow never deletes.
    pub fn remove_current(&mut self, round: u32, iteration: u32) -> Option<Trial> {
        let idx = self
            .trials
            .iter()
            .position(|t| t.round == round && t.iteration == iteration)?;
        Some(self.trials.remove(idx))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Trial> {
        self.trials.iter()
    }

    pub fn round(&self, round: u32) -> impl Iterator<Item = &Trial> {
        self.trials.iter().filter(move |t| t.round == round)
    }

    /// Reaction times of all answered trials in a round, in iteration order.
    pub fn reaction_times(&self, round: u32) -> Vec<f64> {
        self.round(round).filter_map(|t| t.reaction_time).collect()
    }

    pub fn len(&self) -> usize {
        self.trials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trial(round: u32, iteration: u32) -> Trial {
        Trial {
            round,
            iteration,
            timestamp: 0.0,
            stimulus_cls: StimulusClass::Primary,
            stimulus_cat: "flowers".into(),
            stimulus: "rose".into(),
            correct: Side::Left,
            response: None,
            response_timestamp: None,
            reaction_time: None,
            is_correct: None,
            retries: 0,
            revision: 0,
        }
    }

    #[test]
    fn test_current_finds_latest_iteration() {
        let mut store = TrialStore::new();
        store.append(trial(3, 1));
        store.append(trial(3, 2));
        assert!(store.current(3, 2).is_some());
        assert!(store.current(3, 3).is_none());
        assert!(store.current(4, 1).is_none());
    }

    #[test]
    fn test_reaction_times_skip_unanswered() {
        let mut store = TrialStore::new();
        let mut t1 = trial(3, 1);
        t1.reaction_time = Some(0.8);
        store.append(t1);
        store.append(trial(3, 2));
        assert_eq!(store.reaction_times(3), vec![0.8]);
    }

    #[test]
    fn test_side_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Side::Left).unwrap(), "\"left\"");
        let s: Side = serde_json::from_str("\"right\"").unwrap();
        assert_eq!(s, Side::Right);
    }

    #[test]
    fn test_remove_current() {
        let mut store = TrialStore::new();
        store.append(trial(5, 1));
        assert!(store.remove_current(5, 1).is_some());
        assert!(store.current(5, 1).is_none());
    }
}
