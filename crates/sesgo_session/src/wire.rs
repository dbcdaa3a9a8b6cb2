//! The trial message protocol.
//!
//! Small serde-tagged JSON maps, one request in, one response out. The
//! shapes mirror what the task page's script expects.

use sesgo_core::stimuli;
use sesgo_core::{Progress, SessionError, StimulusClass, Trial};
use serde::{Deserialize, Serialize};

/// Inbound message from the participant's page.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientMessage {
    /// Page (re)loaded; report progress and any pending trial. No mutation.
    Load,
    /// Request the next trial.
    Next,
    /// Submit (or retry) an answer for the current trial.
    Answer {
        #[serde(default)]
        answer: Option<String>,
        /// Client-reported reaction time in seconds.
        #[serde(default)]
        reaction_time: Option<f64>,
    },
    /// Debug-only fast-forward; `reaction` is the mean synthetic latency.
    Cheat {
        #[serde(default)]
        reaction: f64,
    },
}

/// Encoded trial as shown to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialView {
    pub cls: StimulusClass,
    pub cat: String,
    pub stimulus: String,
}

impl TrialView {
    pub fn encode(trial: &Trial) -> Self {
        Self {
            cls: trial.stimulus_cls,
            cat: trial.stimulus_cat.clone(),
            stimulus: stimuli::resolve(&trial.stimulus),
        }
    }
}

/// Outbound response. Exactly one per inbound message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerMessage {
    Status {
        progress: Progress,
        #[serde(skip_serializing_if = "Option::is_none")]
        trial: Option<TrialView>,
        #[serde(skip_serializing_if = "Option::is_none")]
        iterations_left: Option<u32>,
    },
    Trial {
        trial: TrialView,
        progress: Progress,
    },
    Feedback {
        is_correct: bool,
        progress: Progress,
    },
    Error {
        kind: String,
        message: String,
    },
}

impl ServerMessage {
    pub fn error(err: SessionError) -> Self {
        ServerMessage::Error {
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}
