pub mod block;
pub mod config;
pub mod error;
pub mod participant;
pub mod stimuli;
pub mod trial;

pub use block::{BlockSchedule, BlockSetup, SidePairing};
pub use config::LabConfig;
pub use error::SessionError;
pub use participant::{
    AdministrationRecord, ParticipantState, PreferenceDeclaration, RoundOrder,
};
pub use stimuli::StimulusCatalog;
pub use trial::{Progress, Side, StimulusClass, Trial, TrialStore};
