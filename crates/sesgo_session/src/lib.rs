//! The real-time trial scheduler.
//!
//! One `SessionScheduler` drives one participant through one round of
//! timed categorization trials: it accepts one inbound message at a time,
//! produces exactly one response, and maintains the trial store plus the
//! running correct/incorrect counters.

pub mod cheat;
pub mod clock;
pub mod scheduler;
pub mod wire;

pub use cheat::CheatSampler;
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use scheduler::SessionScheduler;
pub use wire::{ClientMessage, ServerMessage, TrialView};
