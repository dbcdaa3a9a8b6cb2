//! The disclosure mechanism for payoff-relevant decisions.
//!
//! Decides whether the participant is told the explicit group label of
//! the person their decision affects. The 80/20 asymmetry makes honest
//! preference reporting weakly dominant: asking for concealment yields
//! concealment 80% of the time rather than 20%. Draws are deterministic
//! per decision so a page re-render never re-rolls an outcome.

pub mod draw;
pub mod mechanism;
pub mod outcome;
pub mod payoff;

pub use draw::{decision_draw, DecisionKey};
pub use mechanism::{reveal_threshold, RangeMembership, REVEAL_LIKELY, REVEAL_UNLIKELY};
pub use outcome::{DisclosureOutcome, OutcomeStore, CONCEALED_LABEL};
pub use payoff::SplitDecision;
