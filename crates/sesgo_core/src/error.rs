//! Error taxonomy for the live trial channel.
//!
//! Every variant maps to a structured `error` response on the wire; the
//! channel itself never crashes on bad input.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum SessionError {
    /// A message arrived that the state machine cannot accept right now.
    #[error("must resolve the current trial before continuing")]
    InvalidState,

    /// A timing gate was not yet satisfied.
    #[error("{0}")]
    RateLimited(&'static str),

    #[error("no active trial to answer")]
    NoActiveTrial,

    #[error("invalid answer: {0}")]
    InvalidInput(&'static str),

    #[error("unrecognized message from client")]
    UnrecognizedMessage,

    /// Catch-all: anything unexpected degrades to this instead of
    /// tearing down the connection.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SessionError {
    /// Machine-readable discriminant for wire responses.
    pub fn kind(&self) -> &'static str {
        match self {
            SessionError::InvalidState => "invalid_state",
            SessionError::RateLimited(_) => "rate_limited",
            SessionError::NoActiveTrial => "no_active_trial",
            SessionError::InvalidInput(_) => "invalid_input",
            SessionError::UnrecognizedMessage => "unrecognized_message",
            SessionError::Internal(_) => "internal",
        }
    }
}
