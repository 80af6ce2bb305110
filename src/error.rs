use thiserror::Error;

use crate::session::Ticket;

/// Reasons the session state machine refuses an operation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("need at least {required} keystroke intervals, captured {captured}")]
    InsufficientData { captured: usize, required: usize },

    #[error("an analysis request is already in flight")]
    InFlight,

    #[error("session already analyzed; clear it to start again")]
    AlreadyAnalyzed,

    #[error("no analysis request is in flight")]
    NotLocked,

    #[error("completion for superseded submission #{0}")]
    Stale(Ticket),
}

/// Failures of a single analysis round trip
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed analysis response: {0}")]
    Protocol(#[from] serde_json::Error),
}
