//! Typed error hierarchy for the draft engine.
//!
//! Four enums cover the four failure channels:
//! - `TransitionError`: illegal state-machine transitions (internal consistency)
//! - `DraftError`: orchestration preconditions (phase, turn, single-flight)
//! - `ServiceError`: one failed call to the external decision service
//! - `DecisionError`: request validation and response parsing around those calls

use crate::draft::DraftPhase;
use thiserror::Error;

/// A transition the state machine refused. State is never mutated when one of
/// these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Cannot {action} while the draft is {phase}")]
    WrongPhase {
        action: &'static str,
        phase: DraftPhase,
    },

    #[error("Out-of-sequence selection: expected pick #{expected}, got #{got}")]
    OutOfSequence { expected: u32, got: u32 },

    #[error("Pick #{sequence} belongs to participant {expected}, not {got}")]
    WrongParticipant {
        sequence: u32,
        expected: u32,
        got: u32,
    },

    #[error("Participant {id} is not in the catalog")]
    UnknownParticipant { id: u32 },

    #[error("Candidate {id} is not in the remaining pool")]
    CandidateUnavailable { id: u32 },
}

/// Errors from the pick orchestrators and the session facade.
#[derive(Debug, Error)]
pub enum DraftError {
    #[error("Draft is not in progress (phase: {phase})")]
    NotDrafting { phase: DraftPhase },

    #[error("It is the human participant's turn (participant {participant})")]
    HumanTurn { participant: u32 },

    #[error("It is not the human participant's turn")]
    NotHumanTurn,

    #[error("Another pick is already in flight")]
    Busy,

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error(transparent)]
    Decision(#[from] DecisionError),
}

/// A single failed request to the decision service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("Decision service request failed: {0}")]
    Transport(String),

    #[error("Decision service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Decision service timed out")]
    Timeout,

    #[error("Empty response from decision service")]
    EmptyBody,

    #[error("API key not set (expected environment variable {var})")]
    MissingApiKey { var: String },

    #[error("Decision service disabled (offline mode)")]
    Offline,
}

/// Errors around one decision: validation before the call and parsing after it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecisionError {
    #[error("Invalid decision request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("Malformed decision response: {0}")]
    Malformed(String),

    #[error("Decision service chose candidate {id}, which is not in the pool")]
    UnknownCandidate { id: i64 },
}
