//! The authoritative draft state machine.
//!
//! [`transition`] is a pure reducer: it takes the current [`SessionState`] and a
//! [`DraftAction`] and returns the next state, or a [`TransitionError`] with the
//! input left untouched. Nothing else is allowed to construct a [`Selection`].

use crate::catalog::{Candidate, Catalog, Participant};
use crate::errors::TransitionError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Lifecycle of a draft session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DraftPhase {
    /// Waiting for the human to choose which participant they control.
    #[default]
    SelectingParticipant,
    Drafting,
    /// Terminal: every pick has been made.
    Complete,
}

impl fmt::Display for DraftPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SelectingParticipant => write!(f, "selecting-participant"),
            Self::Drafting => write!(f, "drafting"),
            Self::Complete => write!(f, "complete"),
        }
    }
}

/// Where a committed selection came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionSource {
    /// Made by the human participant.
    Human,
    /// Chosen by the external decision service.
    Service,
    /// Chosen by the deterministic fallback policy.
    Fallback,
}

impl fmt::Display for DecisionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Human => write!(f, "human"),
            Self::Service => write!(f, "LLM"),
            Self::Fallback => write!(f, "fallback"),
        }
    }
}

/// Acting participant for a 0-based pick index (round-robin, 1-based ids).
pub fn participant_for_pick(pick_index: u32, participant_count: u32) -> u32 {
    (pick_index % participant_count) + 1
}

/// Round for a 0-based pick index (1-based rounds).
pub fn round_for_pick(pick_index: u32, participant_count: u32) -> u32 {
    pick_index / participant_count + 1
}

/// One committed turn. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    /// Overall pick number, 1-based and contiguous.
    pub sequence: u32,
    pub round: u32,
    pub participant_id: u32,
    pub candidate: Candidate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
    pub source: DecisionSource,
    pub committed_at: DateTime<Utc>,
}

impl Selection {
    pub fn is_human(&self) -> bool {
        self.source == DecisionSource::Human
    }

    pub fn is_fallback(&self) -> bool {
        self.source == DecisionSource::Fallback
    }
}

/// What a caller asks the machine to commit. The machine validates it and
/// turns it into a [`Selection`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickProposal {
    pub sequence: u32,
    pub participant_id: u32,
    pub candidate_id: u32,
    pub rationale: Option<String>,
    pub source: DecisionSource,
}

/// Events accepted by [`transition`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftAction {
    ChooseParticipant { participant_id: u32 },
    CommitSelection(PickProposal),
    SetInProgress(bool),
    SetError(Option<String>),
    Reset,
}

/// The single mutable aggregate of a draft session.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub phase: DraftPhase,
    pub human_participant: Option<u32>,
    /// 0-based index of the next pick; equals the number of selections.
    pub cursor: u32,
    pub selections: Vec<Selection>,
    /// Remaining candidates, best rank first.
    pub pool: Vec<Candidate>,
    pub in_progress: bool,
    pub error: Option<String>,
    rounds: u32,
    total_picks: u32,
    catalog: Arc<Catalog>,
}

impl SessionState {
    /// Initial state for a fresh draft over `catalog`.
    ///
    /// The pick bound is `participants × rounds`, capped by the size of the board
    /// so the pool can never run dry while drafting.
    pub fn new(catalog: Arc<Catalog>, rounds: u32) -> Self {
        let scheduled = catalog.participant_count().saturating_mul(rounds);
        let total_picks = scheduled.min(catalog.candidates().len() as u32);
        Self {
            phase: DraftPhase::SelectingParticipant,
            human_participant: None,
            cursor: 0,
            selections: Vec::new(),
            pool: catalog.candidates().to_vec(),
            in_progress: false,
            error: None,
            rounds,
            total_picks,
            catalog,
        }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    pub fn total_picks(&self) -> u32 {
        self.total_picks
    }

    pub fn participant_count(&self) -> u32 {
        self.catalog.participant_count()
    }

    /// Participant on the clock, or `None` outside the drafting phase.
    pub fn acting_participant(&self) -> Option<&Participant> {
        if self.phase != DraftPhase::Drafting {
            return None;
        }
        let id = participant_for_pick(self.cursor, self.participant_count());
        self.catalog.participant(id)
    }

    pub fn current_round(&self) -> u32 {
        round_for_pick(self.cursor, self.participant_count())
    }

    pub fn is_human_turn(&self) -> bool {
        match (self.acting_participant(), self.human_participant) {
            (Some(acting), Some(human)) => acting.id == human,
            _ => false,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.phase == DraftPhase::Complete
    }

    /// Selections made by one participant, in pick order.
    pub fn selections_for(&self, participant_id: u32) -> impl Iterator<Item = &Selection> {
        self.selections
            .iter()
            .filter(move |s| s.participant_id == participant_id)
    }
}

/// Apply `action` to `state`, producing the next state.
///
/// Illegal transitions are rejected and `state` is left as it was.
pub fn transition(state: &SessionState, action: DraftAction) -> Result<SessionState, TransitionError> {
    match action {
        DraftAction::ChooseParticipant { participant_id } => {
            if state.phase != DraftPhase::SelectingParticipant {
                return Err(TransitionError::WrongPhase {
                    action: "choose a participant",
                    phase: state.phase,
                });
            }
            if state.catalog.participant(participant_id).is_none() {
                return Err(TransitionError::UnknownParticipant { id: participant_id });
            }
            let mut next = state.clone();
            next.human_participant = Some(participant_id);
            next.phase = if next.total_picks == 0 {
                DraftPhase::Complete
            } else {
                DraftPhase::Drafting
            };
            Ok(next)
        }
        DraftAction::CommitSelection(proposal) => commit(state, proposal),
        DraftAction::SetInProgress(in_progress) => {
            let mut next = state.clone();
            next.in_progress = in_progress;
            Ok(next)
        }
        DraftAction::SetError(error) => {
            let mut next = state.clone();
            next.error = error;
            Ok(next)
        }
        DraftAction::Reset => Ok(SessionState::new(state.catalog.clone(), state.rounds)),
    }
}

fn commit(state: &SessionState, proposal: PickProposal) -> Result<SessionState, TransitionError> {
    if state.phase != DraftPhase::Drafting {
        return Err(TransitionError::WrongPhase {
            action: "commit a selection",
            phase: state.phase,
        });
    }

    let expected = state.cursor + 1;
    if proposal.sequence != expected {
        return Err(TransitionError::OutOfSequence {
            expected,
            got: proposal.sequence,
        });
    }

    let acting = participant_for_pick(state.cursor, state.participant_count());
    if proposal.participant_id != acting {
        return Err(TransitionError::WrongParticipant {
            sequence: proposal.sequence,
            expected: acting,
            got: proposal.participant_id,
        });
    }

    let Some(pool_idx) = state.pool.iter().position(|c| c.id == proposal.candidate_id) else {
        return Err(TransitionError::CandidateUnavailable {
            id: proposal.candidate_id,
        });
    };

    let mut next = state.clone();
    let candidate = next.pool.remove(pool_idx);
    next.selections.push(Selection {
        sequence: proposal.sequence,
        round: round_for_pick(state.cursor, state.participant_count()),
        participant_id: proposal.participant_id,
        candidate,
        rationale: proposal.rationale,
        source: proposal.source,
        committed_at: Utc::now(),
    });
    next.cursor += 1;
    if next.cursor >= next.total_picks {
        next.phase = DraftPhase::Complete;
    }
    next.in_progress = false;
    next.error = None;
    Ok(next)
}
