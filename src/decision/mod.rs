//! External decision client: asks an LLM which candidate a participant takes,
//! with bounded retries and a deterministic fallback.
//!
//! The network sits behind the [`DecisionService`] trait so the retry/fallback
//! logic can be driven by mocks in tests and by [`OfflineService`] when no
//! service is configured.

pub mod client;
pub mod prompt;
pub mod retry;
pub mod service;

pub use client::DecisionClient;
pub use retry::{Attempted, RetryPolicy};
pub use service::{ChatCompletionsService, ChatPrompt, DecisionService, OfflineService, Sampling};

use crate::catalog::{Candidate, Position};
use crate::draft::{DecisionSource, SessionState, remaining_needs};
use crate::errors::DecisionError;

/// Rationale used when the service answers with a valid id but no explanation.
pub const DEFAULT_RATIONALE: &str = "Selected based on team needs and talent.";

/// Number of most recent selections passed along as context.
pub const DEFAULT_HISTORY_WINDOW: usize = 7;

/// One prior selection as shown to the decision service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub participant_name: String,
    pub candidate_name: String,
    pub position: Position,
}

/// Everything the decision service needs to choose for one participant.
#[derive(Debug, Clone)]
pub struct DecisionRequest {
    pub participant_name: String,
    /// Full requirement list, priority order.
    pub needs: Vec<Position>,
    /// Requirements not yet covered by the participant's own picks.
    pub unmet_needs: Vec<Position>,
    pub context: String,
    /// Remaining candidates, best rank first.
    pub pool: Vec<Candidate>,
    pub round: u32,
    /// 1-based overall pick number.
    pub pick_number: u32,
    pub recent_picks: Vec<HistoryEntry>,
}

impl DecisionRequest {
    /// Build the request for whoever is on the clock in `state`.
    ///
    /// Returns `None` when no participant is acting (not drafting).
    pub fn for_current_pick(state: &SessionState, history_window: usize) -> Option<Self> {
        let acting = state.acting_participant()?;
        let catalog = state.catalog();

        let skip = state.selections.len().saturating_sub(history_window);
        let recent_picks = state.selections[skip..]
            .iter()
            .map(|s| HistoryEntry {
                participant_name: catalog
                    .participant(s.participant_id)
                    .map(|p| p.name.clone())
                    .unwrap_or_else(|| format!("Team {}", s.participant_id)),
                candidate_name: s.candidate.name.clone(),
                position: s.candidate.position,
            })
            .collect();

        Some(Self {
            participant_name: acting.name.clone(),
            needs: acting.needs.clone(),
            unmet_needs: remaining_needs(acting, &state.selections),
            context: acting.context.clone(),
            pool: state.pool.clone(),
            round: state.current_round(),
            pick_number: state.cursor + 1,
            recent_picks,
        })
    }

    /// Reject requests no attempt could ever satisfy.
    pub fn validate(&self) -> Result<(), DecisionError> {
        if self.participant_name.trim().is_empty() {
            return Err(DecisionError::InvalidRequest(
                "missing participant name".into(),
            ));
        }
        if self.pool.is_empty() {
            return Err(DecisionError::InvalidRequest(
                "no candidates remain in the pool".into(),
            ));
        }
        Ok(())
    }
}

/// The candidate chosen for one turn and where the choice came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub candidate_id: u32,
    pub rationale: String,
    pub source: DecisionSource,
    /// Service calls made; zero when the client fell back without calling.
    pub attempts: u32,
}

impl Decision {
    pub fn is_fallback(&self) -> bool {
        self.source == DecisionSource::Fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::draft::{DraftAction, PickProposal, participant_for_pick, transition};
    use std::sync::Arc;

    fn drafting() -> SessionState {
        let state = SessionState::new(Arc::new(Catalog::builtin()), 4);
        transition(&state, DraftAction::ChooseParticipant { participant_id: 3 }).unwrap()
    }

    fn commit_best(state: &SessionState) -> SessionState {
        let proposal = PickProposal {
            sequence: state.cursor + 1,
            participant_id: participant_for_pick(state.cursor, state.participant_count()),
            candidate_id: state.pool[0].id,
            rationale: None,
            source: DecisionSource::Fallback,
        };
        transition(state, DraftAction::CommitSelection(proposal)).unwrap()
    }

    #[test]
    fn test_request_for_first_pick() {
        let state = drafting();
        let request = DecisionRequest::for_current_pick(&state, 7).unwrap();
        assert_eq!(request.participant_name, "Las Vegas Raiders");
        assert_eq!(request.round, 1);
        assert_eq!(request.pick_number, 1);
        assert_eq!(request.pool.len(), 30);
        assert_eq!(request.needs, request.unmet_needs);
        assert!(request.recent_picks.is_empty());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_history_window_keeps_most_recent() {
        let mut state = drafting();
        for _ in 0..9 {
            state = commit_best(&state);
        }
        let request = DecisionRequest::for_current_pick(&state, 7).unwrap();
        assert_eq!(request.recent_picks.len(), 7);
        assert_eq!(request.recent_picks[0].candidate_name, state.selections[2].candidate.name);
        assert_eq!(request.recent_picks[6].candidate_name, state.selections[8].candidate.name);
        assert_eq!(request.round, 2);
        assert_eq!(request.pick_number, 10);
    }

    #[test]
    fn test_no_request_outside_drafting() {
        let state = SessionState::new(Arc::new(Catalog::builtin()), 4);
        assert!(DecisionRequest::for_current_pick(&state, 7).is_none());
    }

    #[test]
    fn test_validate_rejects_empty_pool() {
        let mut request = DecisionRequest::for_current_pick(&drafting(), 7).unwrap();
        request.pool.clear();
        assert!(matches!(
            request.validate(),
            Err(DecisionError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_validate_rejects_blank_name() {
        let mut request = DecisionRequest::for_current_pick(&drafting(), 7).unwrap();
        request.participant_name = "  ".into();
        assert!(request.validate().is_err());
    }
}
