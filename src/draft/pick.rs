//! Drives one revealed non-human pick.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::session::{DraftNotice, DraftSession, FlightKind};
use super::state::{PickProposal, Selection};
use super::{Pacing, pause};
use crate::decision::{DecisionClient, DecisionRequest};
use crate::errors::DraftError;

#[derive(Debug, Clone, PartialEq)]
pub enum PickOutcome {
    Committed(Selection),
    /// Cancelled before the commit; the cursor did not move.
    Cancelled,
}

pub struct PickOrchestrator {
    session: Arc<DraftSession>,
    client: DecisionClient,
    pacing: Pacing,
    history_window: usize,
}

impl PickOrchestrator {
    pub fn new(
        session: Arc<DraftSession>,
        client: DecisionClient,
        pacing: Pacing,
        history_window: usize,
    ) -> Self {
        Self {
            session,
            client,
            pacing,
            history_window,
        }
    }

    /// Decide, reveal and commit the pick for the participant on the clock.
    ///
    /// Fails fast with [`DraftError::Busy`] if another orchestration holds the
    /// session, or when it is not a non-human turn. Cancelling `cancel` at any
    /// point before the commit yields [`PickOutcome::Cancelled`].
    pub async fn run(&self, cancel: &CancellationToken) -> Result<PickOutcome, DraftError> {
        let flight = self.session.begin_flight(cancel, FlightKind::Single)?;
        let token = flight.token().clone();
        let sequence = self.session.snapshot().cursor + 1;

        if !pause(&token, self.pacing.pre_pick).await {
            return Ok(self.cancelled(sequence));
        }

        let state = self.session.snapshot();
        let request = DecisionRequest::for_current_pick(&state, self.history_window)
            .ok_or(DraftError::NotDrafting { phase: state.phase })?;
        let participant_id = state
            .acting_participant()
            .map(|p| p.id)
            .ok_or(DraftError::NotDrafting { phase: state.phase })?;

        self.session.notify(DraftNotice::Deciding {
            sequence,
            participant_id,
        });

        let decision = tokio::select! {
            biased;
            _ = token.cancelled() => return Ok(self.cancelled(sequence)),
            decision = self.client.decide(&request) => match decision {
                Ok(decision) => decision,
                Err(err) => {
                    self.session.set_error(Some(err.to_string()));
                    return Err(err.into());
                }
            },
        };

        if let Some(candidate) = request.pool.iter().find(|c| c.id == decision.candidate_id) {
            self.session.notify(DraftNotice::Revealing {
                sequence,
                participant_id,
                candidate: candidate.clone(),
                rationale: decision.rationale.clone(),
                source: decision.source,
            });
        }

        if !pause(&token, self.pacing.reveal).await {
            return Ok(self.cancelled(sequence));
        }

        let proposal = PickProposal {
            sequence,
            participant_id,
            candidate_id: decision.candidate_id,
            rationale: Some(decision.rationale),
            source: decision.source,
        };
        match flight.commit(proposal)? {
            Some(selection) => Ok(PickOutcome::Committed(selection)),
            None => Ok(self.cancelled(sequence)),
        }
    }

    fn cancelled(&self, sequence: u32) -> PickOutcome {
        tracing::debug!(sequence, "pick cancelled before commit");
        self.session.notify(DraftNotice::Cancelled { sequence });
        PickOutcome::Cancelled
    }
}
