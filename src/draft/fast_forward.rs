//! Runs consecutive non-human picks without reveal pacing.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::session::{DraftNotice, DraftSession, FlightKind};
use super::state::{DraftPhase, PickProposal, Selection};
use super::{Pacing, pause};
use crate::decision::{DecisionClient, DecisionRequest};
use crate::errors::DraftError;

/// What a fast-forward run committed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FastForwardReport {
    /// Committed selections in pick order. Never rolled back.
    pub selections: Vec<Selection>,
    /// The run stopped because it was cancelled rather than reaching the
    /// human's turn or the end of the draft.
    pub cancelled: bool,
}

pub struct FastForward {
    session: Arc<DraftSession>,
    client: DecisionClient,
    pacing: Pacing,
    history_window: usize,
}

impl FastForward {
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

    /// Pick for every non-human participant from the cursor up to the human's
    /// next turn or the end of the draft.
    ///
    /// Decisions are strictly serialized: the call for a pick is only made
    /// after the previous pick is committed. An outstanding single pick is
    /// preempted first. Returns an empty report without any calls when the
    /// human is already on the clock or the draft is not running.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<FastForwardReport, DraftError> {
        let mut report = FastForwardReport::default();
        if !runnable(&self.session) {
            return Ok(report);
        }

        self.session.preempt(self.pacing.grace).await;
        let flight = self.session.begin_flight(cancel, FlightKind::Batch)?;
        let token = flight.token().clone();
        tracing::info!(cursor = self.session.snapshot().cursor, "fast-forward started");

        let mut failure: Option<DraftError> = None;
        loop {
            let state = self.session.snapshot();
            let Some(request) = DecisionRequest::for_current_pick(&state, self.history_window)
            else {
                break;
            };
            let Some(participant_id) = state.acting_participant().map(|p| p.id) else {
                break;
            };
            let sequence = state.cursor + 1;

            self.session.notify(DraftNotice::Deciding {
                sequence,
                participant_id,
            });

            let decision = tokio::select! {
                biased;
                _ = token.cancelled() => {
                    report.cancelled = true;
                    break;
                }
                decision = self.client.decide(&request) => match decision {
                    Ok(decision) => decision,
                    Err(err) => {
                        self.session.set_error(Some(err.to_string()));
                        failure = Some(err.into());
                        break;
                    }
                },
            };

            let proposal = PickProposal {
                sequence,
                participant_id,
                candidate_id: decision.candidate_id,
                rationale: Some(decision.rationale),
                source: decision.source,
            };
            match flight.commit(proposal) {
                Ok(Some(selection)) => report.selections.push(selection),
                Ok(None) => {
                    report.cancelled = true;
                    break;
                }
                Err(err) => {
                    failure = Some(err);
                    break;
                }
            }

            if !runnable(&self.session) {
                break;
            }
            if !pause(&token, self.pacing.cooldown).await {
                report.cancelled = true;
                break;
            }
        }

        drop(flight);
        tracing::info!(
            committed = report.selections.len(),
            cancelled = report.cancelled,
            "fast-forward finished"
        );
        self.session.notify(DraftNotice::FastForwardFinished {
            committed: report.selections.len(),
            cancelled: report.cancelled,
        });
        match failure {
            Some(err) => Err(err),
            None => Ok(report),
        }
    }
}

/// A non-human participant is on the clock in a running draft.
fn runnable(session: &DraftSession) -> bool {
    let state = session.snapshot();
    state.phase == DraftPhase::Drafting && !state.is_human_turn()
}
