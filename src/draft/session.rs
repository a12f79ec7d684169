//! Owner of the one [`SessionState`] of a draft.
//!
//! Every mutation goes through [`transition`] while holding the session lock, so
//! each logical turn is applied atomically. The session also holds the
//! single-flight slot: at most one orchestration may be registered at a time,
//! and `in_progress` in the state is true exactly while one is.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;

use super::state::{
    DecisionSource, DraftAction, DraftPhase, PickProposal, Selection, SessionState, transition,
};
use crate::catalog::Candidate;
use crate::errors::{DraftError, TransitionError};

const NOTICE_CAPACITY: usize = 64;

/// Display events emitted by the session and its orchestrators.
#[derive(Debug, Clone)]
pub enum DraftNotice {
    /// A non-human participant went on the clock and a decision was requested.
    Deciding { sequence: u32, participant_id: u32 },
    /// A decision is being shown before it is committed.
    Revealing {
        sequence: u32,
        participant_id: u32,
        candidate: Candidate,
        rationale: String,
        source: DecisionSource,
    },
    Committed(Selection),
    /// An orchestration stopped before committing pick `sequence`.
    Cancelled { sequence: u32 },
    FastForwardFinished { committed: usize, cancelled: bool },
}

/// Kind of orchestration holding the single-flight slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlightKind {
    /// One revealed pick; the flight ends with its commit.
    Single,
    /// A fast-forward run; the flight spans many commits.
    Batch,
}

struct Flight {
    id: u64,
    kind: FlightKind,
    token: CancellationToken,
}

struct Inner {
    state: SessionState,
    flight: Option<Flight>,
}

pub struct DraftSession {
    inner: Mutex<Inner>,
    busy: watch::Sender<bool>,
    notices: broadcast::Sender<DraftNotice>,
    next_flight_id: AtomicU64,
}

impl DraftSession {
    pub fn new(state: SessionState) -> Arc<Self> {
        let (busy, _) = watch::channel(false);
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);
        Arc::new(Self {
            inner: Mutex::new(Inner {
                state,
                flight: None,
            }),
            busy,
            notices,
            next_flight_id: AtomicU64::new(1),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply `action` to the held state; the state is unchanged on error.
    fn apply(inner: &mut Inner, action: DraftAction) -> Result<(), TransitionError> {
        inner.state = transition(&inner.state, action)?;
        Ok(())
    }

    pub(crate) fn notify(&self, notice: DraftNotice) {
        // No subscribers is fine.
        let _ = self.notices.send(notice);
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> SessionState {
        self.lock().state.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DraftNotice> {
        self.notices.subscribe()
    }

    /// Whether an orchestration currently holds the single-flight slot.
    pub fn is_busy(&self) -> bool {
        self.lock().flight.is_some()
    }

    pub fn choose_participant(&self, participant_id: u32) -> Result<(), DraftError> {
        let mut inner = self.lock();
        Self::apply(&mut inner, DraftAction::ChooseParticipant { participant_id })?;
        tracing::info!(participant_id, "human participant chosen");
        Ok(())
    }

    pub fn set_error(&self, message: Option<String>) {
        let mut inner = self.lock();
        // SetError is valid in every phase.
        let _ = Self::apply(&mut inner, DraftAction::SetError(message));
    }

    /// Start over. Any outstanding orchestration is cancelled and loses its slot.
    pub fn reset(&self) {
        let mut inner = self.lock();
        if let Some(flight) = inner.flight.take() {
            flight.token.cancel();
        }
        let _ = Self::apply(&mut inner, DraftAction::Reset);
        self.busy.send_replace(false);
        tracing::info!("draft reset");
    }

    /// Commit the human participant's choice for the current pick.
    pub fn make_human_pick(
        &self,
        candidate_id: u32,
        rationale: Option<String>,
    ) -> Result<Selection, DraftError> {
        let mut inner = self.lock();
        if inner.state.phase != DraftPhase::Drafting {
            return Err(DraftError::NotDrafting {
                phase: inner.state.phase,
            });
        }
        if !inner.state.is_human_turn() {
            return Err(DraftError::NotHumanTurn);
        }
        if inner.flight.is_some() {
            return Err(DraftError::Busy);
        }

        let proposal = PickProposal {
            sequence: inner.state.cursor + 1,
            participant_id: inner.state.human_participant.ok_or(DraftError::NotHumanTurn)?,
            candidate_id,
            rationale,
            source: DecisionSource::Human,
        };
        Self::apply(&mut inner, DraftAction::CommitSelection(proposal))?;
        let selection = committed(&inner.state)?;
        drop(inner);

        tracing::info!(
            sequence = selection.sequence,
            candidate = %selection.candidate.name,
            "human pick committed"
        );
        self.notify(DraftNotice::Committed(selection.clone()));
        Ok(selection)
    }

    /// Claim the single-flight slot for a new orchestration.
    ///
    /// The returned guard owns a child of `cancel`; dropping the guard releases
    /// the slot and clears `in_progress`.
    pub fn begin_flight(
        self: &Arc<Self>,
        cancel: &CancellationToken,
        kind: FlightKind,
    ) -> Result<FlightGuard, DraftError> {
        let mut inner = self.lock();
        let state = &inner.state;
        if state.phase != DraftPhase::Drafting {
            return Err(DraftError::NotDrafting { phase: state.phase });
        }
        if state.is_human_turn() {
            return Err(DraftError::HumanTurn {
                participant: state.human_participant.unwrap_or_default(),
            });
        }
        if inner.flight.is_some() || state.in_progress {
            return Err(DraftError::Busy);
        }

        let id = self.next_flight_id.fetch_add(1, Ordering::Relaxed);
        let token = cancel.child_token();
        Self::apply(&mut inner, DraftAction::SetInProgress(true))?;
        inner.flight = Some(Flight {
            id,
            kind,
            token: token.clone(),
        });
        self.busy.send_replace(true);
        tracing::debug!(flight = id, ?kind, cursor = inner.state.cursor, "flight started");

        Ok(FlightGuard {
            session: Arc::clone(self),
            id,
            kind,
            token,
        })
    }

    /// Cancel the outstanding orchestration, if any, and wait up to `grace`
    /// for it to release its slot. A flight that has not settled by then is
    /// evicted so the caller can proceed.
    pub async fn preempt(&self, grace: Duration) {
        let mut busy = self.busy.subscribe();
        {
            let inner = self.lock();
            match &inner.flight {
                Some(flight) => {
                    tracing::debug!(flight = flight.id, "preempting outstanding flight");
                    flight.token.cancel();
                }
                None => return,
            }
        }

        let settled = tokio::time::timeout(grace, busy.wait_for(|busy| !*busy))
            .await
            .map(|r| r.is_ok())
            .unwrap_or(false);

        if !settled {
            let mut inner = self.lock();
            if let Some(flight) = inner.flight.take() {
                tracing::warn!(flight = flight.id, "flight did not settle within grace period, evicting");
                let _ = Self::apply(&mut inner, DraftAction::SetInProgress(false));
                self.busy.send_replace(false);
            }
        }
    }

    fn commit_flight(
        &self,
        id: u64,
        proposal: PickProposal,
    ) -> Result<Option<Selection>, DraftError> {
        let mut inner = self.lock();
        let (kind, cancelled) = match &inner.flight {
            Some(flight) if flight.id == id => (flight.kind, flight.token.is_cancelled()),
            _ => return Ok(None),
        };
        if cancelled {
            return Ok(None);
        }

        Self::apply(&mut inner, DraftAction::CommitSelection(proposal))?;
        match kind {
            FlightKind::Single => {
                inner.flight = None;
                self.busy.send_replace(false);
            }
            FlightKind::Batch if inner.state.phase == DraftPhase::Drafting => {
                Self::apply(&mut inner, DraftAction::SetInProgress(true))?;
            }
            // A completed draft leaves nothing to hold in progress; the guard
            // still owns the slot until it is dropped.
            FlightKind::Batch => {}
        }
        let selection = committed(&inner.state)?;
        drop(inner);

        tracing::info!(
            sequence = selection.sequence,
            participant_id = selection.participant_id,
            candidate = %selection.candidate.name,
            source = %selection.source,
            "pick committed"
        );
        self.notify(DraftNotice::Committed(selection.clone()));
        Ok(Some(selection))
    }

    fn end_flight(&self, id: u64) {
        let mut inner = self.lock();
        if inner.flight.as_ref().is_some_and(|f| f.id == id) {
            inner.flight = None;
            let _ = Self::apply(&mut inner, DraftAction::SetInProgress(false));
            self.busy.send_replace(false);
            tracing::debug!(flight = id, "flight ended");
        }
    }
}

fn committed(state: &SessionState) -> Result<Selection, DraftError> {
    state
        .selections
        .last()
        .cloned()
        .ok_or(DraftError::NotDrafting { phase: state.phase })
}

/// Registration of one orchestration in the single-flight slot.
pub struct FlightGuard {
    session: Arc<DraftSession>,
    id: u64,
    kind: FlightKind,
    token: CancellationToken,
}

impl FlightGuard {
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn kind(&self) -> FlightKind {
        self.kind
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Commit `proposal` if this flight still owns the slot and has not been
    /// cancelled. Both checks and the commit happen under the session lock.
    ///
    /// Returns `Ok(None)` when the flight was cancelled or evicted.
    pub fn commit(&self, proposal: PickProposal) -> Result<Option<Selection>, DraftError> {
        self.session.commit_flight(self.id, proposal)
    }
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        self.session.end_flight(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::draft::participant_for_pick;

    fn session(human: u32) -> Arc<DraftSession> {
        let session = DraftSession::new(SessionState::new(Arc::new(Catalog::builtin()), 4));
        session.choose_participant(human).unwrap();
        session
    }

    fn proposal(state: &SessionState) -> PickProposal {
        PickProposal {
            sequence: state.cursor + 1,
            participant_id: participant_for_pick(state.cursor, state.participant_count()),
            candidate_id: state.pool[0].id,
            rationale: Some("test".into()),
            source: DecisionSource::Service,
        }
    }

    #[test]
    fn test_flight_sets_and_clears_in_progress() {
        let session = session(3);
        let token = CancellationToken::new();
        let guard = session.begin_flight(&token, FlightKind::Single).unwrap();
        assert!(session.snapshot().in_progress);
        assert!(session.is_busy());
        drop(guard);
        assert!(!session.snapshot().in_progress);
        assert!(!session.is_busy());
    }

    #[test]
    fn test_second_flight_is_busy() {
        let session = session(3);
        let token = CancellationToken::new();
        let _guard = session.begin_flight(&token, FlightKind::Single).unwrap();
        let err = session.begin_flight(&token, FlightKind::Single).err().unwrap();
        assert!(matches!(err, DraftError::Busy));
    }

    #[test]
    fn test_flight_rejected_on_human_turn() {
        let session = session(1);
        let err = session
            .begin_flight(&CancellationToken::new(), FlightKind::Single)
            .err()
            .unwrap();
        assert!(matches!(err, DraftError::HumanTurn { participant: 1 }));
    }

    #[test]
    fn test_single_commit_releases_slot() {
        let session = session(3);
        let guard = session
            .begin_flight(&CancellationToken::new(), FlightKind::Single)
            .unwrap();
        let selection = guard.commit(proposal(&session.snapshot())).unwrap().unwrap();
        assert_eq!(selection.sequence, 1);
        assert!(!session.is_busy());
        assert!(!session.snapshot().in_progress);
        drop(guard);
        assert_eq!(session.snapshot().cursor, 1);
    }

    #[test]
    fn test_batch_commit_keeps_slot() {
        let session = session(7);
        let guard = session
            .begin_flight(&CancellationToken::new(), FlightKind::Batch)
            .unwrap();
        guard.commit(proposal(&session.snapshot())).unwrap().unwrap();
        guard.commit(proposal(&session.snapshot())).unwrap().unwrap();
        let state = session.snapshot();
        assert_eq!(state.cursor, 2);
        assert!(state.in_progress);
        assert!(session.is_busy());
        drop(guard);
        assert!(!session.snapshot().in_progress);
    }

    #[test]
    fn test_cancelled_flight_cannot_commit() {
        let session = session(3);
        let parent = CancellationToken::new();
        let guard = session.begin_flight(&parent, FlightKind::Single).unwrap();
        let pending = proposal(&session.snapshot());
        parent.cancel();
        assert!(guard.is_cancelled());
        assert_eq!(guard.commit(pending).unwrap(), None);
        drop(guard);
        let state = session.snapshot();
        assert_eq!(state.cursor, 0);
        assert!(!state.in_progress);
    }

    #[test]
    fn test_human_pick() {
        let session = session(1);
        let mut notices = session.subscribe();
        let selection = session.make_human_pick(4, None).unwrap();
        assert!(selection.is_human());
        assert_eq!(selection.candidate.id, 4);
        assert!(matches!(notices.try_recv(), Ok(DraftNotice::Committed(_))));

        // Participant 2 is on the clock now.
        assert!(matches!(
            session.make_human_pick(5, None),
            Err(DraftError::NotHumanTurn)
        ));
    }

    #[test]
    fn test_human_pick_of_taken_candidate() {
        let session = session(2);
        let guard = session
            .begin_flight(&CancellationToken::new(), FlightKind::Single)
            .unwrap();
        let mut first = proposal(&session.snapshot());
        first.candidate_id = 4;
        guard.commit(first).unwrap();
        drop(guard);

        let err = session.make_human_pick(4, None).unwrap_err();
        assert!(matches!(
            err,
            DraftError::Transition(TransitionError::CandidateUnavailable { id: 4 })
        ));
        assert_eq!(session.snapshot().cursor, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_preempt_waits_for_settlement() {
        let session = session(3);
        let guard = session
            .begin_flight(&CancellationToken::new(), FlightKind::Single)
            .unwrap();
        let token = guard.token().clone();
        tokio::spawn(async move {
            token.cancelled().await;
            tokio::time::sleep(Duration::from_millis(20)).await;
            drop(guard);
        });

        let start = tokio::time::Instant::now();
        session.preempt(Duration::from_millis(100)).await;
        assert_eq!(start.elapsed(), Duration::from_millis(20));
        assert!(!session.is_busy());
    }

    #[tokio::test(start_paused = true)]
    async fn test_preempt_evicts_stuck_flight() {
        let session = session(3);
        let guard = session
            .begin_flight(&CancellationToken::new(), FlightKind::Single)
            .unwrap();
        let pending = proposal(&session.snapshot());

        session.preempt(Duration::from_millis(100)).await;
        assert!(!session.is_busy());
        assert!(!session.snapshot().in_progress);

        // The evicted flight can no longer commit, and dropping it is harmless.
        assert_eq!(guard.commit(pending).unwrap(), None);
        drop(guard);
        assert_eq!(session.snapshot().cursor, 0);
    }

    #[tokio::test]
    async fn test_preempt_without_flight_returns() {
        let session = session(3);
        session.preempt(Duration::from_millis(100)).await;
        assert!(!session.is_busy());
    }

    #[test]
    fn test_reset_releases_flight() {
        let session = session(3);
        let guard = session
            .begin_flight(&CancellationToken::new(), FlightKind::Batch)
            .unwrap();
        session.reset();
        assert!(guard.is_cancelled());
        let state = session.snapshot();
        assert_eq!(state.phase, DraftPhase::SelectingParticipant);
        assert!(!state.in_progress);
        drop(guard);
        assert!(!session.is_busy());
    }

    #[test]
    fn test_set_error() {
        let session = session(3);
        session.set_error(Some("notice".into()));
        assert_eq!(session.snapshot().error.as_deref(), Some("notice"));
        session.set_error(None);
        assert!(session.snapshot().error.is_none());
    }
}
