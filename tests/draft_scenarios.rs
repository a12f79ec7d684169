//! End-to-end draft scenarios driven through the session and orchestrators
//! with scripted decision services and paused time.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use draftroom::catalog::Catalog;
use draftroom::decision::{ChatPrompt, DecisionClient, DecisionService, RetryPolicy, Sampling};
use draftroom::draft::{
    DecisionSource, DraftPhase, DraftSession, FastForward, FlightKind, Pacing, PickOrchestrator,
    PickOutcome, PickProposal, SessionState, participant_for_pick, round_for_pick,
};
use draftroom::errors::{DraftError, ServiceError};

/// Every call times out.
#[derive(Default)]
struct Unreachable {
    calls: AtomicU32,
}

#[async_trait]
impl DecisionService for Unreachable {
    async fn complete(&self, _prompt: &ChatPrompt) -> Result<String, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ServiceError::Timeout)
    }
}

/// Answers with the first board line of the prompt, optionally after a delay.
#[derive(Default)]
struct BoardReader {
    calls: AtomicU32,
    latency: Duration,
}

#[async_trait]
impl DecisionService for BoardReader {
    async fn complete(&self, prompt: &ChatPrompt) -> Result<String, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.latency).await;
        let id: String = prompt
            .user
            .lines()
            .map(str::trim_start)
            .find(|l| l.starts_with('#'))
            .ok_or(ServiceError::EmptyBody)?
            .trim_start_matches('#')
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        Ok(format!(
            r#"{{"candidateId": {}, "rationale": "Best player on the board."}}"#,
            id
        ))
    }
}

fn session(human: u32, rounds: u32) -> Arc<DraftSession> {
    let session = DraftSession::new(SessionState::new(Arc::new(Catalog::builtin()), rounds));
    session.choose_participant(human).unwrap();
    session
}

fn client(service: Arc<dyn DecisionService>) -> DecisionClient {
    DecisionClient::new(service, RetryPolicy::default(), Sampling::PICK)
}

fn assert_consistent(state: &SessionState) {
    let count = state.participant_count();
    let mut seen = HashSet::new();
    for (index, selection) in state.selections.iter().enumerate() {
        let index = index as u32;
        assert_eq!(selection.sequence, index + 1);
        assert_eq!(selection.participant_id, participant_for_pick(index, count));
        assert_eq!(selection.round, round_for_pick(index, count));
        assert!(seen.insert(selection.candidate.id), "candidate drafted twice");
        assert!(!state.pool.iter().any(|c| c.id == selection.candidate.id));
    }
    assert_eq!(state.cursor as usize, state.selections.len());
    assert_eq!(
        state.pool.len() + state.selections.len(),
        state.catalog().candidates().len()
    );
}

#[tokio::test(start_paused = true)]
async fn test_full_draft_with_unreachable_service_uses_fallback() {
    let session = session(3, 4);
    let service = Arc::new(Unreachable::default());
    let orchestrator =
        PickOrchestrator::new(session.clone(), client(service.clone()), Pacing::default(), 7);
    let cancel = CancellationToken::new();
    let start = Instant::now();

    loop {
        let state = session.snapshot();
        if state.phase != DraftPhase::Drafting {
            break;
        }
        if state.is_human_turn() {
            session.make_human_pick(state.pool[0].id, None).unwrap();
        } else {
            let outcome = orchestrator.run(&cancel).await.unwrap();
            assert!(matches!(outcome, PickOutcome::Committed(_)));
        }
    }

    let state = session.snapshot();
    assert_eq!(state.phase, DraftPhase::Complete);
    assert_eq!(state.cursor, 28);
    assert!(!state.in_progress);
    assert_consistent(&state);

    let machine: Vec<_> = state.selections.iter().filter(|s| !s.is_human()).collect();
    assert_eq!(machine.len(), 24);
    for selection in &machine {
        assert_eq!(selection.source, DecisionSource::Fallback);
        assert!(
            selection
                .rationale
                .as_deref()
                .unwrap()
                .contains("via fallback logic")
        );
    }
    assert!(
        state
            .selections_for(3)
            .all(|s| s.source == DecisionSource::Human)
    );

    // Three attempts per machine pick, waits of 1s and 2s between them.
    assert_eq!(service.calls.load(Ordering::SeqCst), 72);
    let per_pick = Duration::from_millis(500 + 1000 + 2000 + 2000);
    assert_eq!(start.elapsed(), per_pick * 24);
}

#[tokio::test(start_paused = true)]
async fn test_fallback_fills_needs_in_priority_order() {
    let session = session(7, 1);
    let orchestrator = PickOrchestrator::new(
        session.clone(),
        client(Arc::new(Unreachable::default())),
        Pacing::instant(),
        7,
    );

    // Raiders need QB first: the best-ranked quarterback goes first overall.
    let outcome = orchestrator.run(&CancellationToken::new()).await.unwrap();
    let PickOutcome::Committed(selection) = outcome else {
        panic!("expected a committed pick");
    };
    assert_eq!(selection.participant_id, 1);
    assert_eq!(selection.candidate.id, 1);
    assert_eq!(selection.source, DecisionSource::Fallback);
}

#[tokio::test(start_paused = true)]
async fn test_fast_forward_on_human_turn_makes_no_calls() {
    let session = session(1, 4);
    let service = Arc::new(BoardReader::default());
    let runner = FastForward::new(session.clone(), client(service.clone()), Pacing::default(), 7);

    let report = runner.run(&CancellationToken::new()).await.unwrap();
    assert!(report.selections.is_empty());
    assert!(!report.cancelled);
    assert_eq!(service.calls.load(Ordering::SeqCst), 0);
    assert_eq!(session.snapshot().cursor, 0);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_reveal_commits_nothing() {
    let session = session(4, 4);
    let service = Arc::new(BoardReader::default());
    let orchestrator =
        PickOrchestrator::new(session.clone(), client(service.clone()), Pacing::default(), 7);
    let cancel = CancellationToken::new();

    let task = {
        let cancel = cancel.clone();
        tokio::spawn(async move { orchestrator.run(&cancel).await })
    };
    // 500ms pre-pick, instant decision, then inside the 2s reveal.
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert!(session.snapshot().in_progress);
    cancel.cancel();

    let outcome = task.await.unwrap().unwrap();
    assert_eq!(outcome, PickOutcome::Cancelled);
    assert_eq!(service.calls.load(Ordering::SeqCst), 1);

    let state = session.snapshot();
    assert_eq!(state.cursor, 0);
    assert!(state.selections.is_empty());
    assert!(!state.in_progress);
    assert!(!session.is_busy());
}

#[tokio::test(start_paused = true)]
async fn test_single_flight_rejects_second_orchestration() {
    let session = session(4, 4);
    let service: Arc<dyn DecisionService> = Arc::new(BoardReader::default());
    let first = PickOrchestrator::new(session.clone(), client(service.clone()), Pacing::default(), 7);
    let second = PickOrchestrator::new(session.clone(), client(service), Pacing::default(), 7);
    let cancel = CancellationToken::new();

    let task = {
        let cancel = cancel.clone();
        tokio::spawn(async move { first.run(&cancel).await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(matches!(second.run(&cancel).await, Err(DraftError::Busy)));
    let outcome = task.await.unwrap().unwrap();
    assert!(matches!(outcome, PickOutcome::Committed(_)));
    assert_eq!(session.snapshot().cursor, 1);
}

#[tokio::test(start_paused = true)]
async fn test_fast_forward_preempts_outstanding_pick() {
    let session = session(4, 4);
    let slow = Arc::new(BoardReader {
        latency: Duration::from_secs(10),
        ..Default::default()
    });
    let single = PickOrchestrator::new(session.clone(), client(slow), Pacing::default(), 7);
    let fast = Arc::new(BoardReader::default());
    let runner = FastForward::new(session.clone(), client(fast.clone()), Pacing::default(), 7);
    let cancel = CancellationToken::new();

    let task = {
        let cancel = cancel.clone();
        tokio::spawn(async move { single.run(&cancel).await })
    };
    // The single pick is waiting on its slow decision.
    tokio::time::sleep(Duration::from_millis(1000)).await;
    assert!(session.is_busy());

    let report = runner.run(&cancel).await.unwrap();
    assert_eq!(task.await.unwrap().unwrap(), PickOutcome::Cancelled);

    let ids: Vec<u32> = report.selections.iter().map(|s| s.candidate.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(fast.calls.load(Ordering::SeqCst), 3);

    let state = session.snapshot();
    assert_consistent(&state);
    assert!(state.is_human_turn());
    assert!(!state.in_progress);
}

#[tokio::test(start_paused = true)]
async fn test_human_pick_is_rejected_while_busy_and_off_turn() {
    let session = session(2, 4);
    assert!(matches!(
        session.make_human_pick(1, None),
        Err(DraftError::NotHumanTurn)
    ));

    // A batch flight keeps its slot across commits, so the human's turn can
    // arrive while it is still registered.
    let flight = session
        .begin_flight(&CancellationToken::new(), FlightKind::Batch)
        .unwrap();
    flight
        .commit(PickProposal {
            sequence: 1,
            participant_id: 1,
            candidate_id: 1,
            rationale: None,
            source: DecisionSource::Service,
        })
        .unwrap()
        .unwrap();
    let state = session.snapshot();
    assert!(state.is_human_turn());
    assert!(state.in_progress);
    assert!(matches!(
        session.make_human_pick(5, None),
        Err(DraftError::Busy)
    ));
    assert_eq!(session.snapshot().cursor, 1);

    drop(flight);
    let selection = session.make_human_pick(5, Some("Edge rusher.".into())).unwrap();
    assert_eq!(selection.sequence, 2);
    assert_eq!(selection.participant_id, 2);
    assert_eq!(selection.source, DecisionSource::Human);
    assert_consistent(&session.snapshot());

    // The next machine pick still goes through the orchestrator.
    let orchestrator = PickOrchestrator::new(
        session.clone(),
        client(Arc::new(BoardReader::default())),
        Pacing::instant(),
        7,
    );
    let outcome = orchestrator.run(&CancellationToken::new()).await.unwrap();
    assert!(matches!(outcome, PickOutcome::Committed(_)));
    assert_eq!(session.snapshot().cursor, 3);
}

#[tokio::test(start_paused = true)]
async fn test_offline_client_never_calls_and_never_stalls() {
    let session = session(5, 1);
    let runner = FastForward::new(session.clone(), DecisionClient::offline(), Pacing::instant(), 7);

    let report = runner.run(&CancellationToken::new()).await.unwrap();
    assert_eq!(report.selections.len(), 4);
    assert!(report.selections.iter().all(|s| s.is_fallback()));
    assert!(session.snapshot().is_human_turn());
}
