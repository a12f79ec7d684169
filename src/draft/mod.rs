//! Draft engine: the state machine, the policies that feed it, and the
//! orchestrators that drive non-human turns.

pub mod fallback;
pub mod fast_forward;
pub mod needs;
pub mod pick;
pub mod session;
pub mod state;

pub use fallback::{FallbackPick, Suggestion, SuggestionReason, fallback_pick, suggested_picks};
pub use fast_forward::{FastForward, FastForwardReport};
pub use needs::remaining_needs;
pub use pick::{PickOrchestrator, PickOutcome};
pub use session::{DraftNotice, DraftSession, FlightGuard, FlightKind};
pub use state::{
    DecisionSource, DraftAction, DraftPhase, PickProposal, Selection, SessionState,
    participant_for_pick, round_for_pick, transition,
};

use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Display pacing for the orchestrators. None of these affect correctness;
/// all of them may be zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    /// Wait before a single pick starts deciding.
    pub pre_pick: Duration,
    /// How long a decided single pick is shown before it is committed.
    pub reveal: Duration,
    /// Gap between consecutive decision calls during fast-forward.
    pub cooldown: Duration,
    /// How long a preempting orchestration waits for the outstanding one to settle.
    pub grace: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            pre_pick: Duration::from_millis(500),
            reveal: Duration::from_millis(2000),
            cooldown: Duration::from_millis(500),
            grace: Duration::from_millis(100),
        }
    }
}

impl Pacing {
    /// No display delays. The preemption grace is kept.
    pub fn instant() -> Self {
        Self {
            pre_pick: Duration::ZERO,
            reveal: Duration::ZERO,
            cooldown: Duration::ZERO,
            ..Self::default()
        }
    }
}

/// Sleep for `delay` unless `token` fires first. Returns `false` if cancelled.
pub(crate) async fn pause(token: &CancellationToken, delay: Duration) -> bool {
    if token.is_cancelled() {
        return false;
    }
    if delay.is_zero() {
        return true;
    }
    tokio::select! {
        biased;
        _ = token.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pacing() {
        let pacing = Pacing::default();
        assert_eq!(pacing.reveal, Duration::from_millis(2000));
        assert_eq!(pacing.cooldown, Duration::from_millis(500));
        assert!(pacing.cooldown < Duration::from_millis(1000));
    }

    #[test]
    fn test_instant_pacing_keeps_grace() {
        let pacing = Pacing::instant();
        assert!(pacing.reveal.is_zero());
        assert_eq!(pacing.grace, Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_completes() {
        let token = CancellationToken::new();
        let start = tokio::time::Instant::now();
        assert!(pause(&token, Duration::from_secs(2)).await);
        assert_eq!(start.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_observes_cancellation() {
        let token = CancellationToken::new();
        let child = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            child.cancel();
        });
        let start = tokio::time::Instant::now();
        assert!(!pause(&token, Duration::from_secs(2)).await);
        assert_eq!(start.elapsed(), Duration::from_millis(300));
    }

    #[tokio::test]
    async fn test_pause_on_cancelled_token_returns_immediately() {
        let token = CancellationToken::new();
        token.cancel();
        assert!(!pause(&token, Duration::ZERO).await);
    }
}
