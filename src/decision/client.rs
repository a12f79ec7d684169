use std::sync::Arc;

use super::prompt::{build_pick_prompt, build_system_prompt, parse_pick_response};
use super::retry::{Attempted, RetryPolicy};
use super::service::{ChatPrompt, DecisionService, OfflineService, Sampling};
use super::{Decision, DecisionRequest};
use crate::draft::{DecisionSource, fallback_pick};
use crate::errors::DecisionError;

/// Chooses a candidate for one non-human turn.
///
/// Always yields a decision for a valid request: service failures are retried
/// per the [`RetryPolicy`] and then replaced by the fallback policy.
#[derive(Clone)]
pub struct DecisionClient {
    service: Arc<dyn DecisionService>,
    retry: RetryPolicy,
    sampling: Sampling,
}

impl DecisionClient {
    pub fn new(service: Arc<dyn DecisionService>, retry: RetryPolicy, sampling: Sampling) -> Self {
        Self {
            service,
            retry,
            sampling,
        }
    }

    /// A client that never calls out; every decision is a fallback.
    pub fn offline() -> Self {
        Self::new(Arc::new(OfflineService), RetryPolicy::none(), Sampling::PICK)
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn service(&self) -> &Arc<dyn DecisionService> {
        &self.service
    }

    /// Decide for the participant described by `request`.
    ///
    /// Only an invalid request is an error; nothing is sent in that case.
    pub async fn decide(&self, request: &DecisionRequest) -> Result<Decision, DecisionError> {
        request.validate()?;

        let prompt = ChatPrompt {
            system: build_system_prompt(request),
            user: build_pick_prompt(request),
            sampling: self.sampling,
        };

        let service = &self.service;
        let prompt = &prompt;
        let pool = &request.pool[..];
        let outcome = self
            .retry
            .run("pick", move |attempt| async move {
                tracing::debug!(attempt, pick = request.pick_number, "requesting decision");
                let text = service.complete(prompt).await?;
                parse_pick_response(&text, pool)
            })
            .await;

        match outcome {
            Attempted::Succeeded {
                value: (candidate_id, rationale),
                attempts,
            } => Ok(Decision {
                candidate_id,
                rationale,
                source: DecisionSource::Service,
                attempts,
            }),
            Attempted::Exhausted {
                attempts,
                last_error,
            } => {
                let fallback = fallback_pick(&request.pool, &request.unmet_needs).ok_or_else(
                    || DecisionError::InvalidRequest("no candidates remain in the pool".into()),
                )?;
                let reason = last_error
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "no attempts made".to_string());
                tracing::warn!(
                    participant = %request.participant_name,
                    pick = request.pick_number,
                    attempts,
                    last_error = %reason,
                    candidate_id = fallback.candidate_id,
                    "decision service unavailable, using fallback pick"
                );
                Ok(Decision {
                    candidate_id: fallback.candidate_id,
                    rationale: fallback.rationale,
                    source: DecisionSource::Fallback,
                    attempts,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, Position};
    use crate::errors::ServiceError;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    /// Replays scripted replies, then fails with `Timeout`.
    struct ScriptedService {
        replies: Mutex<VecDeque<Result<String, ServiceError>>>,
        calls: AtomicU32,
    }

    impl ScriptedService {
        fn new(replies: Vec<Result<String, ServiceError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                calls: AtomicU32::new(0),
            })
        }
    }

    #[async_trait]
    impl DecisionService for ScriptedService {
        async fn complete(&self, _prompt: &ChatPrompt) -> Result<String, ServiceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(ServiceError::Timeout))
        }
    }

    fn request() -> DecisionRequest {
        DecisionRequest {
            participant_name: "Las Vegas Raiders".into(),
            needs: vec![Position::Qb, Position::Cb, Position::Ol],
            unmet_needs: vec![Position::Cb, Position::Ol],
            context: String::new(),
            pool: Catalog::builtin().candidates().to_vec(),
            round: 1,
            pick_number: 1,
            recent_picks: Vec::new(),
        }
    }

    fn client(service: Arc<ScriptedService>) -> DecisionClient {
        DecisionClient::new(service, RetryPolicy::default(), Sampling::PICK)
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_attempt_success() {
        let service = ScriptedService::new(vec![Ok(r#"{"candidateId": 3, "rationale": "QB"}"#.into())]);
        let decision = client(service.clone()).decide(&request()).await.unwrap();
        assert_eq!(decision.candidate_id, 3);
        assert_eq!(decision.source, DecisionSource::Service);
        assert_eq!(decision.attempts, 1);
        assert_eq!(service.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_id_retried_then_accepted() {
        let service = ScriptedService::new(vec![
            Ok(r#"{"candidateId": 99}"#.into()),
            Ok("not json".into()),
            Ok(r#"{"candidateId": 7}"#.into()),
        ]);
        let decision = client(service.clone()).decide(&request()).await.unwrap();
        assert_eq!(decision.candidate_id, 7);
        assert_eq!(decision.attempts, 3);
        assert!(!decision.is_fallback());
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_falls_back_after_three_calls() {
        let service = ScriptedService::new(vec![
            Err(ServiceError::Status {
                status: 500,
                body: "oops".into(),
            }),
            Ok(String::new()),
        ]);
        let start = tokio::time::Instant::now();
        let decision = client(service.clone()).decide(&request()).await.unwrap();

        assert_eq!(service.calls.load(Ordering::SeqCst), 3);
        assert_eq!(start.elapsed(), Duration::from_secs(3));
        assert!(decision.is_fallback());
        // Best CB on the board is Travis Hunter (#2).
        assert_eq!(decision.candidate_id, 2);
        assert!(decision.rationale.contains("fallback logic"));
    }

    #[tokio::test]
    async fn test_invalid_request_makes_no_calls() {
        let service = ScriptedService::new(vec![]);
        let mut req = request();
        req.pool.clear();
        let err = client(service.clone()).decide(&req).await.unwrap_err();
        assert!(matches!(err, DecisionError::InvalidRequest(_)));
        assert_eq!(service.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_offline_client_falls_back_immediately() {
        let decision = DecisionClient::offline().decide(&request()).await.unwrap();
        assert_eq!(decision.attempts, 0);
        assert_eq!(decision.source, DecisionSource::Fallback);
        assert_eq!(decision.candidate_id, 2);
    }
}
