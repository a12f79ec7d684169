//! Post-draft grading of each participant's class.
//!
//! Uses the same [`DecisionService`] and [`RetryPolicy`] as pick decisions and
//! falls back to a rule-based grade when the service cannot answer.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::catalog::Position;
use crate::decision::{Attempted, ChatPrompt, DecisionService, RetryPolicy, Sampling};
use crate::draft::{DecisionSource, SessionState};
use crate::errors::{DecisionError, ServiceError};
use crate::util::{extract_json_array, strip_code_fences};

/// One pick as seen by the grader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradedPick {
    pub round: u32,
    pub candidate_name: String,
    pub position: Position,
    /// Board rank of the candidate (its id).
    pub rank: u32,
}

/// One participant's class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassSummary {
    pub participant_name: String,
    pub needs: Vec<Position>,
    pub context: String,
    pub picks: Vec<GradedPick>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradeRequest {
    pub classes: Vec<ClassSummary>,
}

impl GradeRequest {
    /// Summarize every participant's selections in `state`, in participant order.
    pub fn from_state(state: &SessionState) -> Self {
        let classes = state
            .catalog()
            .participants()
            .iter()
            .map(|p| ClassSummary {
                participant_name: p.name.clone(),
                needs: p.needs.clone(),
                context: p.context.clone(),
                picks: state
                    .selections_for(p.id)
                    .map(|s| GradedPick {
                        round: s.round,
                        candidate_name: s.candidate.name.clone(),
                        position: s.candidate.position,
                        rank: s.candidate.id,
                    })
                    .collect(),
            })
            .collect();
        Self { classes }
    }
}

/// Grade for one participant, in the shape the service returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamGrade {
    pub team_name: String,
    pub grade: String,
    pub analysis: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradeReport {
    pub grades: Vec<TeamGrade>,
    pub source: DecisionSource,
}

impl GradeReport {
    pub fn is_fallback(&self) -> bool {
        self.source == DecisionSource::Fallback
    }
}

const GRADE_SYSTEM_PROMPT: &str = r#"You are an expert NFL Draft analyst. Grade each team's draft class.
You MUST respond with ONLY valid JSON: an array of objects with this exact format:
[{"teamName": "<name>", "grade": "<A+ to F>", "analysis": "<2-3 sentence analysis>"}]
No other text. No markdown. Just the JSON array."#;

pub fn build_grade_prompt(request: &GradeRequest) -> String {
    let breakdown = request
        .classes
        .iter()
        .map(|class| {
            let needs = class
                .needs
                .iter()
                .map(|p| p.code())
                .collect::<Vec<_>>()
                .join(", ");
            let picks = class
                .picks
                .iter()
                .map(|p| {
                    format!(
                        "  R{}: {} ({}, ranked #{})",
                        p.round, p.candidate_name, p.position, p.rank
                    )
                })
                .collect::<Vec<_>>()
                .join("\n");
            format!(
                "{} (needs: {}; context: {}):\n{}",
                class.participant_name, needs, class.context, picks
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        r#"Grade each team's draft performance. Consider:
- Did they address priority needs?
- Did they get good value (low-ranked picks = better talent)?
- Overall draft strategy and roster building

{breakdown}

Respond with JSON only."#
    )
}

/// Parse the service's grade array. Anything other than a JSON array of
/// grade objects is malformed.
pub fn parse_grade_response(text: &str) -> Result<Vec<TeamGrade>, DecisionError> {
    if text.trim().is_empty() {
        return Err(ServiceError::EmptyBody.into());
    }
    let cleaned = strip_code_fences(text);
    let json = extract_json_array(&cleaned)
        .ok_or_else(|| DecisionError::Malformed("response is not a JSON array".into()))?;
    serde_json::from_str(&json).map_err(|e| DecisionError::Malformed(e.to_string()))
}

/// Rule-based grade for one class.
///
/// A pick addresses a need when its position satisfies any of the class's
/// needs; the average rank is the mean board rank of all picks (0 with none).
pub fn fallback_grade(class: &ClassSummary) -> TeamGrade {
    let needs_addressed = class
        .picks
        .iter()
        .filter(|p| class.needs.iter().any(|need| p.position.satisfies(*need)))
        .count();

    let avg_rank = if class.picks.is_empty() {
        0.0
    } else {
        class.picks.iter().map(|p| p.rank as f64).sum::<f64>() / class.picks.len() as f64
    };

    let grade = match (needs_addressed, avg_rank <= 15.0) {
        (n, true) if n >= 2 => "A",
        (n, false) if n >= 2 => "A-",
        (1, true) => "B+",
        (1, false) => "B",
        _ => "C+",
    };

    TeamGrade {
        team_name: class.participant_name.clone(),
        grade: grade.to_string(),
        analysis: format!(
            "Addressed {} of {} primary needs. Average player ranking: #{}.",
            needs_addressed,
            class.needs.len(),
            avg_rank.round() as u32
        ),
    }
}

pub struct GradingClient {
    service: Arc<dyn DecisionService>,
    retry: RetryPolicy,
    sampling: Sampling,
}

impl GradingClient {
    pub fn new(service: Arc<dyn DecisionService>, retry: RetryPolicy, sampling: Sampling) -> Self {
        Self {
            service,
            retry,
            sampling,
        }
    }

    /// Grade every class, falling back to [`fallback_grade`] once retries run out.
    pub async fn grade(&self, request: &GradeRequest) -> Result<GradeReport, DecisionError> {
        if request.classes.is_empty() {
            return Err(DecisionError::InvalidRequest("no classes to grade".into()));
        }

        let prompt = ChatPrompt {
            system: GRADE_SYSTEM_PROMPT.to_string(),
            user: build_grade_prompt(request),
            sampling: self.sampling,
        };
        let service = &self.service;
        let prompt = &prompt;

        let outcome = self
            .retry
            .run("grade", move |_attempt| async move {
                let text = service.complete(prompt).await?;
                parse_grade_response(&text)
            })
            .await;

        match outcome {
            Attempted::Succeeded { value, .. } => Ok(GradeReport {
                grades: value,
                source: DecisionSource::Service,
            }),
            Attempted::Exhausted { attempts, .. } => {
                tracing::warn!(attempts, "grading service unavailable, using fallback grades");
                Ok(GradeReport {
                    grades: request.classes.iter().map(fallback_grade).collect(),
                    source: DecisionSource::Fallback,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::OfflineService;

    fn pick(position: Position, rank: u32) -> GradedPick {
        GradedPick {
            round: 1,
            candidate_name: format!("Prospect {}", rank),
            position,
            rank,
        }
    }

    fn class(picks: Vec<GradedPick>) -> ClassSummary {
        ClassSummary {
            participant_name: "Las Vegas Raiders".into(),
            needs: vec![Position::Qb, Position::Cb, Position::Ol],
            context: String::new(),
            picks,
        }
    }

    #[test]
    fn test_fallback_grade_a() {
        let grade = fallback_grade(&class(vec![pick(Position::Qb, 1), pick(Position::Og, 20)]));
        assert_eq!(grade.grade, "A");
        assert_eq!(
            grade.analysis,
            "Addressed 2 of 3 primary needs. Average player ranking: #11."
        );
    }

    #[test]
    fn test_fallback_grade_a_minus() {
        let grade = fallback_grade(&class(vec![pick(Position::Qb, 20), pick(Position::Cb, 28)]));
        assert_eq!(grade.grade, "A-");
    }

    #[test]
    fn test_fallback_grade_b_plus_and_b() {
        assert_eq!(
            fallback_grade(&class(vec![pick(Position::Ot, 9), pick(Position::Rb, 8)])).grade,
            "B+"
        );
        assert_eq!(
            fallback_grade(&class(vec![pick(Position::Ot, 20), pick(Position::Rb, 22)])).grade,
            "B"
        );
    }

    #[test]
    fn test_fallback_grade_no_needs_met() {
        let grade = fallback_grade(&class(vec![pick(Position::Rb, 8), pick(Position::Te, 13)]));
        assert_eq!(grade.grade, "C+");
    }

    #[test]
    fn test_fallback_grade_without_picks() {
        let grade = fallback_grade(&class(vec![]));
        assert_eq!(grade.grade, "C+");
        assert!(grade.analysis.ends_with("Average player ranking: #0."));
    }

    #[test]
    fn test_parse_grade_array() {
        let text = "```json\n[{\"teamName\": \"LV\", \"grade\": \"B+\", \"analysis\": \"Solid.\"}]\n```";
        let grades = parse_grade_response(text).unwrap();
        assert_eq!(grades.len(), 1);
        assert_eq!(grades[0].grade, "B+");
    }

    #[test]
    fn test_parse_grade_rejects_object() {
        assert!(matches!(
            parse_grade_response(r#"{"teamName": "LV"}"#),
            Err(DecisionError::Malformed(_))
        ));
    }

    #[test]
    fn test_grade_prompt_lists_picks() {
        let request = GradeRequest {
            classes: vec![class(vec![pick(Position::Qb, 3)])],
        };
        let prompt = build_grade_prompt(&request);
        assert!(prompt.contains("Las Vegas Raiders (needs: QB, CB, OL; context: ):"));
        assert!(prompt.contains("R1: Prospect 3 (QB, ranked #3)"));
    }

    #[tokio::test]
    async fn test_offline_grading_uses_fallback() {
        let client = GradingClient::new(Arc::new(OfflineService), RetryPolicy::none(), Sampling::GRADE);
        let request = GradeRequest {
            classes: vec![class(vec![pick(Position::Qb, 1)])],
        };
        let report = client.grade(&request).await.unwrap();
        assert!(report.is_fallback());
        assert_eq!(report.grades[0].grade, "B+");
    }

    #[tokio::test]
    async fn test_empty_request_rejected() {
        let client = GradingClient::new(Arc::new(OfflineService), RetryPolicy::none(), Sampling::GRADE);
        let err = client.grade(&GradeRequest { classes: vec![] }).await.unwrap_err();
        assert!(matches!(err, DecisionError::InvalidRequest(_)));
    }
}
