//! Prompt construction and response parsing for per-pick decisions.

use super::{DEFAULT_RATIONALE, DecisionRequest};
use crate::catalog::{Candidate, Position};
use crate::errors::{DecisionError, ServiceError};
use crate::util::{extract_json_object, strip_code_fences};

fn join_positions(positions: &[Position]) -> String {
    positions
        .iter()
        .map(|p| p.code())
        .collect::<Vec<_>>()
        .join(", ")
}

/// System message for a pick decision.
pub fn build_system_prompt(request: &DecisionRequest) -> String {
    format!(
        r#"You are an expert NFL General Manager making draft selections for the {team}.
You analyze player talent, team needs, and draft value to make optimal picks.
You MUST respond with ONLY valid JSON in this exact format: {{"candidateId": <number>, "rationale": "<1-2 sentence explanation>"}}
No other text, no markdown, no code fences. Just the JSON object."#,
        team = request.participant_name
    )
}

/// User message for a pick decision: needs, context, recent picks and the ranked pool.
pub fn build_pick_prompt(request: &DecisionRequest) -> String {
    let board = request
        .pool
        .iter()
        .map(|c| format!("  #{} {} | {} | {} | {}", c.id, c.name, c.position, c.school, c.summary))
        .collect::<Vec<_>>()
        .join("\n");

    let history_section = if request.recent_picks.is_empty() {
        String::new()
    } else {
        let lines = request
            .recent_picks
            .iter()
            .map(|h| format!("  {} -> {} ({})", h.participant_name, h.candidate_name, h.position))
            .collect::<Vec<_>>()
            .join("\n");
        format!("\nRecent picks:\n{}\n", lines)
    };

    let unmet = if request.unmet_needs.is_empty() {
        "none (all primary needs addressed)".to_string()
    } else {
        join_positions(&request.unmet_needs)
    };

    format!(
        r#"You are the GM of the {team}.

Team needs (priority order): {needs}
Needs still unfilled: {unmet}
Team context: {context}

This is Round {round}, Pick #{pick} overall.
{history_section}
Available players (ranked by talent):
{board}

Consider:
1. Positional need priority - higher-priority needs should be weighted more
2. Player talent/ranking - lower rank numbers = better players
3. Draft value - in early rounds, lean toward elite talent; in later rounds, fill needs
4. What positions other teams have already drafted

Select the best player for your team. Respond with JSON only: {{"candidateId": <number>, "rationale": "<explanation>"}}"#,
        team = request.participant_name,
        needs = join_positions(&request.needs),
        unmet = unmet,
        context = request.context,
        round = request.round,
        pick = request.pick_number,
        history_section = history_section,
        board = board,
    )
}

/// Parse a decision reply into `(candidate_id, rationale)`.
///
/// Tolerates markdown fences and prose around the JSON object. The id must be
/// an integer naming a candidate in `pool`; a missing or blank rationale is
/// replaced with [`DEFAULT_RATIONALE`].
pub fn parse_pick_response(text: &str, pool: &[Candidate]) -> Result<(u32, String), DecisionError> {
    if text.trim().is_empty() {
        return Err(ServiceError::EmptyBody.into());
    }

    let cleaned = strip_code_fences(text);
    let json = extract_json_object(&cleaned)
        .ok_or_else(|| DecisionError::Malformed("no JSON object in response".into()))?;
    let value: serde_json::Value =
        serde_json::from_str(&json).map_err(|e| DecisionError::Malformed(e.to_string()))?;

    let raw_id = value
        .get("candidateId")
        .and_then(|v| v.as_i64())
        .ok_or_else(|| DecisionError::Malformed("missing integer candidateId".into()))?;

    let candidate = u32::try_from(raw_id)
        .ok()
        .and_then(|id| pool.iter().find(|c| c.id == id))
        .ok_or(DecisionError::UnknownCandidate { id: raw_id })?;

    let rationale = value
        .get("rationale")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or(DEFAULT_RATIONALE)
        .to_string();

    Ok((candidate.id, rationale))
}
