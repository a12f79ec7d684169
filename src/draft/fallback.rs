//! Deterministic candidate selection used when the decision service cannot answer.
//!
//! Both functions here are pure: identical inputs always produce identical output,
//! which lets [`fallback_pick`] stand in for the external call transparently.

use crate::catalog::{Candidate, Position};
use std::collections::HashSet;
use std::fmt;

/// Result of the fallback policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackPick {
    pub candidate_id: u32,
    pub rationale: String,
    /// The need that drove the choice; `None` for best player available.
    pub matched_need: Option<Position>,
}

/// Choose a candidate without consulting the decision service.
///
/// For each unmet need in priority order, take the best-ranked candidate in
/// `pool` that satisfies it; the first need with a match wins. If no need can be
/// filled, take the best-ranked candidate overall. `pool` must be ordered best
/// first. Returns `None` only for an empty pool.
pub fn fallback_pick(pool: &[Candidate], unmet: &[Position]) -> Option<FallbackPick> {
    for need in unmet {
        if let Some(candidate) = pool.iter().find(|c| c.position.satisfies(*need)) {
            return Some(FallbackPick {
                candidate_id: candidate.id,
                rationale: format!(
                    "Selected {} via fallback logic: best available player at a position of need ({}).",
                    candidate.name, need
                ),
                matched_need: Some(*need),
            });
        }
    }

    pool.first().map(|best| FallbackPick {
        candidate_id: best.id,
        rationale: format!(
            "Selected {} via fallback logic: best player available regardless of position.",
            best.name
        ),
        matched_need: None,
    })
}

/// Why a candidate is suggested to the human.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestionReason {
    Need(Position),
    BestAvailable,
}

impl fmt::Display for SuggestionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Need(position) => write!(f, "{}", position),
            Self::BestAvailable => write!(f, "BPA"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion<'a> {
    pub candidate: &'a Candidate,
    pub reason: SuggestionReason,
}

/// Up to `limit` suggestions for the human's pick.
///
/// The best available candidate at each unmet need (never the same candidate
/// twice), with the overall best available prepended when it is not already
/// among them.
pub fn suggested_picks<'a>(
    pool: &'a [Candidate],
    unmet: &[Position],
    limit: usize,
) -> Vec<Suggestion<'a>> {
    let mut suggestions = Vec::new();
    let mut seen = HashSet::new();

    for need in unmet {
        let found = pool
            .iter()
            .find(|c| !seen.contains(&c.id) && c.position.satisfies(*need));
        if let Some(candidate) = found {
            seen.insert(candidate.id);
            suggestions.push(Suggestion {
                candidate,
                reason: SuggestionReason::Need(*need),
            });
        }
    }

    if let Some(best) = pool.first()
        && !seen.contains(&best.id)
    {
        suggestions.insert(
            0,
            Suggestion {
                candidate: best,
                reason: SuggestionReason::BestAvailable,
            },
        );
    }

    suggestions.truncate(limit);
    suggestions
}
