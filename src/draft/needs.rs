//! Unmet-requirement resolution for a participant.

use crate::catalog::{Participant, Position};
use crate::draft::Selection;

/// Requirements of `participant` not yet covered by its own selections,
/// in the participant's priority order.
///
/// A requirement is covered when any of the participant's picks satisfies it
/// under [`Position::satisfies`] (so an `OL` need is covered by an `OT` or `OG`).
pub fn remaining_needs(participant: &Participant, selections: &[Selection]) -> Vec<Position> {
    let drafted: Vec<Position> = selections
        .iter()
        .filter(|s| s.participant_id == participant.id)
        .map(|s| s.candidate.position)
        .collect();

    participant
        .needs
        .iter()
        .copied()
        .filter(|need| !drafted.iter().any(|p| p.satisfies(*need)))
        .collect()
}
