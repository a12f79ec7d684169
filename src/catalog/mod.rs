//! Static reference data for a draft: the candidate board and the participants.
//!
//! A [`Catalog`] is loaded once per session and never mutated. Candidates are
//! kept in rank order so any pool derived from them is "best talent first".

mod data;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Requirement categories a participant can seek and a candidate can fill.
///
/// `Ol` is the combined offensive-line requirement: it is satisfied by either
/// an `Ot` or an `Og` candidate (see [`Position::satisfies`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Position {
    Qb,
    Wr,
    Ot,
    Edge,
    Cb,
    Dt,
    S,
    Lb,
    Te,
    Rb,
    Og,
    Ol,
}

impl Position {
    /// Whether a candidate at this position fills `requirement`.
    pub fn satisfies(self, requirement: Position) -> bool {
        match requirement {
            Position::Ol => matches!(self, Position::Ot | Position::Og),
            other => self == other,
        }
    }

    /// Short position code as printed on the board (e.g. `"EDGE"`).
    pub fn code(self) -> &'static str {
        match self {
            Position::Qb => "QB",
            Position::Wr => "WR",
            Position::Ot => "OT",
            Position::Edge => "EDGE",
            Position::Cb => "CB",
            Position::Dt => "DT",
            Position::S => "S",
            Position::Lb => "LB",
            Position::Te => "TE",
            Position::Rb => "RB",
            Position::Og => "OG",
            Position::Ol => "OL",
        }
    }

    pub fn full_name(self) -> &'static str {
        match self {
            Position::Qb => "Quarterback",
            Position::Wr => "Wide Receiver",
            Position::Ot => "Offensive Tackle",
            Position::Edge => "Edge Rusher",
            Position::Cb => "Cornerback",
            Position::Dt => "Defensive Tackle",
            Position::S => "Safety",
            Position::Lb => "Linebacker",
            Position::Te => "Tight End",
            Position::Rb => "Running Back",
            Position::Og => "Offensive Guard",
            Position::Ol => "Offensive Line",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl std::str::FromStr for Position {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "QB" => Ok(Position::Qb),
            "WR" => Ok(Position::Wr),
            "OT" => Ok(Position::Ot),
            "EDGE" => Ok(Position::Edge),
            "CB" => Ok(Position::Cb),
            "DT" => Ok(Position::Dt),
            "S" => Ok(Position::S),
            "LB" => Ok(Position::Lb),
            "TE" => Ok(Position::Te),
            "RB" => Ok(Position::Rb),
            "OG" => Ok(Position::Og),
            "OL" => Ok(Position::Ol),
            _ => anyhow::bail!("Invalid position '{}'", s),
        }
    }
}

/// An item on the board. `id` doubles as the talent rank: lower is better.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: u32,
    pub name: String,
    pub position: Position,
    pub school: String,
    pub summary: String,
}

/// A turn-taking team. `needs` is in priority order, highest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: u32,
    pub name: String,
    pub abbreviation: String,
    pub needs: Vec<Position>,
    pub context: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    candidates: Vec<Candidate>,
    participants: Vec<Participant>,
}

impl Catalog {
    /// Build a catalog, sorting candidates by rank and participants by id.
    pub fn new(mut candidates: Vec<Candidate>, mut participants: Vec<Participant>) -> Self {
        candidates.sort_by_key(|c| c.id);
        participants.sort_by_key(|p| p.id);
        Self {
            candidates,
            participants,
        }
    }

    /// The bundled seven-team, thirty-prospect board.
    pub fn builtin() -> Self {
        Self::new(data::candidates(), data::participants())
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn participant_count(&self) -> u32 {
        self.participants.len() as u32
    }

    pub fn participant(&self, id: u32) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }

    pub fn candidate(&self, id: u32) -> Option<&Candidate> {
        self.candidates.iter().find(|c| c.id == id)
    }

    /// Check structural assumptions the draft engine relies on.
    ///
    /// Participant ids must be exactly `1..=N` because turn order is derived
    /// from the pick index.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.participants.is_empty() {
            anyhow::bail!("Catalog has no participants");
        }
        for (idx, participant) in self.participants.iter().enumerate() {
            let expected = idx as u32 + 1;
            if participant.id != expected {
                anyhow::bail!(
                    "Participant ids must be contiguous from 1: expected {}, found {} ({})",
                    expected,
                    participant.id,
                    participant.name
                );
            }
        }
        let mut seen = HashSet::new();
        for candidate in &self.candidates {
            if !seen.insert(candidate.id) {
                anyhow::bail!("Duplicate candidate id {}", candidate.id);
            }
        }
        Ok(())
    }
}
