//! Plain-text rendering of draft state. Every function returns a `String` so
//! callers decide where it goes.

use console::style;

use crate::catalog::{Candidate, Catalog, Participant};
use crate::draft::{DecisionSource, Selection, SessionState, Suggestion};
use crate::grade::GradeReport;
use crate::ui::icons::{FALLBACK, HUMAN, PICK};

const WRAP_WIDTH: usize = 76;

fn wrap_indented(text: &str, indent: &str) -> String {
    let options = textwrap::Options::new(WRAP_WIDTH)
        .initial_indent(indent)
        .subsequent_indent(indent);
    textwrap::fill(text, options)
}

fn needs_list(participant: &Participant) -> String {
    participant
        .needs
        .iter()
        .map(|p| p.code())
        .collect::<Vec<_>>()
        .join(", ")
}

/// One row per participant: id, abbreviation, name, needs.
pub fn format_participants(catalog: &Catalog) -> String {
    catalog
        .participants()
        .iter()
        .map(|p| {
            format!(
                "{:>2}. {:<4} {:<24} needs: {}",
                p.id,
                p.abbreviation,
                p.name,
                needs_list(p)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_candidate(candidate: &Candidate) -> String {
    format!(
        "#{:<2} {:<22} {:<4} {}",
        candidate.id, candidate.name, candidate.position, candidate.school
    )
}

/// Top `limit` of the remaining pool.
pub fn format_board(pool: &[Candidate], limit: usize) -> String {
    pool.iter()
        .take(limit)
        .map(|c| format!("  {}", format_candidate(c)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Header for the pick about to be made.
pub fn format_on_the_clock(state: &SessionState) -> Option<String> {
    let acting = state.acting_participant()?;
    let marker = if state.is_human_turn() {
        format!(" {}", style("(you)").green().bold())
    } else {
        String::new()
    };
    Some(format!(
        "Round {}, Pick #{}: {}{}  [needs: {}]",
        state.current_round(),
        state.cursor + 1,
        style(&acting.name).bold(),
        marker,
        needs_list(acting)
    ))
}

pub fn format_suggestions(suggestions: &[Suggestion<'_>]) -> String {
    suggestions
        .iter()
        .map(|s| format!("  {}  ({})", format_candidate(s.candidate), s.reason))
        .collect::<Vec<_>>()
        .join("\n")
}

fn source_marker(source: DecisionSource) -> String {
    match source {
        DecisionSource::Human => HUMAN.to_string(),
        DecisionSource::Service => PICK.to_string(),
        DecisionSource::Fallback => format!("{}", FALLBACK),
    }
}

/// One committed selection, with its rationale wrapped underneath.
pub fn format_selection(selection: &Selection, catalog: &Catalog) -> String {
    let team = catalog
        .participant(selection.participant_id)
        .map(|p| p.abbreviation.as_str())
        .unwrap_or("?");
    let mut line = format!(
        "{}{:>2}. {:<4} {}",
        source_marker(selection.source),
        selection.sequence,
        team,
        format_candidate(&selection.candidate)
    );
    if selection.is_fallback() {
        line.push_str(&format!(" {}", style("(fallback)").yellow()));
    }
    if let Some(rationale) = &selection.rationale {
        line.push('\n');
        line.push_str(&wrap_indented(rationale, "      "));
    }
    line
}

/// Every participant's class, in pick order.
pub fn format_summary(state: &SessionState) -> String {
    state
        .catalog()
        .participants()
        .iter()
        .map(|p| {
            let picks = state
                .selections_for(p.id)
                .map(|s| {
                    format!(
                        "  R{}: {} ({}, #{})",
                        s.round, s.candidate.name, s.candidate.position, s.candidate.id
                    )
                })
                .collect::<Vec<_>>();
            let body = if picks.is_empty() {
                "  (no picks)".to_string()
            } else {
                picks.join("\n")
            };
            format!("{}\n{}", style(&p.name).bold(), body)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn format_grades(report: &GradeReport) -> String {
    let mut out = report
        .grades
        .iter()
        .map(|g| {
            format!(
                "{:<3} {}\n{}",
                style(&g.grade).cyan().bold(),
                g.team_name,
                wrap_indented(&g.analysis, "    ")
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    if report.is_fallback() {
        out.push_str(&format!(
            "\n{}",
            style("(grades computed without the grading service)").dim()
        ));
    }
    out
}
