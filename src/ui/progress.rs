use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use crate::catalog::{Candidate, Catalog};
use crate::draft::{DecisionSource, FastForwardReport, Selection, SessionState, Suggestion};
use crate::grade::GradeReport;
use crate::ui::board;
use crate::ui::icons::{CHECK, CLOCK, CROSS, FAST_FORWARD, TROPHY, WARN};

/// Terminal UI for a draft run.
///
/// A single spinner shows while a decision is outstanding; everything else is
/// printed above it through the bar so lines never tear.
pub struct DraftUI {
    spinner: Mutex<ProgressBar>,
    quiet: bool,
}

impl DraftUI {
    /// `quiet` suppresses the spinner and rationale lines (used for
    /// non-interactive runs).
    pub fn new(quiet: bool) -> Self {
        Self {
            spinner: Mutex::new(ProgressBar::hidden()),
            quiet,
        }
    }

    fn bar(&self) -> ProgressBar {
        self.spinner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Print above the spinner, or plainly when there is none.
    fn print_line(&self, msg: impl AsRef<str>) {
        self.bar().suspend(|| println!("{}", msg.as_ref()));
    }

    pub fn header(&self, title: &str) {
        self.print_line("");
        self.print_line(format!("{}", style(title).bold().underlined()));
    }

    pub fn on_the_clock(&self, state: &SessionState) {
        if let Some(line) = board::format_on_the_clock(state) {
            self.print_line("");
            self.print_line(format!("{}{}", CLOCK, line));
        }
    }

    /// Start a fresh spinner for an outstanding decision.
    pub fn deciding(&self, team: &str) {
        let bar = if self.quiet {
            ProgressBar::hidden()
        } else {
            let bar = ProgressBar::new_spinner();
            bar.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner} {msg} {elapsed:.dim}")
                    .expect("progress bar template is a valid static string"),
            );
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        };
        bar.set_message(format!("{} is on the clock...", style(team).cyan()));
        let previous = std::mem::replace(
            &mut *self.spinner.lock().unwrap_or_else(PoisonError::into_inner),
            bar,
        );
        previous.finish_and_clear();
    }

    pub fn reveal(&self, team: &str, candidate: &Candidate, source: DecisionSource) {
        let how = match source {
            DecisionSource::Fallback => style("fallback").yellow().to_string(),
            _ => style("decided").green().to_string(),
        };
        self.bar().set_message(format!(
            "{} select {} ({}, {}) [{}]",
            style(team).cyan(),
            style(&candidate.name).bold(),
            candidate.position,
            candidate.school,
            how
        ));
    }

    pub fn committed(&self, selection: &Selection, catalog: &Catalog) {
        self.bar().finish_and_clear();
        let line = board::format_selection(selection, catalog);
        if self.quiet {
            // First line only.
            if let Some(first) = line.lines().next() {
                self.print_line(first);
            }
        } else {
            self.print_line(line);
        }
    }

    pub fn cancelled(&self, sequence: u32) {
        self.bar().finish_and_clear();
        self.print_line(format!(
            "{}Pick #{} cancelled",
            WARN,
            style(sequence).yellow()
        ));
    }

    pub fn fast_forward_started(&self, cursor: u32) {
        self.print_line(format!(
            "{}Fast-forwarding from pick #{}",
            FAST_FORWARD,
            cursor + 1
        ));
    }

    pub fn fast_forward_finished(&self, report: &FastForwardReport) {
        self.bar().finish_and_clear();
        let status = if report.cancelled {
            style("cancelled").yellow().to_string()
        } else {
            style("done").green().to_string()
        };
        self.print_line(format!(
            "{}Fast-forward {}: {} picks made",
            FAST_FORWARD,
            status,
            report.selections.len()
        ));
    }

    pub fn suggestions(&self, suggestions: &[Suggestion<'_>]) {
        self.print_line(format!("{}", style("Suggested for your needs:").dim()));
        self.print_line(board::format_suggestions(suggestions));
    }

    pub fn warn(&self, msg: &str) {
        self.print_line(format!("{}{}", WARN, style(msg).yellow()));
    }

    pub fn error(&self, msg: &str) {
        self.bar().finish_and_clear();
        self.print_line(format!("{}{}", CROSS, style(msg).red()));
    }

    pub fn draft_complete(&self, state: &SessionState) {
        self.bar().finish_and_clear();
        let fallbacks = state.selections.iter().filter(|s| s.is_fallback()).count();
        self.print_line("");
        self.print_line(format!(
            "{}Draft complete: {} picks ({} by fallback)",
            CHECK,
            state.selections.len(),
            fallbacks
        ));
        self.header("Draft classes");
        self.print_line(board::format_summary(state));
    }

    pub fn grades(&self, report: &GradeReport) {
        self.bar().finish_and_clear();
        self.header(&format!("{}Draft grades", TROPHY));
        self.print_line(board::format_grades(report));
    }
}
