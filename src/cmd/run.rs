//! Draft execution: `draftroom run`.

use anyhow::{Context, Result, bail};
use dialoguer::{Select, theme::ColorfulTheme};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use draftroom::catalog::Catalog;
use draftroom::config::DraftConfig;
use draftroom::decision::{
    ChatCompletionsService, DecisionClient, DecisionService, OfflineService, RetryPolicy,
};
use draftroom::draft::{
    DraftNotice, DraftPhase, DraftSession, FastForward, PickOrchestrator, PickOutcome,
    SessionState, remaining_needs, suggested_picks,
};
use draftroom::errors::ServiceError;
use draftroom::grade::{GradeRequest, GradingClient};
use draftroom::ui::DraftUI;
use draftroom::ui::board::{format_candidate, format_participants};

const BOARD_LIMIT: usize = 10;
const SUGGESTION_LIMIT: usize = 3;

/// Flags of the `run` subcommand.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub team: Option<u32>,
    pub offline: bool,
    pub auto: bool,
    pub fast_forward: bool,
    pub no_delay: bool,
    pub grade: bool,
    pub rounds: Option<u32>,
}

pub async fn cmd_run(project_dir: PathBuf, options: RunOptions) -> Result<()> {
    let draft_id = Uuid::new_v4();
    let span = tracing::info_span!("draft", %draft_id);
    run_draft(project_dir, options).instrument(span).await
}

async fn run_draft(project_dir: PathBuf, options: RunOptions) -> Result<()> {
    let config = DraftConfig::with_cli_args(
        project_dir,
        options.offline,
        options.no_delay,
        options.rounds,
    )?;
    let ui = DraftUI::new(options.auto);
    for warning in config.validate() {
        ui.warn(&format!("config: {}", warning));
    }

    let catalog = Arc::new(Catalog::builtin());
    catalog.validate()?;

    let (service, retry) = build_service(&config, &ui)?;
    let client = DecisionClient::new(
        service.clone(),
        retry.clone(),
        config.toml.service.pick_sampling(),
    );

    let session = DraftSession::new(SessionState::new(catalog.clone(), config.rounds()));
    let team = match options.team {
        Some(id) => id,
        None if options.auto => bail!("--team is required with --auto"),
        None => prompt_team(&catalog)?,
    };
    session
        .choose_participant(team)
        .with_context(|| format!("Cannot take control of participant {}", team))?;

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.cancel();
        }
    });

    let mut notices = session.subscribe();
    let pacing = config.pacing();
    let single = PickOrchestrator::new(
        session.clone(),
        client.clone(),
        pacing,
        config.history_window(),
    );
    let batch = FastForward::new(session.clone(), client, pacing, config.history_window());

    let state = session.snapshot();
    if let Some(you) = catalog.participant(team) {
        ui.header(&format!(
            "Mock draft: {} rounds, {} picks, you are the {}",
            state.rounds(),
            state.total_picks(),
            you.name
        ));
    }
    tracing::info!(team, rounds = state.rounds(), offline = options.offline, "draft started");

    loop {
        let state = session.snapshot();
        if cancel.is_cancelled() || state.phase != DraftPhase::Drafting {
            break;
        }

        if state.is_human_turn() {
            ui.on_the_clock(&state);
            let candidate_id = if options.auto {
                auto_pick(&state)
            } else {
                prompt_pick(&state, &ui)?
            };
            if let Some(id) = candidate_id {
                session.make_human_pick(id, None)?;
            }
            drain(&mut notices, &ui, &catalog);
        } else if options.fast_forward {
            ui.fast_forward_started(state.cursor);
            let report = drive(batch.run(&cancel), &mut notices, &ui, &session).await?;
            ui.fast_forward_finished(&report);
        } else {
            match drive(single.run(&cancel), &mut notices, &ui, &session).await {
                Ok(PickOutcome::Committed(_)) => {}
                Ok(PickOutcome::Cancelled) => break,
                Err(err) => {
                    ui.error(&err.to_string());
                    return Err(err.into());
                }
            }
        }
    }

    let state = session.snapshot();
    if !state.is_complete() {
        ui.warn(&format!(
            "Draft stopped at pick #{} of {}",
            state.cursor + 1,
            state.total_picks()
        ));
        return Ok(());
    }

    ui.draft_complete(&state);
    tracing::info!(
        picks = state.selections.len(),
        fallbacks = state.selections.iter().filter(|s| s.is_fallback()).count(),
        "draft complete"
    );

    if options.grade {
        let grader = GradingClient::new(service, retry, config.toml.service.grade_sampling());
        ui.deciding("The grading panel");
        let report = grader.grade(&GradeRequest::from_state(&state)).await?;
        ui.grades(&report);
    }

    Ok(())
}

/// The decision service and the retry schedule to use with it.
///
/// A missing API key downgrades the run to offline instead of failing it.
fn build_service(
    config: &DraftConfig,
    ui: &DraftUI,
) -> Result<(Arc<dyn DecisionService>, RetryPolicy)> {
    let offline: Arc<dyn DecisionService> = Arc::new(OfflineService);
    if config.offline {
        return Ok((offline, RetryPolicy::none()));
    }

    let service = &config.toml.service;
    match ChatCompletionsService::from_env(
        &config.base_url(),
        &config.model(),
        &service.api_key_env,
        service.request_timeout(),
    ) {
        Ok(client) => {
            tracing::debug!(model = client.model(), "decision service ready");
            let service: Arc<dyn DecisionService> = Arc::new(client);
            Ok((service, config.retry_policy()))
        }
        Err(ServiceError::MissingApiKey { var }) => {
            ui.warn(&format!(
                "{} is not set; every pick will use the fallback policy",
                var
            ));
            Ok((offline, RetryPolicy::none()))
        }
        Err(err) => Err(err).context("Failed to build decision service client"),
    }
}

/// Run `fut` while forwarding session notices to the UI.
async fn drive<F, T>(
    fut: F,
    notices: &mut broadcast::Receiver<DraftNotice>,
    ui: &DraftUI,
    session: &DraftSession,
) -> T
where
    F: Future<Output = T>,
{
    let catalog = session.snapshot().catalog().clone();
    tokio::pin!(fut);
    loop {
        tokio::select! {
            out = &mut fut => {
                drain(notices, ui, &catalog);
                return out;
            }
            Ok(notice) = notices.recv() => show(notice, ui, session, &catalog),
        }
    }
}

fn drain(notices: &mut broadcast::Receiver<DraftNotice>, ui: &DraftUI, catalog: &Catalog) {
    loop {
        match notices.try_recv() {
            Ok(DraftNotice::Committed(selection)) => ui.committed(&selection, catalog),
            Ok(DraftNotice::Cancelled { sequence }) => ui.cancelled(sequence),
            Ok(_) => {}
            Err(TryRecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "notice receiver lagged");
            }
            Err(_) => break,
        }
    }
}

fn show(notice: DraftNotice, ui: &DraftUI, session: &DraftSession, catalog: &Catalog) {
    match notice {
        DraftNotice::Deciding { participant_id, .. } => {
            ui.on_the_clock(&session.snapshot());
            if let Some(p) = catalog.participant(participant_id) {
                ui.deciding(&p.name);
            }
        }
        DraftNotice::Revealing {
            participant_id,
            candidate,
            source,
            ..
        } => {
            if let Some(p) = catalog.participant(participant_id) {
                ui.reveal(&p.name, &candidate, source);
            }
        }
        DraftNotice::Committed(selection) => ui.committed(&selection, catalog),
        DraftNotice::Cancelled { sequence } => ui.cancelled(sequence),
        DraftNotice::FastForwardFinished { .. } => {}
    }
}

fn prompt_team(catalog: &Catalog) -> Result<u32> {
    println!("{}", format_participants(catalog));
    let items: Vec<String> = catalog
        .participants()
        .iter()
        .map(|p| format!("{} ({})", p.name, p.abbreviation))
        .collect();
    let index = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Which team will you run?")
        .items(&items)
        .default(0)
        .interact()
        .context("Failed to read team selection; pass --team for non-interactive runs")?;
    Ok(catalog.participants()[index].id)
}

/// Top suggestion for the human, or the best available when nothing fits.
fn auto_pick(state: &SessionState) -> Option<u32> {
    let unmet = state
        .acting_participant()
        .map(|p| remaining_needs(p, &state.selections))
        .unwrap_or_default();
    suggested_picks(&state.pool, &unmet, SUGGESTION_LIMIT)
        .first()
        .map(|s| s.candidate.id)
        .or_else(|| state.pool.first().map(|c| c.id))
}

fn prompt_pick(state: &SessionState, ui: &DraftUI) -> Result<Option<u32>> {
    let Some(acting) = state.acting_participant() else {
        return Ok(None);
    };
    let unmet = remaining_needs(acting, &state.selections);
    let suggestions = suggested_picks(&state.pool, &unmet, SUGGESTION_LIMIT);

    let mut ids = Vec::new();
    let mut items = Vec::new();
    for s in &suggestions {
        ids.push(s.candidate.id);
        items.push(format!("{}  [{}]", format_candidate(s.candidate), s.reason));
    }
    for candidate in state.pool.iter().take(BOARD_LIMIT) {
        if !ids.contains(&candidate.id) {
            ids.push(candidate.id);
            items.push(format_candidate(candidate));
        }
    }
    if ids.is_empty() {
        return Ok(None);
    }
    if !suggestions.is_empty() {
        ui.suggestions(&suggestions);
    }

    let index = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Your pick")
        .items(&items)
        .default(0)
        .interact()
        .context("Failed to read pick; pass --auto for non-interactive runs")?;
    Ok(Some(ids[index]))
}
