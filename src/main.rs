use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use draftroom::observability::{LogFormat, init_logging};

mod cmd;

#[derive(Parser)]
#[command(name = "draftroom")]
#[command(version, about = "Mock draft room with LLM-driven general managers")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log format for diagnostics on stderr: pretty or json
    #[arg(long, global = true, default_value = "pretty")]
    pub log_format: LogFormat,

    #[arg(long, global = true)]
    pub project_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a draft
    Run {
        /// Participant id to control (prompted for if omitted)
        #[arg(short, long)]
        team: Option<u32>,

        /// Never call the decision service; every pick uses the fallback policy
        #[arg(long)]
        offline: bool,

        /// Make the human's picks automatically (top suggestion)
        #[arg(long)]
        auto: bool,

        /// Run the non-human picks in batches without reveal delays
        #[arg(long)]
        fast_forward: bool,

        /// Disable all display pacing
        #[arg(long)]
        no_delay: bool,

        /// Grade every class once the draft completes
        #[arg(long)]
        grade: bool,

        /// Override the number of rounds
        #[arg(long)]
        rounds: Option<u32>,
    },
    /// List the participants
    Teams,
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Initialize a default draftroom.toml file
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _ = dotenvy::dotenv();
    init_logging(cli.log_format, cli.verbose);

    let project_dir = match cli.project_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    match &cli.command {
        Commands::Run {
            team,
            offline,
            auto,
            fast_forward,
            no_delay,
            grade,
            rounds,
        } => {
            let options = cmd::RunOptions {
                team: *team,
                offline: *offline,
                auto: *auto,
                fast_forward: *fast_forward,
                no_delay: *no_delay,
                grade: *grade,
                rounds: *rounds,
            };
            cmd::cmd_run(project_dir, options).await?;
        }
        Commands::Teams => cmd::cmd_teams()?,
        Commands::Config { command } => cmd::cmd_config(&project_dir, command.clone())?,
    }

    Ok(())
}
