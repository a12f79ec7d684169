//! Configuration view and validation commands: `draftroom config`.

use anyhow::Result;

use super::super::ConfigCommands;

fn print_sections(toml: &draftroom::config::DraftToml) {
    println!("[draft]");
    println!("  rounds = {}", toml.draft.rounds);
    println!("  history_window = {}", toml.draft.history_window);
    println!();

    println!("[service]");
    println!("  base_url = \"{}\"", toml.service.base_url);
    println!("  model = \"{}\"", toml.service.model);
    println!("  api_key_env = \"{}\"", toml.service.api_key_env);
    println!("  temperature = {}", toml.service.temperature);
    println!("  max_tokens = {}", toml.service.max_tokens);
    println!("  grade_temperature = {}", toml.service.grade_temperature);
    println!("  grade_max_tokens = {}", toml.service.grade_max_tokens);
    println!(
        "  request_timeout_secs = {}",
        toml.service.request_timeout_secs
    );
    println!();

    println!("[retry]");
    println!("  max_attempts = {}", toml.retry.max_attempts);
    println!("  delays_ms = {:?}", toml.retry.delays_ms);
    println!();

    println!("[pacing]");
    println!("  pre_pick_ms = {}", toml.pacing.pre_pick_ms);
    println!("  reveal_ms = {}", toml.pacing.reveal_ms);
    println!("  cooldown_ms = {}", toml.pacing.cooldown_ms);
    println!("  grace_ms = {}", toml.pacing.grace_ms);
    println!();
}

pub fn cmd_config(project_dir: &std::path::Path, command: Option<ConfigCommands>) -> Result<()> {
    use draftroom::config::{CONFIG_DIR, CONFIG_FILE, DraftConfig, DraftToml};

    let config_dir = project_dir.join(CONFIG_DIR);
    let config_path = config_dir.join(CONFIG_FILE);

    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("Draftroom Configuration");
            println!("=======================");
            println!();

            if config_path.exists() {
                println!("Config file: {}", config_path.display());
                println!();
                print_sections(&DraftToml::load(&config_path)?);
            } else {
                println!("No draftroom.toml found at {}", config_path.display());
                println!();
                println!("Using default configuration:");
                print_sections(&DraftToml::default());
                println!("Run 'draftroom config init' to create a draftroom.toml file.");
                println!();
            }

            // Effective values (including env overrides)
            let config = DraftConfig::new(project_dir.to_path_buf())?;
            let key_set = std::env::var(&config.toml.service.api_key_env)
                .map(|k| !k.trim().is_empty())
                .unwrap_or(false);
            println!("Effective values (with env overrides):");
            println!("  model = \"{}\"", config.model());
            println!("  base_url = \"{}\"", config.base_url());
            println!(
                "  {} = {}",
                config.toml.service.api_key_env,
                if key_set { "set" } else { "not set (offline)" }
            );
            println!();
        }
        Some(ConfigCommands::Validate) => {
            println!();
            println!("Validating configuration...");
            println!();

            if !config_path.exists() {
                println!("No draftroom.toml found. Using defaults (valid).");
                return Ok(());
            }

            let toml = DraftToml::load(&config_path)?;
            let warnings = toml.validate();

            if warnings.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("Configuration warnings:");
                for warning in warnings {
                    println!("  - {}", warning);
                }
            }
            println!();
        }
        Some(ConfigCommands::Init) => {
            if config_path.exists() {
                println!("draftroom.toml already exists at {}", config_path.display());
                println!("Delete it first if you want to recreate it.");
                return Ok(());
            }

            if !config_dir.exists() {
                std::fs::create_dir_all(&config_dir)?;
            }

            DraftToml::default().save(&config_path)?;

            println!("Created draftroom.toml at {}", config_path.display());
            println!();
            println!("You can now customize:");
            println!("  - [draft] rounds, history_window");
            println!("  - [service] base_url, model, api_key_env, sampling");
            println!("  - [retry] max_attempts, delays_ms");
            println!("  - [pacing] pre_pick_ms, reveal_ms, cooldown_ms, grace_ms");
            println!();
        }
    }

    Ok(())
}
