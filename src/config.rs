//! Configuration for draftroom, read from `.draftroom/draftroom.toml`.
//!
//! Layered as file → environment → CLI. Every field has a default, so an
//! absent or partial file is fine.
//!
//! # Configuration File Format
//!
//! ```toml
//! [draft]
//! rounds = 4
//! history_window = 7
//!
//! [service]
//! base_url = "https://api.groq.com/openai/v1"
//! model = "moonshotai/kimi-k2-instruct"
//! api_key_env = "GROQ_API_KEY"
//! temperature = 0.7
//! max_tokens = 150
//! grade_temperature = 0.6
//! grade_max_tokens = 600
//! request_timeout_secs = 30
//!
//! [retry]
//! max_attempts = 3
//! delays_ms = [1000, 2000, 4000]
//!
//! [pacing]
//! pre_pick_ms = 500
//! reveal_ms = 2000
//! cooldown_ms = 500
//! grace_ms = 100
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::decision::retry::{DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAYS_MS};
use crate::decision::service::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::decision::{DEFAULT_HISTORY_WINDOW, RetryPolicy, Sampling};
use crate::draft::Pacing;

pub const CONFIG_DIR: &str = ".draftroom";
pub const CONFIG_FILE: &str = "draftroom.toml";

/// Environment variable overriding `[service] model`.
pub const MODEL_ENV: &str = "DRAFTROOM_MODEL";
/// Environment variable overriding `[service] base_url`.
pub const BASE_URL_ENV: &str = "DRAFTROOM_BASE_URL";

/// Shape of the draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftSection {
    /// Rounds per participant
    #[serde(default = "default_rounds")]
    pub rounds: u32,
    /// Number of recent selections shown to the decision service
    #[serde(default = "default_history_window")]
    pub history_window: usize,
}

fn default_rounds() -> u32 {
    4
}

fn default_history_window() -> usize {
    DEFAULT_HISTORY_WINDOW
}

impl Default for DraftSection {
    fn default() -> Self {
        Self {
            rounds: default_rounds(),
            history_window: default_history_window(),
        }
    }
}

/// The OpenAI-compatible decision service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceSection {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Name of the environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_grade_temperature")]
    pub grade_temperature: f64,
    #[serde(default = "default_grade_max_tokens")]
    pub grade_max_tokens: u32,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_api_key_env() -> String {
    "GROQ_API_KEY".to_string()
}

fn default_temperature() -> f64 {
    0.7
}

fn default_max_tokens() -> u32 {
    150
}

fn default_grade_temperature() -> f64 {
    0.6
}

fn default_grade_max_tokens() -> u32 {
    600
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for ServiceSection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            grade_temperature: default_grade_temperature(),
            grade_max_tokens: default_grade_max_tokens(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl ServiceSection {
    pub fn pick_sampling(&self) -> Sampling {
        Sampling {
            temperature: self.temperature as f32,
            max_tokens: self.max_tokens,
        }
    }

    pub fn grade_sampling(&self) -> Sampling {
        Sampling {
            temperature: self.grade_temperature as f32,
            max_tokens: self.grade_max_tokens,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Retry schedule for decision and grading calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrySection {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Wait before attempt 2, 3, ... in milliseconds
    #[serde(default = "default_delays_ms")]
    pub delays_ms: Vec<u64>,
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_delays_ms() -> Vec<u64> {
    DEFAULT_RETRY_DELAYS_MS.to_vec()
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delays_ms: default_delays_ms(),
        }
    }
}

impl RetrySection {
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts,
            self.delays_ms.iter().map(|ms| Duration::from_millis(*ms)).collect(),
        )
    }
}

/// Display pacing in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PacingSection {
    #[serde(default = "default_pre_pick_ms")]
    pub pre_pick_ms: u64,
    #[serde(default = "default_reveal_ms")]
    pub reveal_ms: u64,
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,
    #[serde(default = "default_grace_ms")]
    pub grace_ms: u64,
}

fn default_pre_pick_ms() -> u64 {
    500
}

fn default_reveal_ms() -> u64 {
    2000
}

fn default_cooldown_ms() -> u64 {
    500
}

fn default_grace_ms() -> u64 {
    100
}

impl Default for PacingSection {
    fn default() -> Self {
        Self {
            pre_pick_ms: default_pre_pick_ms(),
            reveal_ms: default_reveal_ms(),
            cooldown_ms: default_cooldown_ms(),
            grace_ms: default_grace_ms(),
        }
    }
}

impl PacingSection {
    pub fn to_pacing(&self) -> Pacing {
        Pacing {
            pre_pick: Duration::from_millis(self.pre_pick_ms),
            reveal: Duration::from_millis(self.reveal_ms),
            cooldown: Duration::from_millis(self.cooldown_ms),
            grace: Duration::from_millis(self.grace_ms),
        }
    }
}

/// Root of `draftroom.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DraftToml {
    #[serde(default)]
    pub draft: DraftSection,
    #[serde(default)]
    pub service: ServiceSection,
    #[serde(default)]
    pub retry: RetrySection,
    #[serde(default)]
    pub pacing: PacingSection,
}

impl DraftToml {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse draftroom.toml")
    }

    /// Load `draftroom.toml` from `config_dir`, or defaults if it doesn't exist.
    pub fn load_or_default(config_dir: &Path) -> Result<Self> {
        let config_path = config_dir.join(CONFIG_FILE);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize draftroom.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Model name (env → file).
    pub fn model(&self) -> String {
        std::env::var(MODEL_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| self.service.model.clone())
    }

    /// Service base URL (env → file).
    pub fn base_url(&self) -> String {
        std::env::var(BASE_URL_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| self.service.base_url.clone())
    }

    /// Validate the configuration and return any warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.draft.rounds == 0 {
            warnings.push("draft.rounds is 0: the draft will complete without any picks".to_string());
        }
        if self.draft.history_window == 0 {
            warnings.push(
                "draft.history_window is 0: the decision service will see no prior picks"
                    .to_string(),
            );
        }

        if !self.service.base_url.starts_with("http://")
            && !self.service.base_url.starts_with("https://")
        {
            warnings.push(format!(
                "Invalid service.base_url '{}': should start with http:// or https://",
                self.service.base_url
            ));
        }
        for (name, value) in [
            ("temperature", self.service.temperature),
            ("grade_temperature", self.service.grade_temperature),
        ] {
            if !(0.0..=2.0).contains(&value) {
                warnings.push(format!(
                    "service.{} = {} is outside the supported range 0.0-2.0",
                    name, value
                ));
            }
        }
        if self.service.request_timeout_secs == 0 {
            warnings.push("service.request_timeout_secs is 0: every request will time out".to_string());
        }

        if self.retry.max_attempts == 0 {
            warnings.push(
                "retry.max_attempts is 0: every decision will use the fallback policy".to_string(),
            );
        }
        if self.retry.max_attempts > 1 && self.retry.delays_ms.is_empty() {
            warnings.push("retry.delays_ms is empty: retries will not back off".to_string());
        }
        if let Some(first) = self.retry.delays_ms.first()
            && self.pacing.cooldown_ms >= *first
        {
            warnings.push(format!(
                "pacing.cooldown_ms ({}) should be shorter than the first retry delay ({})",
                self.pacing.cooldown_ms, first
            ));
        }

        warnings
    }
}

/// Resolved configuration for one invocation.
///
/// Merges settings from:
/// 1. draftroom.toml file
/// 2. Environment variables
/// 3. CLI arguments
#[derive(Debug, Clone)]
pub struct DraftConfig {
    pub project_dir: PathBuf,
    pub config_dir: PathBuf,
    pub toml: DraftToml,
    /// CLI override: never call the decision service
    pub offline: bool,
    /// CLI override: zero all display pacing
    pub no_delay: bool,
    /// CLI override: rounds
    pub cli_rounds: Option<u32>,
}

impl DraftConfig {
    /// Create a new DraftConfig from a project directory.
    pub fn new(project_dir: PathBuf) -> Result<Self> {
        let project_dir = project_dir
            .canonicalize()
            .context("Failed to resolve project directory")?;
        let config_dir = project_dir.join(CONFIG_DIR);
        let toml = DraftToml::load_or_default(&config_dir)?;

        Ok(Self {
            project_dir,
            config_dir,
            toml,
            offline: false,
            no_delay: false,
            cli_rounds: None,
        })
    }

    /// Create DraftConfig with CLI overrides.
    pub fn with_cli_args(
        project_dir: PathBuf,
        offline: bool,
        no_delay: bool,
        rounds: Option<u32>,
    ) -> Result<Self> {
        let mut config = Self::new(project_dir)?;
        config.offline = offline;
        config.no_delay = no_delay;
        config.cli_rounds = rounds;
        Ok(config)
    }

    /// Path to draftroom.toml.
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE)
    }

    /// Rounds (CLI → file → default).
    pub fn rounds(&self) -> u32 {
        self.cli_rounds.unwrap_or(self.toml.draft.rounds)
    }

    pub fn history_window(&self) -> usize {
        self.toml.draft.history_window
    }

    /// Pacing, zeroed (except the preemption grace) under `--no-delay`.
    pub fn pacing(&self) -> Pacing {
        if self.no_delay {
            Pacing {
                grace: Duration::from_millis(self.toml.pacing.grace_ms),
                ..Pacing::instant()
            }
        } else {
            self.toml.pacing.to_pacing()
        }
    }

    /// Retry policy; offline runs make no attempts at all.
    pub fn retry_policy(&self) -> RetryPolicy {
        if self.offline {
            RetryPolicy::none()
        } else {
            self.toml.retry.to_policy()
        }
    }

    pub fn model(&self) -> String {
        self.toml.model()
    }

    pub fn base_url(&self) -> String {
        self.toml.base_url()
    }

    /// Validate configuration and return warnings.
    pub fn validate(&self) -> Vec<String> {
        self.toml.validate()
    }
}
