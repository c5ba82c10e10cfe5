use crate::error::ConfigError;
use crate::page::surface::SuppressionMode;
use directories::UserDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

// ── Top-level config ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Workspace directory - computed from home, not serialized
    #[serde(skip)]
    pub workspace_dir: PathBuf,
    /// Path to config.toml - computed from home, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(default)]
    pub analysis: AnalysisConfig,

    #[serde(default)]
    pub agent: AgentConfig,

    #[serde(default)]
    pub retention: RetentionConfig,

    #[serde(default)]
    pub store: StoreConfig,
}

// ── Analysis service ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMode {
    /// Local summarization endpoint (`GET /summary`).
    #[default]
    Summary,
    /// Transcript fetch + chat-completions proxy.
    Chat,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Base URL of the analysis server (default: <http://127.0.0.1:5000>)
    #[serde(default = "default_analysis_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub mode: AnalysisMode,
    /// Chat-completions proxy endpoint (chat mode only)
    #[serde(default)]
    pub proxy_url: Option<String>,
    /// Bearer token for the proxy (chat mode only)
    #[serde(default)]
    pub api_key: Option<String>,
    /// Model name forwarded to the proxy (chat mode only)
    #[serde(default)]
    pub model: Option<String>,
    /// Maximum summary length requested in summary mode
    #[serde(default = "default_max_length")]
    pub max_length: u32,
    /// Analysis call deadline. Content analysis is slow; keep this generous.
    #[serde(default = "default_analysis_timeout_secs")]
    pub timeout_secs: u64,
    /// Health probe deadline
    #[serde(default = "default_health_timeout_secs")]
    pub health_timeout_secs: u64,
}

fn default_analysis_base_url() -> String {
    "http://127.0.0.1:5000".into()
}

const fn default_max_length() -> u32 {
    150
}

const fn default_analysis_timeout_secs() -> u64 {
    60
}

const fn default_health_timeout_secs() -> u64 {
    5
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            base_url: default_analysis_base_url(),
            mode: AnalysisMode::default(),
            proxy_url: None,
            api_key: None,
            model: None,
            max_length: default_max_length(),
            timeout_secs: default_analysis_timeout_secs(),
            health_timeout_secs: default_health_timeout_secs(),
        }
    }
}

// ── Page agent ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Content-identifier poll interval. Capped at 1000ms so SPA navigation
    /// is never detected later than one second after it happens.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Supervisory re-assertion interval for overlay and playback suppression
    #[serde(default = "default_supervision_interval_ms")]
    pub supervision_interval_ms: u64,
    #[serde(default)]
    pub suppression: SuppressionMode,
}

const fn default_poll_interval_ms() -> u64 {
    1000
}

const fn default_supervision_interval_ms() -> u64 {
    2000
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            supervision_interval_ms: default_supervision_interval_ms(),
            suppression: SuppressionMode::default(),
        }
    }
}

// ── Retention housekeeping ────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionConfig {
    /// Maximum approval records kept by housekeeping
    #[serde(default = "default_retention_cap")]
    pub cap: usize,
    /// Minutes between housekeeping runs (default: daily)
    #[serde(default = "default_retention_interval_minutes")]
    pub interval_minutes: u64,
}

const fn default_retention_cap() -> usize {
    100
}

const fn default_retention_interval_minutes() -> u64 {
    60 * 24
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            cap: default_retention_cap(),
            interval_minutes: default_retention_interval_minutes(),
        }
    }
}

// ── Approval store ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Backend: "sqlite" (durable, default) or "memory" (ephemeral)
    #[serde(default = "default_store_backend")]
    pub backend: String,
}

fn default_store_backend() -> String {
    "sqlite".into()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
        }
    }
}

// ── Load / init / validate ────────────────────────────────────────

impl Config {
    /// Load config from the workspace, creating a default file on first run.
    pub fn load_or_init() -> Result<Self, ConfigError> {
        let user_dirs = UserDirs::new()
            .ok_or_else(|| ConfigError::Load("could not determine home directory".into()))?;
        let workspace_dir = user_dirs.home_dir().join(".viewguard");
        Self::load_from_workspace(&workspace_dir)
    }

    /// Load from an explicit workspace directory (tests use a tempdir here).
    pub fn load_from_workspace(workspace_dir: &Path) -> Result<Self, ConfigError> {
        fs::create_dir_all(workspace_dir)?;
        let config_path = workspace_dir.join("config.toml");

        let mut config: Self = if config_path.exists() {
            let raw = fs::read_to_string(&config_path)?;
            toml::from_str(&raw).map_err(|e| ConfigError::Load(e.to_string()))?
        } else {
            let config = Self::default();
            let raw = toml::to_string_pretty(&config)
                .map_err(|e| ConfigError::Load(e.to_string()))?;
            fs::write(&config_path, raw)?;
            config
        };

        config.workspace_dir = workspace_dir.to_path_buf();
        config.config_path = config_path;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retention.cap == 0 {
            return Err(ConfigError::Validation(
                "retention.cap must be at least 1".into(),
            ));
        }
        if self.agent.poll_interval_ms == 0 || self.agent.poll_interval_ms > 1000 {
            return Err(ConfigError::Validation(
                "agent.poll_interval_ms must be in 1..=1000".into(),
            ));
        }
        if self.analysis.mode == AnalysisMode::Chat
            && (self.analysis.proxy_url.is_none()
                || self.analysis.api_key.is_none()
                || self.analysis.model.is_none())
        {
            return Err(ConfigError::Validation(
                "chat mode requires analysis.proxy_url, analysis.api_key and analysis.model".into(),
            ));
        }
        Ok(())
    }

    pub fn store_db_path(&self) -> PathBuf {
        self.workspace_dir.join("approvals.db")
    }
}
