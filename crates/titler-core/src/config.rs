use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::backoff::BackoffSchedule;
use crate::error::{Result, TitlerError};

/// Root configuration, loaded from `~/.config/arxiv-titler/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TitlerConfig {
    pub api: ApiConfig,
    pub backoff: BackoffConfig,
    pub page: PageConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffConfig {
    pub initial_delay_ms: u64,
    pub stretch_factor: f64,
    pub ceiling_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    /// Class of the element holding the title on landing pages.
    pub title_class: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter used when `RUST_LOG` is unset.
    pub level: String,
}

// ─── Defaults ──────────────────────────────────────────────

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://export.arxiv.org/api/query".to_string(),
            user_agent: concat!("arxiv-titler/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: 20,
        }
    }
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: BackoffSchedule::INITIAL_DELAY.as_millis() as u64,
            stretch_factor: BackoffSchedule::STRETCH_FACTOR,
            ceiling_ms: BackoffSchedule::CEILING.as_millis() as u64,
        }
    }
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            title_class: "title".to_string(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl BackoffConfig {
    /// Build the reassertion schedule, rejecting settings that never terminate.
    pub fn schedule(&self) -> Result<BackoffSchedule> {
        if self.initial_delay_ms == 0 {
            return Err(TitlerError::ConfigError(
                "backoff.initial_delay_ms must be positive".to_string(),
            ));
        }
        if !(self.stretch_factor.is_finite() && self.stretch_factor > 1.0) {
            return Err(TitlerError::ConfigError(format!(
                "backoff.stretch_factor must be greater than 1, got {}",
                self.stretch_factor
            )));
        }
        Ok(BackoffSchedule::new(
            Duration::from_millis(self.initial_delay_ms),
            self.stretch_factor,
            Duration::from_millis(self.ceiling_ms),
        ))
    }
}

// ─── Load / Save ───────────────────────────────────────────

impl TitlerConfig {
    /// Standard config file path: `~/.config/arxiv-titler/config.toml`
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("ARXIV_TITLER_CONFIG") {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("arxiv-titler")
            .join("config.toml")
    }

    /// Load config from disk, falling back to defaults if file doesn't exist.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let toml_str = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }
}
