use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{CadenceError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,
    pub runner: RunnerConfig,
    pub task: TaskConfig,
    pub monitor: MonitorConfig,
}

/// When the next cycle becomes due
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CadenceMode {
    /// Interval counted from the end of the previous task
    #[default]
    AfterCompletion,
    /// Interval counted from the previous scheduled start (no drift)
    FixedRate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub interval_secs: u64,
    pub mode: CadenceMode,
    pub max_cycles: Option<u64>,
    /// 0 disables the limit
    pub max_consecutive_launch_failures: u32,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            interval_secs: 300,
            mode: CadenceMode::AfterCompletion,
            max_cycles: None,
            max_consecutive_launch_failures: 5,
        }
    }
}

impl RunnerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn launch_failure_limit(&self) -> Option<u32> {
        match self.max_consecutive_launch_failures {
            0 => None,
            n => Some(n),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskConfig {
    /// Program followed by its arguments
    pub command: Vec<String>,
    /// Shell command line; takes precedence over `command`
    pub shell: Option<String>,
    pub working_dir: Option<PathBuf>,
    pub env: BTreeMap<String, String>,
}

impl TaskConfig {
    pub fn is_empty(&self) -> bool {
        self.command.is_empty() && self.shell.as_deref().is_none_or(|s| s.trim().is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Relative OI change that triggers an alert (0.05 = 5%)
    pub oi_change_threshold: f64,
    /// Minimum notional value (USDT) for a symbol to be tracked
    pub min_oi_usdt: f64,
    pub history_file: PathBuf,
    pub feishu_webhook: Option<String>,
    pub max_card_lines: usize,
    pub request_timeout_ms: u64,
    /// JSON endpoint to fetch when no payload file is given
    pub payload_url: Option<String>,
    pub capture_timeout_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            oi_change_threshold: 0.05,
            min_oi_usdt: 0.0,
            history_file: PathBuf::from("history_oi.json"),
            feishu_webhook: None,
            max_card_lines: 20,
            request_timeout_ms: 10000,
            payload_url: None,
            capture_timeout_ms: 50000,
        }
    }
}

impl MonitorConfig {
    /// Webhook from config, falling back to `FEISHU_WEBHOOK`
    pub fn webhook(&self) -> Option<String> {
        self.feishu_webhook
            .clone()
            .filter(|w| !w.trim().is_empty())
            .or_else(|| std::env::var("FEISHU_WEBHOOK").ok().filter(|w| !w.trim().is_empty()))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            runner: RunnerConfig::default(),
            task: TaskConfig::default(),
            monitor: MonitorConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, it must load
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let project_name = env!("CARGO_PKG_NAME");

        // Try primary location: ~/.config/<project>/<project>.yml
        if let Some(config_dir) = dirs::config_dir() {
            let primary_config = config_dir.join(project_name).join(format!("{}.yml", project_name));
            if primary_config.exists() {
                match Self::load_from_file(&primary_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", primary_config.display(), e);
                    }
                }
            }
        }

        // Try fallback location: ./<project>.yml
        let fallback_config = PathBuf::from(format!("{}.yml", project_name));
        if fallback_config.exists() {
            match Self::load_from_file(&fallback_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", fallback_config.display(), e);
                }
            }
        }

        // No config file found, use defaults
        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let config = Self::from_yaml(&content)
            .map_err(|e| CadenceError::InvalidConfig(format!("{}: {}", path.display(), e)))?;

        log::info!("Loaded config from: {}", path.display());
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self =
            serde_yaml::from_str(content).map_err(|e| CadenceError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.runner.interval_secs == 0 {
            return Err(CadenceError::InvalidConfig(
                "runner.interval_secs must be greater than zero".to_string(),
            ));
        }
        let threshold = self.monitor.oi_change_threshold;
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(CadenceError::InvalidConfig(format!(
                "monitor.oi_change_threshold must be a non-negative number, got {}",
                threshold
            )));
        }
        if self.runner.max_cycles == Some(0) {
            return Err(CadenceError::InvalidConfig(
                "runner.max_cycles must be greater than zero when set".to_string(),
            ));
        }
        Ok(())
    }
}
