use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,
    pub scheduling: SchedulingConfig,
    pub retry: RetryConfig,
    pub recovery: RecoveryConfig,
    pub api: ApiConfig,
    pub storage: StorageConfig,
}

/// Controls how many tasks are created per day and where they land on the clock.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulingConfig {
    pub daily_max_tasks: usize,
    pub daily_min_tasks: usize,
    /// Hours of day (0-23) preferred for publishing.
    pub optimal_hours: Vec<u32>,
    /// Hours of day (0-23) during which nothing may be scheduled.
    pub blackout_hours: Vec<u32>,
    pub interval_minutes_min: i64,
    pub interval_minutes_max: i64,
    /// How many calendar days ahead multi-day distribution may plan.
    pub days_ahead: u32,
    /// Local timezone as a fixed offset from UTC, in minutes.
    pub utc_offset_minutes: i32,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            daily_max_tasks: 10,
            daily_min_tasks: 3,
            optimal_hours: vec![9, 12, 15, 18, 21],
            blackout_hours: vec![0, 1, 2, 3, 4, 5],
            interval_minutes_min: 30,
            interval_minutes_max: 180,
            days_ahead: 7,
            utc_offset_minutes: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub backoff_base: f64,
    pub base_delay_minutes: i64,
    pub max_delay_minutes: i64,
    /// Courtesy gap between successful publishes in batch mode (seconds).
    pub batch_gap_secs_min: u64,
    pub batch_gap_secs_max: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_base: 2.0,
            base_delay_minutes: 30,
            max_delay_minutes: 240,
            batch_gap_secs_min: 30,
            batch_gap_secs_max: 120,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecoveryConfig {
    /// Seconds between stuck-task sweeps.
    pub sweep_interval_secs: u64,
    pub max_recovery_attempts: u32,
    /// Minutes before a claimed-but-idle task counts as stuck.
    pub running_timeout_minutes: i64,
    pub processing_timeout_minutes: i64,
    pub uploading_timeout_minutes: i64,
    pub default_timeout_minutes: i64,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: 120,
            max_recovery_attempts: 3,
            running_timeout_minutes: 5,
            processing_timeout_minutes: 10,
            uploading_timeout_minutes: 15,
            default_timeout_minutes: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub generation_url: String,
    pub publish_url: String,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            generation_url: "http://localhost:8700/v1/generate".to_string(),
            publish_url: "http://localhost:8700/v1/publish".to_string(),
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Explicit store directory. When unset the store lives under
    /// `~/.postr/<workspace-hash>/`, keyed by the current directory.
    pub taskstore_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            scheduling: SchedulingConfig::default(),
            retry: RetryConfig::default(),
            recovery: RecoveryConfig::default(),
            api: ApiConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try primary location: ~/.config/<project>/<project>.yml
        if let Some(config_dir) = dirs::config_dir() {
            let project_name = env!("CARGO_PKG_NAME");
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
        let project_name = env!("CARGO_PKG_NAME");
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

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}
