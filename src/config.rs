use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};
use jsonschema::{JSONSchema, ValidationError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::recovery::RecoveryPolicy;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub policy: RecoveryPolicy,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_fixture_path() -> PathBuf {
    PathBuf::from("./carts.json5")
}

fn default_fetch_limit() -> usize {
    50
}

/// Where the feed pulls abandoned carts from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_fixture_path")]
    pub fixture_path: PathBuf,
    #[serde(default = "default_fetch_limit")]
    pub fetch_limit: usize,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            fixture_path: default_fixture_path(),
            fetch_limit: default_fetch_limit(),
        }
    }
}

fn default_refresh_interval_minutes() -> u64 {
    15
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_refresh_interval_minutes")]
    pub refresh_interval_minutes: u64,
    /// When set, each tick also dispatches due actions through the
    /// configured send adapters. Off by default: refresh-only.
    #[serde(default)]
    pub dispatch_enabled: bool,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            refresh_interval_minutes: default_refresh_interval_minutes(),
            dispatch_enabled: false,
        }
    }
}

fn default_logging_dir() -> PathBuf {
    PathBuf::from("./logs/recart")
}

fn default_logging_filter() -> String {
    "info".to_string()
}

fn default_logging_rotation() -> LoggingRotation {
    LoggingRotation::Daily
}

fn default_logging_retention_days() -> usize {
    14
}

fn default_enabled_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum LoggingRotation {
    Daily,
    Hourly,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_logging_filter")]
    pub filter: String,
    #[serde(default = "default_logging_rotation")]
    pub rotation: LoggingRotation,
    #[serde(default = "default_logging_retention_days")]
    pub retention_days: usize,
    #[serde(default = "default_enabled_true")]
    pub stderr_warn_enabled: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: default_logging_dir(),
            filter: default_logging_filter(),
            rotation: default_logging_rotation(),
            retention_days: default_logging_retention_days(),
            stderr_warn_enabled: true,
        }
    }
}

impl Config {
    pub fn load(config_path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(config_path)
            .with_context(|| format!("failed to read {}", config_path.display()))?;
        let config_value: Value = json5::from_str(&config_content)
            .with_context(|| format!("failed to parse {}", config_path.display()))?;

        let config_base = config_path.parent().unwrap_or_else(|| Path::new("."));
        let schema_path = resolve_schema_path(config_base, &config_value)?;
        validate_against_schema(&config_value, &schema_path)?;

        let mut config: Config =
            serde_json::from_value(config_value).context("failed to deserialize recart config")?;

        if !config.source.fixture_path.is_absolute() {
            config.source.fixture_path = config_base.join(&config.source.fixture_path);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.feed.refresh_interval_minutes == 0 {
            return Err(anyhow!("feed.refresh_interval_minutes must be at least 1"));
        }
        if self.source.fetch_limit == 0 {
            return Err(anyhow!("source.fetch_limit must be at least 1"));
        }
        if self.policy.attempt_cap == 0 {
            return Err(anyhow!("policy.attempt_cap must be at least 1"));
        }
        if !self.policy.expiry_hours.is_finite() || self.policy.expiry_hours <= 0.0 {
            return Err(anyhow!("policy.expiry_hours must be a positive number"));
        }
        if self.logging.filter.trim().is_empty() {
            return Err(anyhow!("logging.filter cannot be empty"));
        }
        if self.logging.retention_days == 0 {
            return Err(anyhow!("logging.retention_days must be at least 1"));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: SourceConfig::default(),
            feed: FeedConfig::default(),
            policy: RecoveryPolicy::default(),
            logging: LoggingConfig::default(),
        }
    }
}

fn resolve_schema_path(config_base: &Path, config_value: &Value) -> Result<PathBuf> {
    if let Some(path_text) = config_value.get("$schema").and_then(|value| value.as_str()) {
        let configured = PathBuf::from(path_text);
        if configured.is_absolute() {
            return Ok(configured);
        }
        return Ok(config_base.join(&configured));
    }

    let default = config_base.join("recart.schema.json");
    if default.exists() {
        return Ok(default);
    }

    Err(anyhow!(
        "unable to resolve schema path: expected $schema in config or recart.schema.json next to it"
    ))
}

fn validate_against_schema(config_value: &Value, schema_path: &Path) -> Result<()> {
    let schema_content = fs::read_to_string(schema_path)
        .with_context(|| format!("failed to read schema {}", schema_path.display()))?;
    let schema: Value = serde_json::from_str(&schema_content)
        .with_context(|| format!("failed to parse schema {}", schema_path.display()))?;

    let compiled =
        JSONSchema::compile(&schema).map_err(|e| anyhow!("failed to compile schema: {e}"))?;

    match compiled.validate(config_value) {
        Ok(()) => Ok(()),
        Err(errors_iter) => {
            let validation_errors: Vec<ValidationError> = errors_iter.collect();
            let messages: Vec<String> = validation_errors
                .into_iter()
                .map(|error| error.to_string())
                .collect();
            Err(anyhow!("config validation failed: {}", messages.join("; ")))
        }
    }
}
