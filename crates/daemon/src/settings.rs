//! Daemon settings
//!
//! Layered: built-in defaults, then an optional config file
//! (`$QUEUEDESK_CONFIG` or `~/.queuedesk/config.{toml,json,yaml}`), then
//! `QUEUEDESK_*` environment variables.

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use queuedesk_core::application::constants::{
    DEFAULT_CALL_TIMEOUT_MS, DEFAULT_HOUSEKEEPING_INTERVAL, DEFAULT_MINUTES_PER_ENTRY,
    DEFAULT_SWEEP_INTERVAL,
};
use queuedesk_core::port::MaintenanceConfig;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

const ENV_PREFIX: &str = "QUEUEDESK";
const CONFIG_PATH_VAR: &str = "QUEUEDESK_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "~/.queuedesk/config";
const DEFAULT_DB_PATH: &str = "~/.queuedesk/queuedesk.db";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database_path: String,
    pub rpc_host: String,
    pub rpc_port: u16,
    pub log_format: LogFormat,
    pub log_dir: Option<String>,
    pub call_timeout_secs: u64,
    pub minutes_per_entry: i64,
    pub sweep_interval_secs: u64,
    pub maintenance_interval_hours: u64,
    pub finished_entry_retention_days: i64,
    pub max_db_size_mb: f64,
    pub rate_limit_burst: u32,
    pub rate_limit_per_sec: u32,
    pub session_ttl_hours: u64,
    pub allow_admin_signup: bool,
}

impl Settings {
    /// Load from the process environment
    pub fn load() -> Result<Self> {
        let file = std::env::var(CONFIG_PATH_VAR)
            .map(|path| (path, true))
            .unwrap_or_else(|_| (DEFAULT_CONFIG_PATH.to_string(), false));
        Self::from_sources(Some(file), None)
    }

    /// `file`: path without extension plus whether it must exist.
    /// `env`: explicit variables instead of the process environment (tests).
    pub fn from_sources(
        file: Option<(String, bool)>,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self> {
        let maintenance = MaintenanceConfig::default();
        let mut builder = Config::builder()
            .set_default("database_path", DEFAULT_DB_PATH)?
            .set_default("rpc_host", "127.0.0.1")?
            .set_default("rpc_port", 9630)?
            .set_default("log_format", "pretty")?
            .set_default("call_timeout_secs", DEFAULT_CALL_TIMEOUT_MS / 1000)?
            .set_default("minutes_per_entry", DEFAULT_MINUTES_PER_ENTRY)?
            .set_default(
                "sweep_interval_secs",
                DEFAULT_SWEEP_INTERVAL.as_secs() as i64,
            )?
            .set_default(
                "maintenance_interval_hours",
                (DEFAULT_HOUSEKEEPING_INTERVAL.as_secs() / 3600) as i64,
            )?
            .set_default(
                "finished_entry_retention_days",
                maintenance.finished_entry_retention_days,
            )?
            .set_default("max_db_size_mb", maintenance.max_db_size_mb)?
            .set_default("rate_limit_burst", 60)?
            .set_default("rate_limit_per_sec", 10)?
            .set_default("session_ttl_hours", 12)?
            .set_default("allow_admin_signup", true)?;

        if let Some((path, required)) = file {
            let path = shellexpand::tilde(&path).into_owned();
            builder = builder.add_source(File::with_name(&path).required(required));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .source(env),
        );

        let settings: Settings = builder
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.call_timeout_secs == 0 {
            anyhow::bail!("call_timeout_secs must be positive");
        }
        if self.minutes_per_entry <= 0 {
            anyhow::bail!("minutes_per_entry must be positive");
        }
        if self.sweep_interval_secs == 0 || self.maintenance_interval_hours == 0 {
            anyhow::bail!("sweep and maintenance intervals must be positive");
        }
        if self.rate_limit_burst == 0 {
            anyhow::bail!("rate_limit_burst must be positive");
        }
        Ok(())
    }

    /// Database path with `~` expanded
    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.database_path).into_owned())
    }

    /// Log directory with `~` expanded
    pub fn log_dir(&self) -> Option<PathBuf> {
        self.log_dir
            .as_deref()
            .map(|dir| PathBuf::from(shellexpand::tilde(dir).into_owned()))
    }
}
