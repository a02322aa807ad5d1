mod file_config;

pub use file_config::{FileConfig, GatewayFileConfig};

use crate::server::RequestsLoggingLevel;
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_dir: Option<PathBuf>,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub internal_event_token: Option<String>,
    pub dedup_window_sec: i64,
    pub fanout_concurrency: usize,
    pub gateway_url: Option<String>,
    pub gateway_timeout_sec: u64,
    pub gateway_dry_run: bool,
}

/// How the process talks to the push relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewaySettings {
    Relay { url: String, timeout_sec: u64 },
    DryRun,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_dir: PathBuf,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub internal_event_token: String,
    pub dedup_window_sec: i64,
    pub fanout_concurrency: usize,
    pub gateway: GatewaySettings,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        // TOML overrides CLI for each field
        let db_dir = file
            .db_dir
            .map(PathBuf::from)
            .or_else(|| cli.db_dir.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_dir must be specified via --db-dir or in config file")
            })?;

        // Validate db_dir exists
        if !db_dir.exists() {
            bail!("Database directory does not exist: {:?}", db_dir);
        }
        if !db_dir.is_dir() {
            bail!("db_dir is not a directory: {:?}", db_dir);
        }

        let port = file.port.unwrap_or(cli.port);
        let metrics_port = file.metrics_port.unwrap_or(cli.metrics_port);

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let internal_event_token = match file
            .internal_event_token
            .or_else(|| cli.internal_event_token.clone())
        {
            Some(token) if !token.trim().is_empty() => token,
            _ => bail!(
                "internal_event_token must be specified via --internal-event-token or in config file"
            ),
        };

        let dedup_window_sec = file.dedup_window_sec.unwrap_or(cli.dedup_window_sec);
        let fanout_concurrency = file.fanout_concurrency.unwrap_or(cli.fanout_concurrency);

        // Gateway settings - dry-run mode needs no relay URL
        let gateway_file = file.gateway.unwrap_or_default();
        let dry_run = gateway_file.dry_run.unwrap_or(cli.gateway_dry_run);
        let gateway = if dry_run {
            GatewaySettings::DryRun
        } else {
            let url = match gateway_file.url.or_else(|| cli.gateway_url.clone()) {
                Some(url) => url,
                None => bail!(
                    "gateway url must be specified via --gateway-url or [gateway] in config file, or pass --gateway-dry-run"
                ),
            };
            let timeout_sec = gateway_file.timeout_sec.unwrap_or(cli.gateway_timeout_sec);
            GatewaySettings::Relay { url, timeout_sec }
        };

        Ok(Self {
            db_dir,
            port,
            metrics_port,
            logging_level,
            internal_event_token,
            dedup_window_sec,
            fanout_concurrency,
            gateway,
        })
    }

    pub fn notifications_db_path(&self) -> PathBuf {
        self.db_dir.join("notifications.db")
    }

    pub fn devices_db_path(&self) -> PathBuf {
        self.db_dir.join("devices.db")
    }
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
