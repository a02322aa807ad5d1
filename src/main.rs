use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tessera_notification_server::config::{AppConfig, CliConfig, FileConfig, GatewaySettings};
use tessera_notification_server::devices::{DeviceRegistry, SqliteDeviceStore};
use tessera_notification_server::dispatch::EventDispatcher;
use tessera_notification_server::notifications::SqliteNotificationStore;
use tessera_notification_server::push::{HttpPushGateway, NoopPushGateway, PushGateway};
use tessera_notification_server::server::{self, run_server, RequestsLoggingLevel};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to a TOML config file. Values in the file override CLI flags.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Directory holding the SQLite database files.
    #[clap(long, value_parser = parse_path)]
    pub db_dir: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3003)]
    pub port: u16,

    /// The port for the metrics server (Prometheus scraping).
    #[clap(long, default_value_t = 9091)]
    pub metrics_port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Shared secret the backend must present on the event intake endpoint.
    #[clap(long)]
    pub internal_event_token: Option<String>,

    /// Seconds within which an identical notification is deduplicated.
    #[clap(long, default_value_t = 300)]
    pub dedup_window_sec: i64,

    /// Maximum concurrent push deliveries while fanning out one notification.
    #[clap(long, default_value_t = 8)]
    pub fanout_concurrency: usize,

    /// Base URL of the push relay.
    #[clap(long)]
    pub gateway_url: Option<String>,

    /// Timeout in seconds for push relay requests.
    #[clap(long, default_value_t = 10)]
    pub gateway_timeout_sec: u64,

    /// Log pushes instead of delivering them. No relay needed.
    #[clap(long, default_value_t = false)]
    pub gateway_dry_run: bool,
}

impl From<&CliArgs> for CliConfig {
    fn from(args: &CliArgs) -> Self {
        CliConfig {
            db_dir: args.db_dir.clone(),
            port: args.port,
            metrics_port: args.metrics_port,
            logging_level: args.logging_level.clone(),
            internal_event_token: args.internal_event_token.clone(),
            dedup_window_sec: args.dedup_window_sec,
            fanout_concurrency: args.fanout_concurrency,
            gateway_url: args.gateway_url.clone(),
            gateway_timeout_sec: args.gateway_timeout_sec,
            gateway_dry_run: args.gateway_dry_run,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config file {:?}...", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let config = AppConfig::resolve(&CliConfig::from(&cli_args), file_config)?;

    info!("Initializing metrics...");
    server::metrics::init_metrics();

    info!(
        "Opening SQLite notification database at {:?}...",
        config.notifications_db_path()
    );
    let notification_store = Arc::new(SqliteNotificationStore::new(
        config.notifications_db_path(),
    )?);

    info!(
        "Opening SQLite device database at {:?}...",
        config.devices_db_path()
    );
    let device_store = Arc::new(SqliteDeviceStore::new(config.devices_db_path())?);

    let push_gateway: Arc<dyn PushGateway> = match &config.gateway {
        GatewaySettings::Relay { url, timeout_sec } => {
            info!("Push relay configured at {}", url);
            Arc::new(HttpPushGateway::new(url.clone(), *timeout_sec))
        }
        GatewaySettings::DryRun => {
            info!("Push relay in dry-run mode, pushes will only be logged");
            Arc::new(NoopPushGateway)
        }
    };

    let device_registry = Arc::new(DeviceRegistry::new(device_store, push_gateway.clone()));
    let dispatcher = Arc::new(EventDispatcher::new(
        notification_store.clone(),
        device_registry.clone(),
        push_gateway.clone(),
        config.dedup_window_sec,
        config.fanout_concurrency,
    ));

    info!("Ready to serve at port {}!", config.port);
    info!("Metrics available at port {}!", config.metrics_port);
    run_server(
        notification_store,
        device_registry,
        dispatcher,
        push_gateway,
        config.logging_level,
        config.port,
        config.metrics_port,
        config.internal_event_token,
    )
    .await
}
