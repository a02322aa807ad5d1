//! Test server lifecycle management
//!
//! Spawns the full application on a random port, backed by temporary
//! databases and a stub push relay, and tears everything down on drop.

use super::constants::*;
use super::gateway::StubGateway;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tessera_notification_server::devices::{DeviceRegistry, SqliteDeviceStore};
use tessera_notification_server::dispatch::EventDispatcher;
use tessera_notification_server::notifications::SqliteNotificationStore;
use tessera_notification_server::push::{HttpPushGateway, PushGateway};
use tessera_notification_server::server::server::make_app;
use tessera_notification_server::server::state::{GuardedDeviceRegistry, GuardedNotificationStore};
use tessera_notification_server::server::{RequestsLoggingLevel, ServerConfig};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

pub struct TestServer {
    pub base_url: String,
    pub port: u16,

    /// Stub relay for scripting failures and asserting on outbound pushes
    pub gateway: StubGateway,

    /// Direct store access for assertions that bypass the HTTP surface
    pub notification_store: GuardedNotificationStore,

    /// Direct registry access for assertions on surviving tokens
    pub device_registry: GuardedDeviceRegistry,

    _temp_db_dir: TempDir,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl TestServer {
    pub async fn spawn() -> Self {
        let gateway = StubGateway::spawn().await;

        let temp_db_dir = TempDir::new().expect("Failed to create temp db dir");

        let notification_store: GuardedNotificationStore = Arc::new(
            SqliteNotificationStore::new(temp_db_dir.path().join("notifications.db"))
                .expect("Failed to open notification store"),
        );
        let device_store = Arc::new(
            SqliteDeviceStore::new(temp_db_dir.path().join("devices.db"))
                .expect("Failed to open device store"),
        );

        let push_gateway: Arc<dyn PushGateway> = Arc::new(HttpPushGateway::new(
            gateway.url.clone(),
            REQUEST_TIMEOUT_SECS,
        ));
        let device_registry = Arc::new(DeviceRegistry::new(device_store, push_gateway.clone()));
        let dispatcher = Arc::new(EventDispatcher::new(
            notification_store.clone(),
            device_registry.clone(),
            push_gateway.clone(),
            TEST_DEDUP_WINDOW_SEC,
            TEST_FANOUT_CONCURRENCY,
        ));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let config = ServerConfig {
            requests_logging_level: RequestsLoggingLevel::None,
            port,
            metrics_port: 0,
            internal_event_token: TEST_INTERNAL_TOKEN.to_string(),
        };

        let app = make_app(
            config,
            notification_store.clone(),
            device_registry.clone(),
            dispatcher,
            push_gateway,
        )
        .expect("Failed to build app");

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            gateway,
            notification_store,
            device_registry,
            _temp_db_dir: temp_db_dir,
            shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build readiness client");

        let url = format!("{}/", self.base_url);
        let start = Instant::now();

        loop {
            if let Ok(response) = client.get(&url).send().await {
                if response.status().is_success() {
                    return;
                }
            }
            if start.elapsed() > Duration::from_millis(SERVER_READY_TIMEOUT_MS) {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }
            tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
