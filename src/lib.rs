//! Notification and push delivery server library
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod config;
pub mod devices;
pub mod dispatch;
pub mod notifications;
pub mod push;
pub mod server;
pub mod sqlite_persistence;

// Re-export commonly used types for convenience
pub use config::{AppConfig, CliConfig, FileConfig, GatewaySettings};
pub use devices::{DeviceRegistry, SqliteDeviceStore};
pub use dispatch::{DomainEvent, EventDispatcher};
pub use notifications::{NotificationStore, SqliteNotificationStore};
pub use push::{HttpPushGateway, NoopPushGateway, PushGateway};
pub use server::{run_server, RequestsLoggingLevel};
