use axum::extract::FromRef;

use crate::devices::DeviceRegistry;
use crate::dispatch::EventDispatcher;
use crate::notifications::NotificationStore;
use crate::push::PushGateway;
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;

pub type GuardedNotificationStore = Arc<dyn NotificationStore>;
pub type GuardedDeviceRegistry = Arc<DeviceRegistry>;
pub type GuardedDispatcher = Arc<EventDispatcher>;
pub type GuardedPushGateway = Arc<dyn PushGateway>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub notification_store: GuardedNotificationStore,
    pub device_registry: GuardedDeviceRegistry,
    pub dispatcher: GuardedDispatcher,
    pub push_gateway: GuardedPushGateway,
    pub hash: String,
}

impl FromRef<ServerState> for GuardedNotificationStore {
    fn from_ref(input: &ServerState) -> Self {
        input.notification_store.clone()
    }
}

impl FromRef<ServerState> for GuardedDeviceRegistry {
    fn from_ref(input: &ServerState) -> Self {
        input.device_registry.clone()
    }
}

impl FromRef<ServerState> for GuardedDispatcher {
    fn from_ref(input: &ServerState) -> Self {
        input.dispatcher.clone()
    }
}

impl FromRef<ServerState> for GuardedPushGateway {
    fn from_ref(input: &ServerState) -> Self {
        input.push_gateway.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
