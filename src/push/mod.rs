//! Push delivery through an external relay service

mod gateway;
mod http_gateway;
mod models;

pub use gateway::{NoopPushGateway, PushGateway};
pub use http_gateway::HttpPushGateway;
pub use models::{DeliveryErrorKind, DeliveryOutcome, PushMessage};
