use anyhow::Result;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::error;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{
    log_requests, metrics::metrics_handler, require_internal_token, state::*,
    RequestsLoggingLevel, ServerConfig,
};
use crate::notifications::{MarkReadSelection, NotificationRecord, MAX_PAGE_SIZE};
use crate::push::PushMessage;
use crate::server::session::Session;

#[derive(Serialize)]
struct ServerStats {
    pub name: &'static str,
    pub version: &'static str,
    pub uptime: String,
    pub hash: String,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

#[derive(Deserialize, Debug)]
struct ListNotificationsQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Serialize)]
struct NotificationListResponse {
    notifications: Vec<NotificationRecord>,
    unread_count: usize,
}

#[derive(Deserialize, Debug)]
struct MarkReadBody {
    #[serde(default)]
    pub notification_ids: Vec<i64>,
    #[serde(default)]
    pub mark_all: bool,
}

#[derive(Serialize)]
struct MarkReadResponse {
    status: &'static str,
    affected_count: usize,
    unread_count: usize,
}

#[derive(Deserialize, Debug)]
struct DeviceTokenBody {
    pub token: String,
}

#[derive(Deserialize, Debug)]
struct TestPushBody {
    pub title: Option<String>,
    pub body: Option<String>,
}

const TEST_PUSH_TITLE: &str = "Test Notification";
const TEST_PUSH_BODY: &str = "This is a test notification";

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
    };
    Json(stats)
}

async fn list_notifications(
    session: Session,
    State(store): State<GuardedNotificationStore>,
    Query(query): Query<ListNotificationsQuery>,
) -> Response {
    let limit = query.limit.unwrap_or(MAX_PAGE_SIZE);
    let offset = query.offset.unwrap_or(0);

    let notifications = match store.list_for_recipient(session.user_id, limit, offset) {
        Ok(x) => x,
        Err(err) => {
            error!(
                "Failed to list notifications for user {}: {}",
                session.user_id, err
            );
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let unread_count = match store.unread_count(session.user_id) {
        Ok(x) => x,
        Err(err) => {
            error!(
                "Failed to count unread notifications for user {}: {}",
                session.user_id, err
            );
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    Json(NotificationListResponse {
        notifications,
        unread_count,
    })
    .into_response()
}

async fn mark_notifications_read(
    session: Session,
    State(store): State<GuardedNotificationStore>,
    Json(body): Json<MarkReadBody>,
) -> Response {
    let selection = if body.mark_all {
        MarkReadSelection::All
    } else if body.notification_ids.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Provide notification_ids or set mark_all"})),
        )
            .into_response();
    } else {
        MarkReadSelection::Ids(&body.notification_ids)
    };

    let affected_count = match store.mark_read(session.user_id, selection) {
        Ok(x) => x,
        Err(err) => {
            error!(
                "Failed to mark notifications read for user {}: {}",
                session.user_id, err
            );
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let unread_count = match store.unread_count(session.user_id) {
        Ok(x) => x,
        Err(err) => {
            error!(
                "Failed to count unread notifications for user {}: {}",
                session.user_id, err
            );
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    Json(MarkReadResponse {
        status: "ok",
        affected_count,
        unread_count,
    })
    .into_response()
}

async fn register_device(
    session: Session,
    State(registry): State<GuardedDeviceRegistry>,
    Json(body): Json<DeviceTokenBody>,
) -> Response {
    use crate::devices::RegistrationError;

    match registry.register(session.user_id, &body.token).await {
        Ok(_) => Json(json!({"status": "ok"})).into_response(),
        Err(RegistrationError::Internal(err)) => {
            error!(
                "Failed to register device for user {}: {}",
                session.user_id, err
            );
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
        Err(err) => (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": err.to_string()})),
        )
            .into_response(),
    }
}

async fn unregister_device(
    session: Session,
    State(registry): State<GuardedDeviceRegistry>,
    Json(body): Json<DeviceTokenBody>,
) -> Response {
    match registry.unregister(session.user_id, &body.token) {
        Ok(true) => Json(json!({"status": "ok"})).into_response(),
        Ok(false) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            error!(
                "Failed to unregister device for user {}: {}",
                session.user_id, err
            );
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn send_test_push(
    session: Session,
    State(state): State<ServerState>,
    Json(body): Json<TestPushBody>,
) -> Response {
    if let Err(err) = state.device_registry.prune_invalid(session.user_id).await {
        error!(
            "Failed to prune tokens for user {}: {}",
            session.user_id, err
        );
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    let endpoints = match state.device_registry.endpoints_for(session.user_id) {
        Ok(x) => x,
        Err(err) => {
            error!(
                "Failed to load device endpoints for user {}: {}",
                session.user_id, err
            );
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    if endpoints.is_empty() {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "No registered devices"})),
        )
            .into_response();
    }

    let message = PushMessage {
        title: body.title.unwrap_or_else(|| TEST_PUSH_TITLE.to_owned()),
        body: body.body.unwrap_or_else(|| TEST_PUSH_BODY.to_owned()),
        data: HashMap::from([("type".to_owned(), "test".to_owned())]),
    };

    let mut results = Vec::with_capacity(endpoints.len());
    for endpoint in endpoints {
        results.push(state.push_gateway.send(&endpoint.token, &message).await);
    }

    Json(json!({ "results": results })).into_response()
}

async fn ingest_event(
    State(state): State<ServerState>,
    Json(event): Json<crate::dispatch::DomainEvent>,
) -> Response {
    let report = state.dispatcher.dispatch_event(&event).await;
    if report.has_store_failure() {
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(report)).into_response();
    }
    Json(report).into_response()
}

impl ServerState {
    fn new(
        config: ServerConfig,
        notification_store: GuardedNotificationStore,
        device_registry: GuardedDeviceRegistry,
        dispatcher: GuardedDispatcher,
        push_gateway: GuardedPushGateway,
    ) -> ServerState {
        ServerState {
            config,
            start_time: Instant::now(),
            notification_store,
            device_registry,
            dispatcher,
            push_gateway,
            hash: env!("GIT_HASH").to_owned(),
        }
    }
}

pub fn make_app(
    config: ServerConfig,
    notification_store: GuardedNotificationStore,
    device_registry: GuardedDeviceRegistry,
    dispatcher: GuardedDispatcher,
    push_gateway: GuardedPushGateway,
) -> Result<Router> {
    let state = ServerState::new(
        config,
        notification_store,
        device_registry,
        dispatcher,
        push_gateway,
    );

    let notification_routes: Router = Router::new()
        .route("/notifications", get(list_notifications))
        .route("/notifications/mark-read", post(mark_notifications_read))
        .with_state(state.clone());

    let device_routes: Router = Router::new()
        .route("/devices", post(register_device))
        .route("/devices", delete(unregister_device))
        .route("/push/test", post(send_test_push))
        .with_state(state.clone());

    let event_routes: Router = Router::new()
        .route("/events", post(ingest_event))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_internal_token,
        ))
        .with_state(state.clone());

    let home_router: Router = Router::new()
        .route("/", get(home))
        .with_state(state.clone());

    let v1_routes = notification_routes.merge(device_routes).merge(event_routes);

    let mut app: Router = home_router.nest("/v1", v1_routes);
    app = app.layer(middleware::from_fn_with_state(state.clone(), log_requests));

    Ok(app)
}

pub async fn run_server(
    notification_store: GuardedNotificationStore,
    device_registry: GuardedDeviceRegistry,
    dispatcher: GuardedDispatcher,
    push_gateway: GuardedPushGateway,
    requests_logging_level: RequestsLoggingLevel,
    port: u16,
    metrics_port: u16,
    internal_event_token: String,
) -> Result<()> {
    let config = ServerConfig {
        requests_logging_level,
        port,
        metrics_port,
        internal_event_token,
    };
    let app = make_app(
        config,
        notification_store,
        device_registry,
        dispatcher,
        push_gateway,
    )?;

    let metrics_app: Router = Router::new().route("/metrics", get(metrics_handler));
    let metrics_listener =
        tokio::net::TcpListener::bind(format!("127.0.0.1:{}", metrics_port)).await?;
    tokio::spawn(async move {
        if let Err(err) = axum::serve(metrics_listener, metrics_app).await {
            error!("Metrics server stopped: {}", err);
        }
    });

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;

    Ok(axum::serve(listener, app).await?)
}
