//! In-process push relay stub
//!
//! Spawns a real HTTP server speaking the relay wire protocol so tests can
//! assert on exactly what would have reached devices. Failures can be
//! scripted per token, either for every call or only for real sends so
//! that dry-run probes still pass.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// One call the stub received, in arrival order
#[derive(Clone, Debug)]
pub struct RecordedSend {
    pub token: String,
    pub title: String,
    pub body: String,
    pub data: HashMap<String, String>,
    pub dry_run: bool,
}

#[derive(Clone)]
struct ScriptedFailure {
    status: u16,
    error_code: String,
    fail_probes: bool,
}

#[derive(Clone, Default)]
struct StubState {
    sends: Arc<Mutex<Vec<RecordedSend>>>,
    failures: Arc<Mutex<HashMap<String, ScriptedFailure>>>,
}

#[derive(Deserialize)]
struct SendBody {
    token: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    body: String,
    #[serde(default)]
    data: HashMap<String, String>,
    #[serde(default)]
    dry_run: bool,
}

async fn handle_send(State(state): State<StubState>, Json(body): Json<SendBody>) -> Response {
    let failure = state.failures.lock().unwrap().get(&body.token).cloned();

    state.sends.lock().unwrap().push(RecordedSend {
        token: body.token,
        title: body.title,
        body: body.body,
        data: body.data,
        dry_run: body.dry_run,
    });

    match failure {
        Some(scripted) if scripted.fail_probes || !body.dry_run => (
            StatusCode::from_u16(scripted.status).unwrap(),
            Json(json!({ "error": scripted.error_code })),
        )
            .into_response(),
        _ => Json(json!({ "status": "ok" })).into_response(),
    }
}

/// HTTP stub standing in for the push relay
pub struct StubGateway {
    pub url: String,
    state: StubState,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl StubGateway {
    pub async fn spawn() -> Self {
        let state = StubState::default();

        let app = Router::new()
            .route("/v1/send", post(handle_send))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind stub relay");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();
        let url = format!("http://127.0.0.1:{}", port);

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Stub relay failed");
        });

        Self {
            url,
            state,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Makes the relay reject this token, probes included, on every
    /// future call.
    pub fn fail_with(&self, token: &str, status: u16, error_code: &str) {
        self.state.failures.lock().unwrap().insert(
            token.to_string(),
            ScriptedFailure {
                status,
                error_code: error_code.to_string(),
                fail_probes: true,
            },
        );
    }

    /// Makes the relay reject real sends for this token while dry-run
    /// probes keep succeeding.
    pub fn fail_sends_with(&self, token: &str, status: u16, error_code: &str) {
        self.state.failures.lock().unwrap().insert(
            token.to_string(),
            ScriptedFailure {
                status,
                error_code: error_code.to_string(),
                fail_probes: false,
            },
        );
    }

    /// Every call the stub received, dry-run probes included.
    pub fn sends(&self) -> Vec<RecordedSend> {
        self.state.sends.lock().unwrap().clone()
    }

    /// Only the calls that would have produced a visible push.
    pub fn deliveries(&self) -> Vec<RecordedSend> {
        self.sends().into_iter().filter(|s| !s.dry_run).collect()
    }
}

impl Drop for StubGateway {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
