//! Fake discovery nodes and node directory
//!
//! Each fake is a small axum app on a random port. Nodes count the requests
//! they receive so tests can assert on failover order.

use super::fixtures::{search_tracks, trending_tracks};
use axum::{
    extract::State,
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// How a fake node answers its requests.
#[derive(Clone, Copy, Debug)]
pub enum NodeBehavior {
    /// Serves the fixture payloads.
    Healthy,
    /// Answers every request with this status.
    Status(u16),
    /// Answers the first `failures` requests with `status`, then behaves as healthy.
    FailFirst { failures: usize, status: u16 },
}

struct NodeState {
    behavior: NodeBehavior,
    hits: AtomicUsize,
    requests: Mutex<Vec<String>>,
}

async fn serve_node(State(state): State<Arc<NodeState>>, uri: Uri) -> Response {
    let hit = state.hits.fetch_add(1, Ordering::SeqCst);
    state
        .requests
        .lock()
        .expect("Requests lock poisoned")
        .push(uri.to_string());

    let failing_status = match state.behavior {
        NodeBehavior::Healthy => None,
        NodeBehavior::Status(status) => Some(status),
        NodeBehavior::FailFirst { failures, status } if hit < failures => Some(status),
        NodeBehavior::FailFirst { .. } => None,
    };
    if let Some(status) = failing_status {
        let status = StatusCode::from_u16(status).expect("Invalid status in test behavior");
        return (status, Json(json!({"error": "fake failure"}))).into_response();
    }

    match uri.path() {
        "/v1/tracks/trending" => Json(json!({"data": trending_tracks()})).into_response(),
        "/v1/tracks/search" => Json(json!({"data": search_tracks()})).into_response(),
        _ => (StatusCode::NOT_FOUND, Json(json!({"error": "not found"}))).into_response(),
    }
}

async fn spawn_app(app: Router) -> (String, oneshot::Sender<()>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let port = listener
        .local_addr()
        .expect("Failed to get local address")
        .port();

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                shutdown_rx.await.ok();
            })
            .await
            .expect("Fake server failed");
    });

    (format!("http://127.0.0.1:{}", port), shutdown_tx)
}

/// A fake discovery node.
///
/// When dropped, the node shuts down.
pub struct FakeNode {
    pub url: String,
    state: Arc<NodeState>,
    _shutdown_tx: Option<oneshot::Sender<()>>,
}

impl FakeNode {
    pub async fn spawn(behavior: NodeBehavior) -> Self {
        let state = Arc::new(NodeState {
            behavior,
            hits: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        });
        let app = Router::new().fallback(serve_node).with_state(state.clone());
        let (url, shutdown_tx) = spawn_app(app).await;

        Self {
            url,
            state,
            _shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Number of requests received so far
    pub fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }

    /// Path and query of every request received, in order
    pub fn requests(&self) -> Vec<String> {
        self.state
            .requests
            .lock()
            .expect("Requests lock poisoned")
            .clone()
    }
}

impl Drop for FakeNode {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// A fake node directory answering `{"data": [hosts]}` at its root.
pub struct FakeDirectory {
    pub url: String,
    hits: Arc<AtomicUsize>,
    _shutdown_tx: Option<oneshot::Sender<()>>,
}

impl FakeDirectory {
    pub async fn spawn(hosts: Vec<String>) -> Self {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let app = Router::new().route(
            "/",
            get(move || {
                let hosts = hosts.clone();
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Json(json!({ "data": hosts }))
                }
            }),
        );
        let (url, shutdown_tx) = spawn_app(app).await;

        Self {
            url: format!("{}/", url),
            hits,
            _shutdown_tx: Some(shutdown_tx),
        }
    }

    /// An address nothing listens on
    pub async fn unreachable() -> String {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();
        drop(listener);
        format!("http://127.0.0.1:{}/", port)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

impl Drop for FakeDirectory {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
