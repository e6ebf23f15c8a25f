//! Test server lifecycle management
//!
//! This module manages spawning and shutting down the resolver HTTP app.
//! Each test gets an isolated server with its own node pool.

use super::constants::*;
use super::fakes::{FakeDirectory, FakeNode};
use atris_resolver::catalog::Catalog;
use atris_resolver::config::{AppConfig, CliConfig, ExecutorConfig, FileConfig};
use atris_resolver::nodes::directory_for;
use atris_resolver::resolver::Resolver;
use atris_resolver::server::{make_app, RequestsLoggingLevel, ServerConfig};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

/// Test server instance backed by fake nodes
///
/// When dropped, the server gracefully shuts down along with the directory
/// it owns.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    pub port: u16,

    /// Directory spawned for this server, when it owns one
    pub directory: Option<FakeDirectory>,

    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a server whose directory lists `nodes` in order
    pub async fn with_nodes(nodes: &[&FakeNode]) -> Self {
        let hosts = nodes.iter().map(|n| n.url.clone()).collect();
        let directory = FakeDirectory::spawn(hosts).await;
        let mut server = Self::spawn(directory.url.clone(), vec![]).await;
        server.directory = Some(directory);
        server
    }

    /// Spawns a server using the directory at `directory_url` and the given
    /// fallback hosts
    ///
    /// # Panics
    ///
    /// Panics if:
    /// - Configuration is rejected
    /// - Port binding fails
    /// - Server doesn't become ready within timeout
    pub async fn spawn(directory_url: String, fallback_nodes: Vec<String>) -> Self {
        let cli_config = CliConfig {
            directory_url: Some(directory_url),
            fallback_nodes,
            request_timeout_sec: Some(NODE_REQUEST_TIMEOUT_SECS),
            ..Default::default()
        };
        // No backoff between attempts on the same node
        let file_config = FileConfig {
            executor: Some(ExecutorConfig {
                retry_delay_ms: Some(0),
                ..Default::default()
            }),
            ..Default::default()
        };
        let app_config =
            AppConfig::resolve(&cli_config, Some(file_config)).expect("Failed to resolve config");

        let catalog = Catalog::builtin().expect("Failed to load built-in catalog");
        let directory =
            directory_for(&app_config.directory, vec![]).expect("Failed to create directory");
        let resolver = Resolver::from_config(&app_config, catalog, directory)
            .expect("Failed to build resolver");

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");

        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();

        let base_url = format!("http://127.0.0.1:{}", port);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let config = ServerConfig {
            port,
            requests_logging_level: RequestsLoggingLevel::None,
            ..Default::default()
        };
        let app = make_app(config, Arc::new(resolver));

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
            directory: None,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// Waits for the server to become ready by polling the home endpoint
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => return,
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
