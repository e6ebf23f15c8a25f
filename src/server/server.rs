use anyhow::{Context, Result};
use std::time::Duration;

use tracing::{debug, info};

use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::{log_requests, metrics::metrics_handler, state::*, ServerConfig};

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
    pub catalog_endpoints: usize,
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
struct ResolveBody {
    pub query: String,
}

#[derive(Serialize)]
struct ErrorBody {
    pub error: String,
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
        catalog_endpoints: state.resolver.catalog().len(),
    };
    Json(stats)
}

async fn health(State(state): State<ServerState>) -> impl IntoResponse {
    let nodes_cached = state.resolver.executor().pool().is_cached().await;
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "hash": state.hash,
        "nodes_cached": nodes_cached,
    }))
}

async fn resolve(State(resolver): State<GuardedResolver>, Json(body): Json<ResolveBody>) -> Response {
    let query = body.query.trim();
    if query.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorBody {
                error: "query must not be empty".to_string(),
            }),
        )
            .into_response();
    }

    debug!("Resolving {:?}", query);
    Json(resolver.answer(query).await).into_response()
}

pub fn make_app(config: ServerConfig, resolver: GuardedResolver) -> Router {
    let state = ServerState::new(config, resolver);

    let api_routes: Router = Router::new()
        .route("/resolve", post(resolve))
        .with_state(state.clone());

    Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .with_state(state.clone())
        .nest("/v1", api_routes)
        .layer(middleware::from_fn_with_state(state, log_requests))
}

pub fn make_metrics_app() -> Router {
    Router::new().route("/metrics", get(metrics_handler))
}

pub async fn run_server(config: ServerConfig, resolver: GuardedResolver) -> Result<()> {
    let port = config.port;
    let metrics_port = config.metrics_port;
    let app = make_app(config, resolver);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;
    let metrics_listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", metrics_port))
        .await
        .with_context(|| format!("Failed to bind metrics port {}", metrics_port))?;

    info!("Ready to serve at port {}!", port);
    info!("Metrics available at port {}!", metrics_port);

    let server = async { axum::serve(listener, app).await.context("HTTP server failed") };
    let metrics_server = async {
        axum::serve(metrics_listener, make_metrics_app())
            .await
            .context("Metrics server failed")
    };

    tokio::select! {
        result = server => result,
        result = metrics_server => result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::config::ExecutorSettings;
    use crate::executor::transport::MockEndpointTransport;
    use crate::executor::ResilientExecutor;
    use crate::nodes::{NodePool, StaticNodeDirectory};
    use crate::resolver::Resolver;
    use axum::{body::Body, http::Request};
    use std::sync::Arc;
    use tower::ServiceExt; // for `oneshot`

    fn app() -> Router {
        let pool = Arc::new(NodePool::new(
            Arc::new(StaticNodeDirectory::new(vec!["https://node".to_string()])),
            vec![],
        ));
        let executor = Arc::new(ResilientExecutor::new(
            pool,
            Arc::new(MockEndpointTransport::new()),
            &ExecutorSettings::default(),
        ));
        let resolver = Resolver::new(Arc::new(Catalog::builtin().unwrap()), executor, 100);
        make_app(ServerConfig::default(), Arc::new(resolver))
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_resolve(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/v1/resolve")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[test]
    fn uptime_formatting() {
        assert_eq!(format_uptime(Duration::from_secs(0)), "0d 00:00:00");
        assert_eq!(format_uptime(Duration::from_secs(90_061)), "1d 01:01:01");
    }

    #[tokio::test]
    async fn home_reports_catalog_size() {
        let response = app()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["catalog_endpoints"], 17);
    }

    #[tokio::test]
    async fn health_is_ok() {
        let response = app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["nodes_cached"], false);
    }

    #[tokio::test]
    async fn empty_query_is_bad_request() {
        let response = app().oneshot(post_resolve(r#"{"query": "   "}"#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_body_is_rejected() {
        let response = app().oneshot(post_resolve(r#"{"q": 1}"#)).await.unwrap();
        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn off_domain_query_is_answered_without_nodes() {
        let response = app()
            .oneshot(post_resolve(r#"{"query": "tell me a joke"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert!(json["answer"]
            .as_str()
            .unwrap()
            .contains("could not understand"));
        assert_eq!(json["route"], serde_json::Value::Null);
        assert_eq!(json["classification"]["query_type"], "general");
    }

    #[tokio::test]
    async fn metrics_app_serves_text() {
        crate::server::metrics::init_metrics();
        let response = make_metrics_app()
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
