//! HTTP client for end-to-end tests
//!
//! When API routes or request formats change, update only this file.

use super::constants::*;
use reqwest::Response;
use serde_json::{json, Value};
use std::time::Duration;

pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    pub async fn home(&self) -> Response {
        self.client
            .get(format!("{}/", self.base_url))
            .send()
            .await
            .expect("Home request failed")
    }

    pub async fn health(&self) -> Response {
        self.client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .expect("Health request failed")
    }

    pub async fn resolve(&self, query: &str) -> Response {
        self.client
            .post(format!("{}/v1/resolve", self.base_url))
            .json(&json!({ "query": query }))
            .send()
            .await
            .expect("Resolve request failed")
    }

    /// Resolves `query` and returns the JSON body, asserting a 200
    pub async fn resolve_json(&self, query: &str) -> Value {
        let response = self.resolve(query).await;
        assert_eq!(
            response.status(),
            reqwest::StatusCode::OK,
            "Unexpected status for {:?}",
            query
        );
        response.json().await.expect("Resolve body is not JSON")
    }
}
