//! Common test infrastructure
//!
//! End-to-end tests run the real HTTP app against fake discovery nodes and a
//! fake node directory, all bound to random local ports.
//! Tests should only import from this module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{FakeNode, NodeBehavior, TestClient, TestServer};
//!
//! #[tokio::test]
//! async fn test_trending() {
//!     let node = FakeNode::spawn(NodeBehavior::Healthy).await;
//!     let server = TestServer::with_nodes(&[&node]).await;
//!     let client = TestClient::new(server.base_url.clone());
//!
//!     let body = client.resolve_json("trending tracks").await;
//!     assert!(body["answer"].as_str().unwrap().starts_with("Trending Tracks:"));
//! }
//! ```

mod client;
mod constants;
mod fakes;
mod fixtures;
mod server;

// Public API - this is what tests import
pub use client::TestClient;
pub use constants::*;
pub use fakes::{FakeDirectory, FakeNode, NodeBehavior};
pub use server::TestServer;

#[allow(unused_imports)]
pub use fixtures::{search_tracks, trending_tracks};
