//! Discovery node directory and the cached pool of hosts built from it.

use crate::config::DirectorySettings;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Source of discovery node hosts.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait NodeDirectory: Send + Sync {
    /// Ordered list of host base urls.
    async fn list_nodes(&self) -> Result<Vec<String>>;
}

#[derive(Deserialize)]
struct DirectoryResponse {
    data: Vec<String>,
}

/// Directory service reached over HTTP, answering `{"data": [hosts]}`.
pub struct HttpNodeDirectory {
    client: reqwest::Client,
    url: String,
}

impl HttpNodeDirectory {
    pub fn new(url: String, timeout_sec: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_sec))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl NodeDirectory for HttpNodeDirectory {
    async fn list_nodes(&self) -> Result<Vec<String>> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .with_context(|| format!("Failed to reach node directory {}", self.url))?;

        if !response.status().is_success() {
            bail!(
                "Node directory {} answered with status {}",
                self.url,
                response.status()
            );
        }

        let parsed: DirectoryResponse = response
            .json()
            .await
            .context("Failed to parse node directory response")?;
        Ok(normalize_hosts(parsed.data))
    }
}

/// A fixed list of hosts, for pinned deployments and local testing.
pub struct StaticNodeDirectory {
    hosts: Vec<String>,
}

impl StaticNodeDirectory {
    pub fn new(hosts: Vec<String>) -> Self {
        Self {
            hosts: normalize_hosts(hosts),
        }
    }
}

#[async_trait]
impl NodeDirectory for StaticNodeDirectory {
    async fn list_nodes(&self) -> Result<Vec<String>> {
        Ok(self.hosts.clone())
    }
}

/// Directory to use for a deployment: pinned hosts when given, otherwise the
/// configured directory service.
pub fn directory_for(
    settings: &DirectorySettings,
    pinned: Vec<String>,
) -> Result<Arc<dyn NodeDirectory>> {
    if pinned.is_empty() {
        info!("Using node directory {}", settings.url);
        Ok(Arc::new(HttpNodeDirectory::new(
            settings.url.clone(),
            settings.timeout_sec,
        )?))
    } else {
        info!("Using {} pinned nodes", pinned.len());
        Ok(Arc::new(StaticNodeDirectory::new(pinned)))
    }
}

fn normalize_hosts(hosts: Vec<String>) -> Vec<String> {
    hosts
        .into_iter()
        .map(|h| h.trim().trim_end_matches('/').to_string())
        .filter(|h| !h.is_empty())
        .collect()
}

/// Node hosts fetched once from the directory and reused afterwards.
///
/// Only a successful, non-empty directory answer is cached. When the
/// directory fails the configured fallback hosts are returned instead, so
/// the next call tries the directory again.
pub struct NodePool {
    directory: Arc<dyn NodeDirectory>,
    fallback: Vec<String>,
    cache: RwLock<Option<Vec<String>>>,
}

impl NodePool {
    pub fn new(directory: Arc<dyn NodeDirectory>, fallback: Vec<String>) -> Self {
        Self {
            directory,
            fallback: normalize_hosts(fallback),
            cache: RwLock::new(None),
        }
    }

    /// Current hosts, fetching from the directory on first use.
    pub async fn hosts(&self) -> Vec<String> {
        if let Some(hosts) = self.cache.read().await.as_ref() {
            return hosts.clone();
        }

        let mut cache = self.cache.write().await;
        if let Some(hosts) = cache.as_ref() {
            return hosts.clone();
        }
        match self.fetch().await {
            Ok(hosts) => {
                info!("Discovered {} nodes", hosts.len());
                *cache = Some(hosts.clone());
                hosts
            }
            Err(err) => {
                warn!(
                    "Node directory unavailable ({:#}), using {} fallback hosts",
                    err,
                    self.fallback.len()
                );
                self.fallback.clone()
            }
        }
    }

    /// Re-fetch the directory. The cache is replaced only on success.
    pub async fn refresh(&self) -> Result<usize> {
        let hosts = self.fetch().await?;
        let count = hosts.len();
        *self.cache.write().await = Some(hosts);
        info!("Node pool refreshed, {} nodes", count);
        Ok(count)
    }

    pub async fn is_cached(&self) -> bool {
        self.cache.read().await.is_some()
    }

    async fn fetch(&self) -> Result<Vec<String>> {
        let hosts = normalize_hosts(self.directory.list_nodes().await?);
        if hosts.is_empty() {
            bail!("Node directory returned no hosts");
        }
        debug!("Directory hosts: {:?}", hosts);
        Ok(hosts)
    }
}
