//! Retry policy for calls against discovery nodes.
//!
//! Each node gets a fixed number of attempts with a linearly growing delay
//! between them; the number of distinct nodes tried is capped separately.

use super::transport::TransportError;
use crate::config::ExecutorSettings;
use std::time::Duration;

/// Outcome of one attempt that did not produce a usable payload.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptFailure {
    /// The node answered 404; the resource does not exist anywhere.
    NotFound,
    /// Non-success status other than 404.
    Status(u16),
    /// The body could not be decoded as JSON.
    Decode(String),
    Transport(TransportError),
}

impl AttemptFailure {
    /// NotFound is terminal, everything else may succeed on another try.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, AttemptFailure::NotFound)
    }
}

impl std::fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttemptFailure::NotFound => write!(f, "not found"),
            AttemptFailure::Status(status) => write!(f, "unexpected status {}", status),
            AttemptFailure::Decode(err) => write!(f, "undecodable body: {}", err),
            AttemptFailure::Transport(err) => write!(f, "{}", err),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempts per node before moving on.
    pub max_retries: u32,
    /// Cap on the number of nodes tried for one call.
    pub max_node_attempts: u32,
    /// Delay unit in milliseconds; before attempt `n + 1` the executor waits `n` units.
    pub retry_delay_ms: u64,
}

impl RetryPolicy {
    pub fn new(config: &ExecutorSettings) -> Self {
        Self {
            max_retries: config.max_retries,
            max_node_attempts: config.max_node_attempts,
            retry_delay_ms: config.retry_delay_ms,
        }
    }

    /// Number of nodes to try given the size of the pool.
    pub fn node_budget(&self, pool_size: usize) -> usize {
        pool_size.min(self.max_node_attempts as usize)
    }

    /// Whether another attempt on the same node is allowed after `attempt`
    /// (1-based) failed with `failure`.
    pub fn should_retry(&self, failure: &AttemptFailure, attempt: u32) -> bool {
        failure.is_retryable() && attempt < self.max_retries
    }

    /// Delay before the attempt following `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.retry_delay_ms.saturating_mul(attempt as u64))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(&ExecutorSettings::default())
    }
}
