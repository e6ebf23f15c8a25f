//! Calls catalog endpoints against the discovery node pool.
//!
//! Nodes are tried in pool order. Each node gets up to
//! [`RetryPolicy::max_retries`] attempts with a linear backoff between them,
//! then the executor moves to the next node until the node budget is spent.
//! A 404 from any node ends the call immediately.

pub mod retry_policy;
pub mod transport;

pub use retry_policy::{AttemptFailure, RetryPolicy};
pub use transport::{
    EndpointTransport, HttpRequest, ReqwestTransport, TransportError, TransportResponse,
};

use crate::catalog::EndpointDescriptor;
use crate::config::ExecutorSettings;
use crate::nodes::NodePool;
use crate::resolver::{ParamValue, ParameterBinding, ResolveError};
use crate::server::metrics;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of one execution, either for a single node or for the whole pool.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome {
    Success { payload: Value },
    NotFound,
    /// A single node failed every attempt it was given.
    TransientFailure { attempts: u32, last_error: String },
    AllNodesExhausted { attempted: usize, last_error: String },
}

pub struct ResilientExecutor {
    pool: Arc<NodePool>,
    transport: Arc<dyn EndpointTransport>,
    policy: RetryPolicy,
    app_name: String,
}

impl ResilientExecutor {
    pub fn new(
        pool: Arc<NodePool>,
        transport: Arc<dyn EndpointTransport>,
        settings: &ExecutorSettings,
    ) -> Self {
        Self {
            pool,
            transport,
            policy: RetryPolicy::new(settings),
            app_name: settings.app_name.clone(),
        }
    }

    pub fn pool(&self) -> &Arc<NodePool> {
        &self.pool
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Build the request path for `endpoint`: placeholders are substituted,
    /// every other binding becomes a query parameter (lists repeat the key)
    /// and `app_name` is appended last.
    pub fn render_path(&self, endpoint: &EndpointDescriptor, binding: &ParameterBinding) -> String {
        let placeholders = endpoint.placeholders();
        let mut path = endpoint.url_template.clone();
        for name in &placeholders {
            if let Some(value) = binding.get(name) {
                let encoded = urlencoding::encode(&value.to_string()).into_owned();
                path = path.replace(&format!("{{{}}}", name), &encoded);
            }
        }

        let mut query: Vec<String> = Vec::new();
        for (name, value) in binding.iter() {
            if placeholders.contains(&name) {
                continue;
            }
            match value {
                ParamValue::List(items) => {
                    for item in items {
                        query.push(format!("{}={}", name, urlencoding::encode(item)));
                    }
                }
                other => query.push(format!(
                    "{}={}",
                    name,
                    urlencoding::encode(&other.to_string())
                )),
            }
        }
        if !self.app_name.is_empty() {
            query.push(format!("app_name={}", urlencoding::encode(&self.app_name)));
        }

        if query.is_empty() {
            path
        } else {
            let separator = if path.contains('?') { '&' } else { '?' };
            format!("{}{}{}", path, separator, query.join("&"))
        }
    }

    /// Run `method path` against the pool until a node answers, a node says
    /// 404, or the node budget is spent.
    pub async fn execute(&self, method: &str, path: &str) -> ExecutionOutcome {
        let hosts = self.pool.hosts().await;
        let budget = self.policy.node_budget(hosts.len());
        if budget == 0 {
            warn!("No discovery nodes available for {}", path);
            return ExecutionOutcome::AllNodesExhausted {
                attempted: 0,
                last_error: "no discovery nodes available".to_string(),
            };
        }

        let mut last_error = String::new();
        for (index, host) in hosts.iter().take(budget).enumerate() {
            match self.attempt_node(host, method, path).await {
                ExecutionOutcome::TransientFailure {
                    attempts,
                    last_error: error,
                } => {
                    warn!(
                        "Node {} ({}/{}) failed after {} attempts: {}",
                        host,
                        index + 1,
                        budget,
                        attempts,
                        error
                    );
                    last_error = error;
                }
                outcome => return outcome,
            }
        }

        ExecutionOutcome::AllNodesExhausted {
            attempted: budget,
            last_error,
        }
    }

    /// Try a single node. Never returns `AllNodesExhausted`.
    async fn attempt_node(&self, host: &str, method: &str, path: &str) -> ExecutionOutcome {
        let url = format!("{}{}", host, path);
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let mut request = HttpRequest::get(url.clone());
            request.method = method.to_string();
            debug!("Attempt {} {} {}", attempt, request.method, url);

            let failure = match self.transport.send(request).await {
                Ok(response) if (200..300).contains(&response.status) => {
                    match serde_json::from_str::<Value>(&response.body) {
                        Ok(payload) => {
                            metrics::record_node_attempt("success");
                            return ExecutionOutcome::Success { payload };
                        }
                        Err(e) => AttemptFailure::Decode(e.to_string()),
                    }
                }
                Ok(response) if response.status == 404 => AttemptFailure::NotFound,
                Ok(response) => AttemptFailure::Status(response.status),
                Err(e) => AttemptFailure::Transport(e),
            };

            if failure == AttemptFailure::NotFound {
                metrics::record_node_attempt("not_found");
                info!("{} answered 404", url);
                return ExecutionOutcome::NotFound;
            }
            metrics::record_node_attempt("failure");

            if !self.policy.should_retry(&failure, attempt) {
                return ExecutionOutcome::TransientFailure {
                    attempts: attempt,
                    last_error: failure.to_string(),
                };
            }
            let delay = self.policy.backoff(attempt);
            debug!("{} failed ({}), retrying in {:?}", url, failure, delay);
            tokio::time::sleep(delay).await;
        }
    }

    /// Call `endpoint` with `binding` and return the `data` field of the
    /// response envelope.
    pub async fn call(
        &self,
        endpoint: &EndpointDescriptor,
        binding: &ParameterBinding,
    ) -> Result<Value, ResolveError> {
        let path = self.render_path(endpoint, binding);
        info!("Calling {} {}", endpoint.api_name, path);

        outcome_to_result(self.execute(&endpoint.method, &path).await)
    }
}

fn outcome_to_result(outcome: ExecutionOutcome) -> Result<Value, ResolveError> {
    match outcome {
        ExecutionOutcome::Success { payload } => Ok(unwrap_envelope(payload)),
        ExecutionOutcome::NotFound => Err(ResolveError::NotFound),
        ExecutionOutcome::TransientFailure {
            attempts,
            last_error,
        } => Err(ResolveError::TransientFailure {
            attempts,
            last_error,
        }),
        ExecutionOutcome::AllNodesExhausted {
            attempted,
            last_error,
        } => Err(ResolveError::AllNodesExhausted {
            attempted,
            last_error,
        }),
    }
}

fn unwrap_envelope(payload: Value) -> Value {
    match payload {
        Value::Object(mut obj) if obj.contains_key("data") => {
            obj.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}
