//! Protocol handler
//!
//! Validates a [`ToolRequest`] against the registry, runs the parsed call on
//! its own task and converts every outcome, including a panic, into a
//! [`ToolResult`]. Nothing here returns an error to the transport: one failed
//! call never takes the session down.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::any::Any;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use super::registry::ToolRegistry;
use crate::gitremote::config::ClientConfig;
use crate::gitremote::error::{ErrorKind, GitRemoteError, Result};
use crate::gitremote::github::GithubClient;
use crate::gitremote::inspector::RepositoryInspector;

/// A tool invocation as received from the transport
#[derive(Debug, Clone, Default)]
pub struct ToolRequest {
    pub name: String,
    pub arguments: Map<String, Value>,
}

impl ToolRequest {
    pub fn new(name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

/// Failure descriptor returned to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolFailure {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
}

impl From<GitRemoteError> for ToolFailure {
    fn from(err: GitRemoteError) -> Self {
        let (reset_at, retry_after_secs) = match &err {
            GitRemoteError::RateLimited {
                reset_at,
                retry_after,
                ..
            } => (Some(*reset_at), Some(retry_after.as_secs())),
            _ => (None, None),
        };
        Self {
            kind: err.kind(),
            message: err.to_string(),
            reset_at,
            retry_after_secs,
        }
    }
}

/// Outcome of one tool call; exactly one of payload or failure
#[derive(Debug, Clone)]
pub enum ToolResult {
    Success(Value),
    Failure(ToolFailure),
}

impl ToolResult {
    pub fn is_error(&self) -> bool {
        matches!(self, ToolResult::Failure(_))
    }

    /// The payload, or `{"error": {...}}` for a failure
    pub fn to_json(&self) -> Value {
        match self {
            ToolResult::Success(payload) => payload.clone(),
            ToolResult::Failure(failure) => json!({ "error": failure }),
        }
    }
}

impl From<Result<Value>> for ToolResult {
    fn from(result: Result<Value>) -> Self {
        match result {
            Ok(payload) => ToolResult::Success(payload),
            Err(err) => ToolResult::Failure(err.into()),
        }
    }
}

#[derive(Clone)]
pub struct ProtocolHandler {
    registry: Arc<ToolRegistry>,
    inspector: RepositoryInspector,
}

impl ProtocolHandler {
    pub fn new(inspector: RepositoryInspector) -> Self {
        Self {
            registry: Arc::new(ToolRegistry::new()),
            inspector,
        }
    }

    /// Builds the client, inspector and registry from one configuration
    pub fn from_config(config: ClientConfig) -> Result<Self> {
        let client = GithubClient::new(config)?;
        Ok(Self::new(RepositoryInspector::new(client)))
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn config(&self) -> &ClientConfig {
        self.inspector.client().config()
    }

    /// Handles one request end to end
    pub async fn handle(&self, request: ToolRequest) -> ToolResult {
        let started = Instant::now();
        let call = match self.registry.parse_call(&request) {
            Ok(call) => call,
            Err(err) => {
                tracing::warn!("Rejected call to '{}': {}", request.name, err);
                return ToolResult::Failure(err.into());
            }
        };

        let name = call.name();
        let inspector = self.inspector.clone();
        let result = run_isolated(name.as_ref(), async move { call.execute(&inspector).await }).await;

        match &result {
            Ok(_) => tracing::info!("Tool '{}' completed in {:?}", name, started.elapsed()),
            Err(err) => tracing::error!(
                "Tool '{}' failed after {:?}: {} ({})",
                name,
                started.elapsed(),
                err,
                err.kind()
            ),
        }
        result.into()
    }
}

/// Runs a handler future on its own task so a panic becomes an InternalError
pub(crate) async fn run_isolated<F>(tool: &str, handler: F) -> Result<Value>
where
    F: Future<Output = Result<Value>> + Send + 'static,
{
    match tokio::spawn(handler).await {
        Ok(result) => result,
        Err(join_err) if join_err.is_panic() => Err(GitRemoteError::Internal(format!(
            "tool '{}' panicked: {}",
            tool,
            panic_message(join_err.into_panic())
        ))),
        Err(join_err) => Err(GitRemoteError::Internal(format!(
            "tool '{}' was cancelled: {}",
            tool, join_err
        ))),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
