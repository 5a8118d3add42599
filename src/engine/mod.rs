pub mod dispatch;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::llm::UpstreamError;

/// What was invoked for a task, and what it returned.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Invocation {
    pub function: String,
    pub arguments: Value,
    pub result: Value,
}

/// The five ways a task can fail to run. Each maps to one HTTP status.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("arguments for {function} are not a JSON object: {reason}")]
    ArgumentDecode { function: String, reason: String },

    #[error("unknown function: {0}")]
    UnknownFunction(String),

    #[error("arguments do not fit {function}: {source}")]
    InvalidArguments {
        function: String,
        source: serde_json::Error,
    },

    #[error("{function} failed: {cause:#}")]
    Invocation {
        function: String,
        cause: anyhow::Error,
    },
}

/// The outermost boundary. The HTTP layer only knows this trait.
#[async_trait]
pub trait Engine: Send + Sync {
    async fn run(&self, task: &str) -> Result<Invocation, DispatchError>;
}
