pub mod mock;
pub mod openai;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Describes a callable function so the model knows what's available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSpec {
    pub name: String,
    pub description: String,
    /// JSON-Schema of the argument object.
    pub parameters: serde_json::Value,
}

/// The model's choice: one function plus its arguments as raw JSON text.
///
/// Nothing guarantees the arguments fit the named function. The caller
/// must validate them.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub name: String,
    pub arguments: String,
}

/// Failures talking to the completion service. Never retried.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("request to model failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("model API error ({status}): {body}")]
    Status { status: u16, body: String },

    #[error("malformed model response: {0}")]
    Malformed(String),

    #[error("model did not select a function")]
    NoSelection,

    #[error("{0}")]
    Other(String),
}

/// Picks exactly one function for a task.
#[async_trait]
pub trait Selector: Send + Sync {
    async fn select(
        &self,
        task: &str,
        manifest: &[FunctionSpec],
    ) -> Result<Selection, UpstreamError>;
}

/// Reads text out of an image.
#[async_trait]
pub trait Vision: Send + Sync {
    async fn read_image(
        &self,
        prompt: &str,
        image: &[u8],
        mime: &str,
    ) -> Result<String, UpstreamError>;
}

/// Turns texts into embedding vectors, one per input, in input order.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, UpstreamError>;
}
