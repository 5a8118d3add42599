pub mod contacts;
pub mod datagen;
pub mod email;
pub mod logs;
pub mod markdown;
pub mod ocr;
pub mod prettier;
pub mod process;
pub mod similarity;
pub mod tickets;
pub mod weekday;

use anyhow::Context as _;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::llm::{Embedder, FunctionSpec, Vision};

/// Why a tool call did not produce a value.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// The argument object does not fit the tool's schema. Nothing ran.
    #[error("invalid arguments: {0}")]
    InvalidArguments(#[source] serde_json::Error),

    /// The tool ran and failed.
    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

/// A locally defined utility the model can choose.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    /// JSON-Schema of the argument object.
    fn parameters(&self) -> Value;
    async fn execute(&self, args: Value) -> Result<Value, ToolError>;

    fn spec(&self) -> FunctionSpec {
        FunctionSpec {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters(),
        }
    }
}

/// Decode a model-supplied argument object into a tool's typed arguments.
pub fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T, ToolError> {
    serde_json::from_value(args).map_err(ToolError::InvalidArguments)
}

/// Write a tool's output file, creating parent directories as needed.
pub async fn write_output(path: &Path, contents: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    tokio::fs::write(path, contents)
        .await
        .with_context(|| format!("failed to write {}", path.display()))
}

/// Model-backed capabilities some tools need.
#[derive(Clone)]
pub struct ToolContext {
    pub vision: Arc<dyn Vision>,
    pub embedder: Arc<dyn Embedder>,
}

/// Name → tool. Built once at startup, read-only afterwards.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Every utility this service ships with.
    pub fn standard(ctx: ToolContext) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(datagen::DatagenTool::default()));
        registry.register(Arc::new(prettier::PrettierTool));
        registry.register(Arc::new(weekday::WeekdayCountTool));
        registry.register(Arc::new(contacts::SortContactsTool));
        registry.register(Arc::new(logs::RecentLogsTool));
        registry.register(Arc::new(markdown::MarkdownTitlesTool));
        registry.register(Arc::new(email::SenderEmailTool));
        registry.register(Arc::new(ocr::ImageNumberTool::new(ctx.vision)));
        registry.register(Arc::new(similarity::SimilarCommentsTool::new(ctx.embedder)));
        registry.register(Arc::new(tickets::TicketSalesTool));
        registry
    }

    /// Add a tool, replacing any tool with the same name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        self.tools.insert(name, tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// What the model is offered, sorted by name so prompts are stable.
    pub fn manifest(&self) -> Vec<FunctionSpec> {
        let mut specs: Vec<FunctionSpec> = self.tools.values().map(|t| t.spec()).collect();
        specs.sort_by(|a, b| a.name.cmp(&b.name));
        specs
    }
}
