use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use errand::config::{ModelConfig, ServerConfig};
use errand::consts::{
    DEFAULT_API_BASE, DEFAULT_CHAT_MODEL, DEFAULT_EMBEDDING_MODEL, DEFAULT_HOST, DEFAULT_PORT,
    DEFAULT_READ_ROOT,
};
use errand::engine::Engine;
use errand::engine::dispatch::DispatchEngine;
use errand::files::FileReader;
use errand::llm::openai::OpenAiClient;
use errand::server::{self, AppState};
use errand::tools::{ToolContext, ToolRegistry};

#[derive(Parser)]
#[command(
    name = "errand",
    version,
    about = "Send a task in plain words, let a model pick the script, run it."
)]
struct Cli {
    /// Address to listen on
    #[arg(long, env = "ERRAND_HOST", default_value = DEFAULT_HOST)]
    host: IpAddr,

    /// Port to listen on
    #[arg(short, long, env = "ERRAND_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Base URL of the OpenAI-compatible API
    #[arg(long, env = "OPENAI_API_URL", default_value = DEFAULT_API_BASE)]
    api_base: String,

    /// API key for the completion service
    #[arg(long, env = "OPENAI_API_KEY", default_value = "", hide_env_values = true)]
    api_key: String,

    /// Chat model used to pick functions and read images
    #[arg(short, long, env = "ERRAND_MODEL", default_value = DEFAULT_CHAT_MODEL)]
    model: String,

    /// Embedding model used by the similarity utility
    #[arg(long, env = "ERRAND_EMBEDDING_MODEL", default_value = DEFAULT_EMBEDDING_MODEL)]
    embedding_model: String,

    /// Directory `/read` is confined to. It must exist at startup; use / to allow any path
    #[arg(long, env = "ERRAND_READ_ROOT", default_value = DEFAULT_READ_ROOT)]
    read_root: PathBuf,

    /// Default log filter when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .init();

    let model_config = ModelConfig {
        api_base: cli.api_base,
        api_key: cli.api_key,
        chat_model: cli.model,
        embedding_model: cli.embedding_model,
    };
    if !model_config.has_api_key() {
        warn!("no API key configured; /run will fail until OPENAI_API_KEY is set");
    }
    info!(
        api_base = %model_config.api_base,
        model = %model_config.chat_model,
        embedding_model = %model_config.embedding_model,
        "model client configured"
    );

    let client = Arc::new(OpenAiClient::new(model_config));

    let tools = Arc::new(ToolRegistry::standard(ToolContext {
        vision: client.clone(),
        embedder: client.clone(),
    }));
    info!(functions = ?tools.names(), "registered {} functions", tools.len());

    let server_config = ServerConfig {
        addr: SocketAddr::new(cli.host, cli.port),
        read_root: (cli.read_root != Path::new("/")).then_some(cli.read_root),
    };

    let files = match &server_config.read_root {
        Some(root) => {
            let reader = FileReader::confined(root).with_context(|| {
                format!(
                    "read root {} is not accessible; pass --read-root (or ERRAND_READ_ROOT) \
                     with an existing directory, or / to allow any path",
                    root.display()
                )
            })?;
            info!(root = %root.display(), "/read confined");
            reader
        }
        None => {
            warn!("/read is unrestricted");
            FileReader::unrestricted()
        }
    };

    let engine: Arc<dyn Engine> = Arc::new(DispatchEngine::new(client, tools.clone()));

    let state = AppState {
        engine,
        tools,
        files,
    };

    server::serve(&server_config, state).await
}
