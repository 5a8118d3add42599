//! Project-wide constants.

pub const AUTHOR: &str = env!("CARGO_PKG_AUTHORS");
pub const REPO: &str = env!("CARGO_PKG_REPOSITORY");
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// OpenAI-compatible API base used when none is configured.
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1/";

/// Chat model used for function selection and image reading.
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";

/// Model used by the similarity utility.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8000;

/// `/read` refuses anything outside this directory unless overridden.
pub const DEFAULT_READ_ROOT: &str = "/data";
