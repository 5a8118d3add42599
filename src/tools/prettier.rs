use anyhow::{Result, bail};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::path::PathBuf;

use super::process::run_command;
use super::{Tool, ToolError, parse_args};

const DEFAULT_PRETTIER_VERSION: &str = "3.4.2";

fn default_version() -> String {
    DEFAULT_PRETTIER_VERSION.to_string()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Args {
    file_path: PathBuf,
    #[serde(default = "default_version")]
    prettier_version: String,
}

/// A version string safe to splice into `prettier@<version>`.
fn is_valid_version(version: &str) -> bool {
    !version.is_empty()
        && version
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '~'))
}

/// Formats a file in place with a pinned prettier via npx.
pub struct PrettierTool;

impl PrettierTool {
    async fn run(args: Args) -> Result<String> {
        if !is_valid_version(&args.prettier_version) {
            bail!("invalid prettier version: {:?}", args.prettier_version);
        }
        if !tokio::fs::metadata(&args.file_path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
        {
            bail!("file not found: {}", args.file_path.display());
        }

        let package = format!("prettier@{}", args.prettier_version);
        let file = args.file_path.to_string_lossy().to_string();
        run_command("npx", &["--yes", &package, "--write", &file], None).await?;

        Ok(file)
    }
}

#[async_trait]
impl Tool for PrettierTool {
    fn name(&self) -> &str {
        "format_file_with_prettier"
    }

    fn description(&self) -> &str {
        "Format a file in place with prettier (default version 3.4.2) using npx."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "file_path": {"type": "string", "description": "File to format in place"},
                "prettier_version": {"type": "string", "description": "prettier version, default 3.4.2"}
            },
            "required": ["file_path"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, args: Value) -> Result<Value, ToolError> {
        let args: Args = parse_args(args)?;
        let file = Self::run(args).await?;
        Ok(json!(file))
    }
}
