use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::path::PathBuf;
use tracing::{debug, info};

use super::process::{is_available, run_command};
use super::{Tool, ToolError, parse_args};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Args {
    url: String,
    email: String,
    #[serde(default)]
    root: Option<PathBuf>,
}

/// Downloads a Python data-generation script and runs it with `uv`.
pub struct DatagenTool {
    http: reqwest::Client,
}

impl Default for DatagenTool {
    fn default() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }
}

impl DatagenTool {
    /// Install `uv` through pip when it is not already on PATH.
    async fn ensure_uv() -> Result<()> {
        if is_available("uv").await {
            return Ok(());
        }
        info!("uv not found, installing with pip");
        run_command("python3", &["-m", "pip", "install", "--user", "uv"], None)
            .await
            .context("failed to install uv")?;
        if !is_available("uv").await {
            bail!("uv was installed but is still not on PATH");
        }
        Ok(())
    }

    async fn download(&self, url: &str) -> Result<String> {
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .with_context(|| format!("failed to download {}", url))?;
        if !resp.status().is_success() {
            bail!("download of {} failed with status {}", url, resp.status());
        }
        Ok(resp.text().await?)
    }

    async fn run(&self, args: Args) -> Result<String> {
        if !(args.url.starts_with("https://") || args.url.starts_with("http://")) {
            bail!("url must be http(s): {}", args.url);
        }
        if !args.email.contains('@') {
            bail!("not an email address: {}", args.email);
        }

        Self::ensure_uv().await?;
        let script = self.download(&args.url).await?;

        let workdir = tempfile::tempdir().context("failed to create temp dir")?;
        let script_path = workdir.path().join("datagen.py");
        tokio::fs::write(&script_path, script).await?;

        let script_arg = script_path.to_string_lossy().to_string();
        let root_arg = args.root.as_ref().map(|r| r.to_string_lossy().to_string());

        let mut cmd_args = vec!["run", script_arg.as_str(), args.email.as_str()];
        if let Some(root) = &root_arg {
            cmd_args.push("--root");
            cmd_args.push(root.as_str());
        }

        let output = run_command("uv", &cmd_args, Some(workdir.path())).await?;
        if !output.stderr.is_empty() {
            debug!(stderr = %output.stderr, "datagen script stderr");
        }
        Ok(output.stdout)
    }
}

#[async_trait]
impl Tool for DatagenTool {
    fn name(&self) -> &str {
        "run_datagen_script"
    }

    fn description(&self) -> &str {
        "Install uv if needed, download the Python data-generation script at a URL, and run it with the given email address as its argument."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "url": {"type": "string", "description": "URL of the datagen.py script"},
                "email": {"type": "string", "description": "Email address passed to the script"},
                "root": {"type": "string", "description": "Optional data root passed as --root"}
            },
            "required": ["url", "email"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, args: Value) -> Result<Value, ToolError> {
        let args: Args = parse_args(args)?;
        let stdout = self.run(args).await?;
        Ok(json!(stdout))
    }
}
