//! Running external programs (uv, npx) on behalf of a tool.

use anyhow::{Context, Result, bail};
use std::path::Path;
use tokio::process::Command;
use tracing::debug;

/// Maximum output size in bytes. Anything beyond this is truncated.
pub const MAX_OUTPUT_BYTES: usize = 50_000;

/// Safe environment variables to pass through. Everything else is stripped.
const SAFE_ENV_VARS: &[&str] = &[
    "PATH",
    "HOME",
    "USER",
    "SHELL",
    "LANG",
    "LC_ALL",
    "TERM",
    "TZ",
    "TMPDIR",
    "XDG_CACHE_HOME",
    "UV_CACHE_DIR",
    "NPM_CONFIG_CACHE",
];

/// Captured output of a successful run.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Run `program args...` with a sanitized environment and wait for it.
///
/// A non-zero exit is an error carrying both streams.
pub async fn run_command(
    program: &str,
    args: &[&str],
    working_dir: Option<&Path>,
) -> Result<CommandOutput> {
    debug!(program, ?args, "spawning");

    let mut cmd = Command::new(program);
    cmd.args(args).env_clear().envs(filtered_env());
    if let Some(dir) = working_dir {
        cmd.current_dir(dir);
    }

    let output = cmd
        .output()
        .await
        .with_context(|| format!("failed to start {}", program))?;

    let stdout = truncate_output(&String::from_utf8_lossy(&output.stdout), MAX_OUTPUT_BYTES);
    let stderr = truncate_output(&String::from_utf8_lossy(&output.stderr), MAX_OUTPUT_BYTES);

    if !output.status.success() {
        bail!(
            "{} exited with code {}\nstdout: {}\nstderr: {}",
            program,
            output.status.code().unwrap_or(-1),
            stdout,
            stderr
        );
    }

    Ok(CommandOutput { stdout, stderr })
}

/// True if `program --version` runs successfully.
pub async fn is_available(program: &str) -> bool {
    run_command(program, &["--version"], None).await.is_ok()
}

fn filtered_env() -> Vec<(String, String)> {
    SAFE_ENV_VARS
        .iter()
        .filter_map(|key| std::env::var(key).ok().map(|val| (key.to_string(), val)))
        .collect()
}

fn truncate_output(output: &str, max_bytes: usize) -> String {
    if output.len() <= max_bytes {
        return output.to_string();
    }
    let mut end = max_bytes;
    while !output.is_char_boundary(end) {
        end -= 1;
    }
    format!(
        "{}\n\n[truncated: showing {}/{} bytes]",
        &output[..end],
        end,
        output.len()
    )
}
