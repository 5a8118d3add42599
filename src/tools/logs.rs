use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use futures::future::try_join_all;
use serde::Deserialize;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::{Tool, ToolError, parse_args, write_output};

fn default_count() -> usize {
    10
}

fn default_extension() -> String {
    "log".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Args {
    logs_dir: PathBuf,
    output_file: PathBuf,
    #[serde(default = "default_count")]
    count: usize,
    #[serde(default = "default_extension")]
    extension: String,
}

/// The `count` most recently modified files in `dir` with `extension`, newest first.
pub async fn most_recent_files(dir: &Path, extension: &str, count: usize) -> Result<Vec<PathBuf>> {
    let extension = extension.trim_start_matches('.');
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .with_context(|| format!("failed to list {}", dir.display()))?;

    let mut files: Vec<(SystemTime, PathBuf)> = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(extension) {
            continue;
        }
        let meta = entry.metadata().await?;
        if !meta.is_file() {
            continue;
        }
        files.push((meta.modified()?, path));
    }

    // Newest first; ties broken by name so output is deterministic.
    files.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
    Ok(files.into_iter().take(count).map(|(_, p)| p).collect())
}

/// First line of a file without its line terminator. Empty files give "".
pub async fn first_line(path: &Path) -> Result<String> {
    let file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("failed to open {}", path.display()))?;
    let mut lines = BufReader::new(file).lines();
    Ok(lines.next_line().await?.unwrap_or_default())
}

/// Collects the first line of the newest log files into one file.
pub struct RecentLogsTool;

impl RecentLogsTool {
    async fn run(args: Args) -> Result<Vec<String>> {
        if args.count == 0 {
            bail!("count must be at least 1");
        }

        let files = most_recent_files(&args.logs_dir, &args.extension, args.count).await?;
        let lines = try_join_all(files.iter().map(|f| first_line(f))).await?;

        let mut out = lines.join("\n");
        if !out.is_empty() {
            out.push('\n');
        }
        write_output(&args.output_file, &out).await?;
        Ok(lines)
    }
}

#[async_trait]
impl Tool for RecentLogsTool {
    fn name(&self) -> &str {
        "write_most_recent_log_first_lines"
    }

    fn description(&self) -> &str {
        "Write the first line of the most recently modified log files in a directory (newest first, default 10 files) to an output file."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "logs_dir": {"type": "string", "description": "Directory containing the log files"},
                "output_file": {"type": "string", "description": "Where to write the collected lines"},
                "count": {"type": "integer", "minimum": 1, "description": "How many files to take"},
                "extension": {"type": "string", "description": "File extension to match, default log"}
            },
            "required": ["logs_dir", "output_file"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, args: Value) -> Result<Value, ToolError> {
        let args: Args = parse_args(args)?;
        let lines = Self::run(args).await?;
        Ok(json!(lines))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::time::Duration;

    fn write_with_mtime(dir: &Path, name: &str, content: &str, age_secs: u64) {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        let mtime = SystemTime::now() - Duration::from_secs(age_secs);
        File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(mtime)
            .unwrap();
    }

    #[tokio::test]
    async fn picks_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        write_with_mtime(dir.path(), "old.log", "old first\nold second\n", 300);
        write_with_mtime(dir.path(), "new.log", "new first\n", 10);
        write_with_mtime(dir.path(), "mid.log", "mid first\n", 100);
        write_with_mtime(dir.path(), "ignored.txt", "nope\n", 1);

        let files = most_recent_files(dir.path(), "log", 2).await.unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["new.log", "mid.log"]);
    }

    #[tokio::test]
    async fn first_line_of_empty_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.log");
        fs::write(&path, "").unwrap();
        assert_eq!(first_line(&path).await.unwrap(), "");
    }

    #[tokio::test]
    async fn tool_writes_first_lines() {
        let dir = tempfile::tempdir().unwrap();
        let logs = dir.path().join("logs");
        fs::create_dir(&logs).unwrap();
        write_with_mtime(&logs, "a.log", "alpha\nmore\n", 30);
        write_with_mtime(&logs, "b.log", "beta\n", 20);
        write_with_mtime(&logs, "c.log", "gamma\r\nmore\n", 10);
        let output = dir.path().join("logs-recent.txt");

        let result = RecentLogsTool
            .execute(json!({"logs_dir": logs, "output_file": output, "count": 2}))
            .await
            .unwrap();

        assert_eq!(result, json!(["gamma", "beta"]));
        assert_eq!(fs::read_to_string(output).unwrap(), "gamma\nbeta\n");
    }

    #[tokio::test]
    async fn tool_fails_on_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let err = RecentLogsTool
            .execute(json!({
                "logs_dir": dir.path().join("nope"),
                "output_file": dir.path().join("out.txt"),
            }))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Failed(_)));
    }
}
