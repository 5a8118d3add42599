use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::{Tool, ToolError, parse_args, write_output};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Args {
    docs_dir: PathBuf,
    output_file: PathBuf,
}

/// Text of the first level-one heading, skipping fenced code blocks.
pub fn first_h1(markdown: &str) -> Option<String> {
    let mut in_fence = false;
    for line in markdown.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }
        if let Some(title) = trimmed.strip_prefix("# ") {
            let title = title.trim().trim_end_matches('#').trim_end();
            if !title.is_empty() {
                return Some(title.to_string());
            }
        }
    }
    None
}

/// Relative path (forward slashes) → title for every `.md` file under `root`.
pub fn collect_titles(root: &Path) -> Result<BTreeMap<String, String>> {
    let mut titles = BTreeMap::new();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.with_context(|| format!("failed to walk {}", root.display()))?;
        let path = entry.path();
        if !entry.file_type().is_file()
            || path.extension().and_then(|e| e.to_str()) != Some("md")
        {
            continue;
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let Some(title) = first_h1(&content) else {
            continue;
        };

        let relative = path
            .strip_prefix(root)
            .unwrap_or(path)
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        titles.insert(relative, title);
    }
    Ok(titles)
}

/// Builds a JSON index of markdown titles.
pub struct MarkdownTitlesTool;

impl MarkdownTitlesTool {
    async fn run(args: Args) -> Result<usize> {
        let root = args.docs_dir.clone();
        let titles = tokio::task::spawn_blocking(move || collect_titles(&root)).await??;

        let out = serde_json::to_string_pretty(&titles)?;
        write_output(&args.output_file, &out).await?;
        Ok(titles.len())
    }
}

#[async_trait]
impl Tool for MarkdownTitlesTool {
    fn name(&self) -> &str {
        "extract_titles_from_markdown_files"
    }

    fn description(&self) -> &str {
        "Find every Markdown file under a directory, take the first level-one heading of each, and write a JSON index mapping the relative file path to its title."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "docs_dir": {"type": "string", "description": "Directory to search recursively"},
                "output_file": {"type": "string", "description": "Where to write the JSON index"}
            },
            "required": ["docs_dir", "output_file"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, args: Value) -> Result<Value, ToolError> {
        let args: Args = parse_args(args)?;
        let count = Self::run(args).await?;
        Ok(json!(count))
    }
}
