use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::path::PathBuf;
use std::sync::Arc;

use crate::llm::Embedder;

use super::{Tool, ToolError, parse_args, write_output};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Args {
    input_file: PathBuf,
    #[serde(default)]
    output_file: Option<PathBuf>,
}

/// The closest pair of entries, in the order they appear in the input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarPair {
    pub first: String,
    pub second: String,
    pub score: f32,
}

/// Cosine similarity. Zero-length vectors score 0.
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Indices `(i, j)`, `i < j`, of the most similar pair and its score.
/// The earliest pair wins ties.
pub fn most_similar(vectors: &[Vec<f32>]) -> Option<(usize, usize, f32)> {
    let mut best: Option<(usize, usize, f32)> = None;
    for i in 0..vectors.len() {
        for j in (i + 1)..vectors.len() {
            let score = cosine(&vectors[i], &vectors[j]);
            if best.is_none_or(|(_, _, top)| score > top) {
                best = Some((i, j, score));
            }
        }
    }
    best
}

/// Finds the two most semantically similar lines of a file.
pub struct SimilarCommentsTool {
    embedder: Arc<dyn Embedder>,
}

impl SimilarCommentsTool {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder }
    }

    async fn run(&self, args: Args) -> Result<SimilarPair> {
        let content = tokio::fs::read_to_string(&args.input_file)
            .await
            .with_context(|| format!("failed to read {}", args.input_file.display()))?;
        let comments: Vec<String> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect();

        if comments.len() < 2 {
            bail!(
                "need at least two non-empty lines, found {}",
                comments.len()
            );
        }

        let vectors = self
            .embedder
            .embed(&comments)
            .await
            .context("embedding request failed")?;
        if vectors.len() != comments.len() {
            bail!(
                "embedder returned {} vectors for {} lines",
                vectors.len(),
                comments.len()
            );
        }

        let Some((i, j, score)) = most_similar(&vectors) else {
            bail!("no pair to compare");
        };
        let pair = SimilarPair {
            first: comments[i].clone(),
            second: comments[j].clone(),
            score,
        };

        if let Some(output) = &args.output_file {
            write_output(output, &format!("{}\n{}\n", pair.first, pair.second)).await?;
        }
        Ok(pair)
    }
}

#[async_trait]
impl Tool for SimilarCommentsTool {
    fn name(&self) -> &str {
        "get_similar_comments"
    }

    fn description(&self) -> &str {
        "Find the two most similar lines in a text file (one comment per line) using embeddings. Optionally writes the pair, one per line, to an output file."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "input_file": {"type": "string", "description": "File with one comment per line"},
                "output_file": {"type": "string", "description": "Where to write the most similar pair"}
            },
            "required": ["input_file"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, args: Value) -> Result<Value, ToolError> {
        let args: Args = parse_args(args)?;
        let pair = self.run(args).await?;
        Ok(json!(pair))
    }
}
