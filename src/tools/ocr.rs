use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::llm::Vision;
use crate::prompts::vision::READ_NUMBER_PROMPT;

use super::{Tool, ToolError, parse_args, write_output};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Args {
    image_path: PathBuf,
    #[serde(default)]
    output_file: Option<PathBuf>,
}

/// MIME type from the file extension. Unknown extensions are sent as PNG.
pub fn mime_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "image/png",
    }
}

/// Keep only ASCII digits.
pub fn digits_only(text: &str) -> String {
    text.chars().filter(char::is_ascii_digit).collect()
}

/// Reads the number shown in an image with the vision model.
pub struct ImageNumberTool {
    vision: Arc<dyn Vision>,
}

impl ImageNumberTool {
    pub fn new(vision: Arc<dyn Vision>) -> Self {
        Self { vision }
    }

    async fn run(&self, args: Args) -> Result<String> {
        let image = tokio::fs::read(&args.image_path)
            .await
            .with_context(|| format!("failed to read {}", args.image_path.display()))?;

        let reply = self
            .vision
            .read_image(READ_NUMBER_PROMPT, &image, mime_for(&args.image_path))
            .await
            .context("vision model call failed")?;
        debug!(reply = %reply, "vision reply");

        let number = digits_only(&reply);
        if number.is_empty() {
            bail!("no digits found in the model's reading of the image");
        }

        if let Some(output) = &args.output_file {
            write_output(output, &number).await?;
        }
        Ok(number)
    }
}

#[async_trait]
impl Tool for ImageNumberTool {
    fn name(&self) -> &str {
        "extract_numbers_from_image"
    }

    fn description(&self) -> &str {
        "Read the long number printed in an image (for example a card number) and return it as digits without spaces. Optionally writes it to an output file."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "image_path": {"type": "string", "description": "Path to the image"},
                "output_file": {"type": "string", "description": "Where to write the digits"}
            },
            "required": ["image_path"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, args: Value) -> Result<Value, ToolError> {
        let args: Args = parse_args(args)?;
        let number = self.run(args).await?;
        Ok(json!(number))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::mock::MockVision;

    #[test]
    fn mime_from_extension() {
        assert_eq!(mime_for(Path::new("/data/card.PNG")), "image/png");
        assert_eq!(mime_for(Path::new("/data/card.jpeg")), "image/jpeg");
        assert_eq!(mime_for(Path::new("/data/card")), "image/png");
    }

    #[test]
    fn strips_non_digits() {
        assert_eq!(digits_only("4026 3992 1234 5678\n"), "4026399212345678");
        assert_eq!(digits_only("none"), "");
    }

    #[tokio::test]
    async fn tool_writes_digits() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("credit-card.png");
        let output = dir.path().join("credit-card.txt");
        std::fs::write(&image, [0x89, b'P', b'N', b'G']).unwrap();

        let tool = ImageNumberTool::new(Arc::new(MockVision::replying("4111 1111 1111 1111")));
        let result = tool
            .execute(json!({"image_path": image, "output_file": output}))
            .await
            .unwrap();

        assert_eq!(result, json!("4111111111111111"));
        assert_eq!(std::fs::read_to_string(output).unwrap(), "4111111111111111");
    }

    #[tokio::test]
    async fn tool_fails_when_reply_has_no_digits() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("blank.png");
        std::fs::write(&image, [0u8; 4]).unwrap();

        let tool = ImageNumberTool::new(Arc::new(MockVision::replying("I can't read that")));
        let err = tool.execute(json!({"image_path": image})).await.unwrap_err();
        assert!(err.to_string().contains("no digits"));
    }

    #[tokio::test]
    async fn tool_surfaces_vision_failure() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("card.png");
        std::fs::write(&image, [0u8; 4]).unwrap();

        let tool = ImageNumberTool::new(Arc::new(MockVision::failing("rate limited")));
        let err = tool.execute(json!({"image_path": image})).await.unwrap_err();
        assert!(matches!(err, ToolError::Failed(_)));
    }
}
