use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use serde_json::{Value, json};
use std::path::PathBuf;
use std::sync::LazyLock;

use super::{Tool, ToolError, parse_args, write_output};

static ANGLE_ADDRESS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<\s*([^<>@\s]+@[^<>@\s]+)\s*>").expect("valid regex"));

static BARE_ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}").expect("valid regex")
});

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Args {
    input_file: PathBuf,
    #[serde(default)]
    output_file: Option<PathBuf>,
}

/// The sender address from the first `From:` header of a message.
///
/// Folded header continuation lines are joined before matching.
pub fn sender_address(message: &str) -> Option<String> {
    let mut lines = message.lines().peekable();
    while let Some(line) = lines.next() {
        if line.trim().is_empty() {
            // End of the header block.
            break;
        }
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        if !name.trim().eq_ignore_ascii_case("from") {
            continue;
        }

        let mut value = value.to_string();
        while let Some(next) = lines.peek() {
            if next.starts_with(' ') || next.starts_with('\t') {
                value.push(' ');
                value.push_str(next.trim());
                lines.next();
            } else {
                break;
            }
        }

        if let Some(caps) = ANGLE_ADDRESS.captures(&value) {
            return Some(caps[1].to_string());
        }
        return BARE_ADDRESS.find(&value).map(|m| m.as_str().to_string());
    }
    None
}

/// Pulls the sender's address out of an email message.
pub struct SenderEmailTool;

impl SenderEmailTool {
    async fn run(args: Args) -> Result<String> {
        let message = tokio::fs::read_to_string(&args.input_file)
            .await
            .with_context(|| format!("failed to read {}", args.input_file.display()))?;

        let address = sender_address(&message)
            .ok_or_else(|| anyhow!("no sender address found in {}", args.input_file.display()))?;

        if let Some(output) = &args.output_file {
            write_output(output, &address).await?;
        }
        Ok(address)
    }
}

#[async_trait]
impl Tool for SenderEmailTool {
    fn name(&self) -> &str {
        "extract_sender_email"
    }

    fn description(&self) -> &str {
        "Extract the sender's email address from the From header of an email message file. Optionally writes the address to an output file."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "input_file": {"type": "string", "description": "File containing the email message"},
                "output_file": {"type": "string", "description": "Where to write the address"}
            },
            "required": ["input_file"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, args: Value) -> Result<Value, ToolError> {
        let args: Args = parse_args(args)?;
        let address = Self::run(args).await?;
        Ok(json!(address))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn angle_bracket_address() {
        let msg = "Delivered-To: me@example.com\nFrom: \"Jane Doe\" <jane.doe@example.org>\nSubject: hi\n\nbody";
        assert_eq!(sender_address(msg), Some("jane.doe@example.org".to_string()));
    }

    #[test]
    fn bare_address() {
        let msg = "from: bob@example.net\nTo: me@example.com\n\nhello";
        assert_eq!(sender_address(msg), Some("bob@example.net".to_string()));
    }

    #[test]
    fn folded_header() {
        let msg = "From: Very Long Name\n <long@example.com>\nTo: x@y.com\n\n";
        assert_eq!(sender_address(msg), Some("long@example.com".to_string()));
    }

    #[test]
    fn ignores_addresses_in_body() {
        let msg = "To: me@example.com\nSubject: no sender\n\nFrom: fake@example.com";
        assert_eq!(sender_address(msg), None);
    }

    #[test]
    fn ignores_to_header() {
        let msg = "To: someone@example.com\nFrom: real@example.com\n\n";
        assert_eq!(sender_address(msg), Some("real@example.com".to_string()));
    }

    #[tokio::test]
    async fn tool_writes_address() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("email.txt");
        let output = dir.path().join("email-sender.txt");
        std::fs::write(&input, "From: Ann <ann@example.com>\n\nHi").unwrap();

        let result = SenderEmailTool
            .execute(json!({"input_file": input, "output_file": output}))
            .await
            .unwrap();
        assert_eq!(result, json!("ann@example.com"));
        assert_eq!(std::fs::read_to_string(output).unwrap(), "ann@example.com");
    }

    #[tokio::test]
    async fn tool_fails_without_sender() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("email.txt");
        std::fs::write(&input, "Subject: none\n\n").unwrap();

        let err = SenderEmailTool
            .execute(json!({"input_file": input}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no sender address"));
    }
}
