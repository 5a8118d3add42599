use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ModelConfig;
use crate::prompts::select::build_select_system_prompt;

use super::{Embedder, FunctionSpec, Selection, Selector, UpstreamError, Vision};

/// Talks to an OpenAI-compatible API: function calling, vision and embeddings.
pub struct OpenAiClient {
    http: reqwest::Client,
    config: ModelConfig,
}

impl OpenAiClient {
    pub fn new(config: ModelConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// POST a JSON body and return the raw response text of a 2xx reply.
    async fn post<T: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
    ) -> Result<String, UpstreamError> {
        if !self.config.has_api_key() {
            return Err(UpstreamError::Other(
                "no API key configured. Set OPENAI_API_KEY or pass --api-key.".to_string(),
            ));
        }

        let resp = self
            .http
            .post(url)
            .bearer_auth(&self.config.api_key)
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(text)
    }

    fn parse_selection(body: &str) -> Result<Selection, UpstreamError> {
        let resp: ChatResponse = decode(body)?;
        let message = first_message(resp)?;

        log_stray_content(&message);

        let call = message
            .tool_calls
            .and_then(|calls| calls.into_iter().next())
            .map(|call| call.function)
            .or(message.function_call)
            .ok_or(UpstreamError::NoSelection)?;

        if call.name.trim().is_empty() {
            return Err(UpstreamError::NoSelection);
        }

        Ok(Selection {
            name: call.name,
            arguments: call.arguments,
        })
    }

    fn parse_text(body: &str) -> Result<String, UpstreamError> {
        let resp: ChatResponse = decode(body)?;
        let message = first_message(resp)?;
        match message.content {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(UpstreamError::Malformed(
                "model returned no text content".to_string(),
            )),
        }
    }

    fn parse_embeddings(body: &str, expected: usize) -> Result<Vec<Vec<f32>>, UpstreamError> {
        let mut resp: EmbeddingResponse = decode(body)?;
        if resp.data.len() != expected {
            return Err(UpstreamError::Malformed(format!(
                "expected {} embeddings, got {}",
                expected,
                resp.data.len()
            )));
        }
        resp.data.sort_by_key(|d| d.index);
        Ok(resp.data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl Selector for OpenAiClient {
    async fn select(
        &self,
        task: &str,
        manifest: &[FunctionSpec],
    ) -> Result<Selection, UpstreamError> {
        let system = build_select_system_prompt(manifest);
        let tools: Vec<ToolSpec> = manifest
            .iter()
            .map(|function| ToolSpec {
                kind: "function",
                function,
            })
            .collect();

        let body = ChatRequest {
            model: &self.config.chat_model,
            messages: vec![
                Message {
                    role: "system",
                    content: Content::Text(&system),
                },
                Message {
                    role: "user",
                    content: Content::Text(task),
                },
            ],
            tools: Some(tools.as_slice()),
            tool_choice: Some("required"),
        };

        let text = self.post(&self.config.chat_completions_url(), &body).await?;
        Self::parse_selection(&text)
    }
}

#[async_trait]
impl Vision for OpenAiClient {
    async fn read_image(
        &self,
        prompt: &str,
        image: &[u8],
        mime: &str,
    ) -> Result<String, UpstreamError> {
        let url = format!("data:{};base64,{}", mime, BASE64.encode(image));
        let body = ChatRequest {
            model: &self.config.chat_model,
            messages: vec![Message {
                role: "user",
                content: Content::Parts(vec![
                    Part::Text { text: prompt },
                    Part::ImageUrl {
                        image_url: ImageUrl { url },
                    },
                ]),
            }],
            tools: None,
            tool_choice: None,
        };

        let text = self.post(&self.config.chat_completions_url(), &body).await?;
        Self::parse_text(&text)
    }
}

#[async_trait]
impl Embedder for OpenAiClient {
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, UpstreamError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }
        let body = EmbeddingRequest {
            model: &self.config.embedding_model,
            input: inputs,
        };
        let text = self.post(&self.config.embeddings_url(), &body).await?;
        Self::parse_embeddings(&text, inputs.len())
    }
}

fn decode<'a, T: Deserialize<'a>>(body: &'a str) -> Result<T, UpstreamError> {
    serde_json::from_str(body).map_err(|e| UpstreamError::Malformed(format!("{}: {}", e, body)))
}

fn first_message(resp: ChatResponse) -> Result<ResponseMessage, UpstreamError> {
    resp.choices
        .into_iter()
        .next()
        .map(|choice| choice.message)
        .ok_or_else(|| UpstreamError::Malformed("response has no choices".to_string()))
}

fn log_stray_content(message: &ResponseMessage) {
    if let Some(content) = &message.content
        && !content.is_empty()
    {
        debug!(content = %content, "model replied with text alongside the call");
    }
}

// --- API types ---

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [ToolSpec<'a>]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'a str>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: Content<'a>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Content<'a> {
    Text(&'a str),
    Parts(Vec<Part<'a>>),
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Part<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Serialize)]
struct ToolSpec<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    function: &'a FunctionSpec,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<ToolCall>>,
    function_call: Option<FunctionCall>,
}

#[derive(Deserialize)]
struct ToolCall {
    function: FunctionCall,
}

#[derive(Deserialize)]
struct FunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}
