use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::{DispatchError, Engine, Invocation};
use crate::llm::Selector;
use crate::tools::{ToolError, ToolRegistry};

/// One task, one model query, at most one function call.
pub struct DispatchEngine {
    selector: Arc<dyn Selector>,
    tools: Arc<ToolRegistry>,
}

impl DispatchEngine {
    pub fn new(selector: Arc<dyn Selector>, tools: Arc<ToolRegistry>) -> Self {
        Self { selector, tools }
    }
}

/// Decode the model's argument text. Empty text means no arguments.
fn decode_arguments(function: &str, raw: &str) -> Result<Value, DispatchError> {
    if raw.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(value @ Value::Object(_)) => Ok(value),
        Ok(other) => Err(DispatchError::ArgumentDecode {
            function: function.to_string(),
            reason: format!("expected an object, got {}", other),
        }),
        Err(e) => Err(DispatchError::ArgumentDecode {
            function: function.to_string(),
            reason: e.to_string(),
        }),
    }
}

/// `k='v', ...` for log lines.
fn render_arguments(arguments: &Value) -> String {
    match arguments.as_object() {
        Some(map) => map
            .iter()
            .map(|(k, v)| match v {
                Value::String(s) => format!("{}='{}'", k, s),
                other => format!("{}={}", k, other),
            })
            .collect::<Vec<_>>()
            .join(", "),
        None => arguments.to_string(),
    }
}

#[async_trait]
impl Engine for DispatchEngine {
    async fn run(&self, task: &str) -> Result<Invocation, DispatchError> {
        info!(task, "task received");

        let manifest = self.tools.manifest();
        let selection = self.selector.select(task, &manifest).await.map_err(|e| {
            error!(error = %e, "model query failed");
            DispatchError::from(e)
        })?;

        let Some(tool) = self.tools.get(&selection.name) else {
            error!(function = %selection.name, "model selected an unknown function");
            return Err(DispatchError::UnknownFunction(selection.name));
        };

        let arguments = decode_arguments(&selection.name, &selection.arguments).inspect_err(|e| {
            warn!(function = %selection.name, raw = %selection.arguments, error = %e, "bad arguments from model");
        })?;

        info!(
            "calling function: {}({})",
            selection.name,
            render_arguments(&arguments)
        );

        match tool.execute(arguments.clone()).await {
            Ok(result) => Ok(Invocation {
                function: selection.name,
                arguments,
                result,
            }),
            Err(ToolError::InvalidArguments(source)) => {
                warn!(function = %selection.name, error = %source, "arguments do not fit the function");
                Err(DispatchError::InvalidArguments {
                    function: selection.name,
                    source,
                })
            }
            Err(ToolError::Failed(cause)) => {
                error!(function = %selection.name, error = %format!("{:#}", cause), "function call failed");
                Err(DispatchError::Invocation {
                    function: selection.name,
                    cause,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_arguments_become_empty_object() {
        assert_eq!(decode_arguments("f", "  ").unwrap(), json!({}));
    }

    #[test]
    fn object_arguments_pass_through() {
        assert_eq!(
            decode_arguments("f", r#"{"a": 1}"#).unwrap(),
            json!({"a": 1})
        );
    }

    #[test]
    fn non_object_arguments_rejected() {
        let err = decode_arguments("f", "[1, 2]").unwrap_err();
        assert!(matches!(err, DispatchError::ArgumentDecode { .. }));
        assert!(err.to_string().contains("expected an object"));
    }

    #[test]
    fn invalid_json_rejected() {
        let err = decode_arguments("f", "{weekday: Monday}").unwrap_err();
        assert!(matches!(err, DispatchError::ArgumentDecode { ref function, .. } if function == "f"));
    }

    #[test]
    fn renders_arguments_for_logs() {
        let rendered = render_arguments(&json!({"a": "x", "b": 2}));
        assert_eq!(rendered, "a='x', b=2");
    }
}
