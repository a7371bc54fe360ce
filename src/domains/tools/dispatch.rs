//! The dispatcher: resolves a (tool, action) pair, validates parameters,
//! invokes the handler, and wraps every outcome in a response envelope.
//!
//! The dispatcher is stateless and performs no I/O of its own; it only
//! reads the registry. Each call runs independently and concurrently with
//! others, with no cross-call ordering and no dispatcher-level timeout.

use serde::Serialize;
use serde_json::Value;
use tracing::{info, instrument, warn};

use super::error::ToolError;
use super::params::Parameters;
use super::registry::{RegistryError, ToolRegistry};
use super::validate::validate;

/// Failures produced on the dispatch path, as data.
#[derive(Debug)]
pub enum DispatchError {
    /// No tool name was supplied.
    MissingTool,
    /// No action name was supplied.
    MissingAction,
    /// Registry resolution failed (unknown tool or action).
    Registry(RegistryError),
    /// Validation or handler failure.
    Tool(ToolError),
}

impl DispatchError {
    /// Stable kind published in the envelope's `error.type` field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingTool => "MissingTool",
            Self::MissingAction => "MissingAction",
            Self::Registry(err) => err.kind(),
            Self::Tool(err) => err.kind(),
        }
    }

    /// Human-readable message for the envelope.
    pub fn message(&self) -> String {
        match self {
            Self::MissingTool => "Tool name is required".to_string(),
            Self::MissingAction => "Action is required".to_string(),
            Self::Registry(err) => err.to_string(),
            Self::Tool(err) => err.to_string(),
        }
    }

}

impl From<RegistryError> for DispatchError {
    fn from(err: RegistryError) -> Self {
        Self::Registry(err)
    }
}

impl From<ToolError> for DispatchError {
    fn from(err: ToolError) -> Self {
        Self::Tool(err)
    }
}

/// Error payload of an envelope.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    /// Taxonomy kind; stable and programmatically matchable.
    #[serde(rename = "type")]
    pub kind: String,
    /// Descriptive message for debugging.
    pub message: String,
}

/// The uniform success/error wrapper returned by every dispatch call.
///
/// `tool` and `action` are echoed as received (possibly null); `result` is
/// present iff `status` is `success`, `error` iff `status` is `error`.
#[derive(Debug, Serialize)]
pub struct ResponseEnvelope {
    pub tool: Option<String>,
    pub action: Option<String>,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl ResponseEnvelope {
    /// Wrap a successful handler result.
    pub fn success(tool: &str, action: &str, result: Value) -> Self {
        Self {
            tool: Some(tool.to_string()),
            action: Some(action.to_string()),
            status: "success",
            result: Some(result),
            error: None,
        }
    }

    /// Wrap a dispatch failure, echoing tool/action as received.
    pub fn failure(tool: Option<&str>, action: Option<&str>, err: &DispatchError) -> Self {
        Self {
            tool: tool.map(str::to_string),
            action: action.map(str::to_string),
            status: "error",
            result: None,
            error: Some(ErrorBody {
                kind: err.kind().to_string(),
                message: err.message(),
            }),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == "success"
    }

    /// Taxonomy kind of the error, when this is an error envelope.
    pub fn error_kind(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.kind.as_str())
    }
}

/// Resolve, validate, and invoke a known (tool, action) pair.
///
/// This is the shared pipeline behind both the gateway envelope path and
/// the per-tool direct routes, so both go through the same validation and
/// the same handler. The handler is invoked at most once.
pub async fn run(
    registry: &ToolRegistry,
    tool: &str,
    action: &str,
    params: Parameters,
) -> Result<Value, DispatchError> {
    let spec = registry.resolve(tool, action)?;
    let validated = validate(spec, params)?;
    spec.invoke(validated).await.map_err(DispatchError::from)
}

/// Dispatch a gateway request, producing exactly one envelope.
///
/// Steps, in order: missing-tool check (terminal, no lookup attempted),
/// missing-action check, registry resolution, validation, handler
/// invocation. Every code path ends in an envelope; no fault propagates to
/// the caller.
#[instrument(skip(registry, params))]
pub async fn dispatch(
    registry: &ToolRegistry,
    tool: Option<&str>,
    action: Option<&str>,
    params: Parameters,
) -> ResponseEnvelope {
    let tool_name = match tool.filter(|t| !t.is_empty()) {
        Some(t) => t,
        None => return ResponseEnvelope::failure(tool, action, &DispatchError::MissingTool),
    };

    let action_name = match action.filter(|a| !a.is_empty()) {
        Some(a) => a,
        None => return ResponseEnvelope::failure(tool, action, &DispatchError::MissingAction),
    };

    info!("Dispatching {}/{}", tool_name, action_name);

    match run(registry, tool_name, action_name, params).await {
        Ok(result) => ResponseEnvelope::success(tool_name, action_name, result),
        Err(err) => {
            warn!(
                "Dispatch of {}/{} failed: {} ({})",
                tool_name,
                action_name,
                err.message(),
                err.kind()
            );
            ResponseEnvelope::failure(Some(tool_name), Some(action_name), &err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::spec::{ActionSpec, ParamType};
    use serde_json::json;

    fn test_registry() -> ToolRegistry {
        let mut builder = ToolRegistry::builder();
        builder
            .register(
                "echo",
                ActionSpec::builder("say", "Echo a message")
                    .required("message", ParamType::String, "Message to echo")
                    .with_default("repeat", ParamType::Number, "Repeat count", json!(1))
                    .returns("object", "Echoed message")
                    .handler(|params| async move {
                        let message = params.require_str("message")?.to_string();
                        let repeat = params.u64_or("repeat", 1);
                        Ok(json!({ "message": message, "repeat": repeat }))
                    }),
            )
            .unwrap();
        builder
            .register(
                "echo",
                ActionSpec::builder("fail", "Always fails")
                    .returns("object", "Never returned")
                    .handler(|_| async { Err(ToolError::backend_status(502, "upstream down")) }),
            )
            .unwrap();
        builder.build()
    }

    #[tokio::test]
    async fn test_dispatch_success() {
        let registry = test_registry();
        let params = Parameters::from_value(json!({"message": "hi"}));
        let envelope = dispatch(&registry, Some("echo"), Some("say"), params).await;
        assert!(envelope.is_success());
        assert_eq!(envelope.result.as_ref().unwrap()["message"], "hi");
        // default substituted by validation before the handler ran
        assert_eq!(envelope.result.as_ref().unwrap()["repeat"], 1);
        assert!(envelope.error.is_none());
    }

    #[tokio::test]
    async fn test_dispatch_missing_tool() {
        let registry = test_registry();
        let envelope = dispatch(&registry, None, Some("say"), Parameters::new()).await;
        assert_eq!(envelope.error_kind(), Some("MissingTool"));
        assert!(envelope.tool.is_none());
        assert_eq!(envelope.action.as_deref(), Some("say"));
    }

    #[tokio::test]
    async fn test_dispatch_empty_tool_is_missing() {
        let registry = test_registry();
        let envelope =
            dispatch(&registry, Some(""), Some("say"), Parameters::new()).await;
        assert_eq!(envelope.error_kind(), Some("MissingTool"));
    }

    #[tokio::test]
    async fn test_dispatch_missing_action() {
        let registry = test_registry();
        let envelope = dispatch(&registry, Some("echo"), None, Parameters::new()).await;
        assert_eq!(envelope.error_kind(), Some("MissingAction"));
    }

    #[tokio::test]
    async fn test_dispatch_unknown_tool() {
        let registry = test_registry();
        let envelope =
            dispatch(&registry, Some("nope"), Some("say"), Parameters::new()).await;
        assert_eq!(envelope.error_kind(), Some("UnknownTool"));
    }

    #[tokio::test]
    async fn test_dispatch_unknown_action() {
        let registry = test_registry();
        let envelope =
            dispatch(&registry, Some("echo"), Some("shout"), Parameters::new()).await;
        assert_eq!(envelope.error_kind(), Some("UnknownAction"));
    }

    #[tokio::test]
    async fn test_dispatch_invalid_parameters() {
        let registry = test_registry();
        let envelope =
            dispatch(&registry, Some("echo"), Some("say"), Parameters::new()).await;
        assert_eq!(envelope.error_kind(), Some("InvalidParameters"));
        let body = envelope.error.unwrap();
        assert!(body.message.contains("message"));
    }

    #[tokio::test]
    async fn test_dispatch_handler_failure_keeps_kind() {
        let registry = test_registry();
        let envelope =
            dispatch(&registry, Some("echo"), Some("fail"), Parameters::new()).await;
        assert_eq!(envelope.error_kind(), Some("BackendError"));
        assert!(envelope.result.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_dispatches_are_independent() {
        let registry = std::sync::Arc::new(test_registry());

        let ok = {
            let registry = registry.clone();
            tokio::spawn(async move {
                let params = Parameters::from_value(json!({"message": "a"}));
                dispatch(&registry, Some("echo"), Some("say"), params).await
            })
        };
        let bad = {
            let registry = registry.clone();
            tokio::spawn(async move {
                dispatch(&registry, Some("echo"), Some("fail"), Parameters::new()).await
            })
        };

        let (ok, bad) = (ok.await.unwrap(), bad.await.unwrap());
        assert!(ok.is_success());
        assert_eq!(bad.error_kind(), Some("BackendError"));
    }

    #[test]
    fn test_envelope_serialization_shape() {
        let envelope = ResponseEnvelope::failure(
            Some("memory"),
            Some("get"),
            &DispatchError::Tool(ToolError::not_found("Memory item with key 'k' not found")),
        );
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["status"], "error");
        assert_eq!(value["error"]["type"], "NotFound");
        assert!(value.get("result").is_none());
    }
}
