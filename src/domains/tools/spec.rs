//! Declarative action metadata.
//!
//! An [`ActionSpec`] carries everything the gateway knows about one action:
//! its parameter table, its return description, and the handler itself.
//! Because the manifest is derived from the same value the dispatcher
//! resolves, the published description and the executable behavior cannot
//! silently diverge.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::Value;

use super::error::ToolError;
use super::params::Parameters;

/// Logical parameter type, published in the manifest.
///
/// The validator does not coerce values to these types; backends are
/// responsible for final interpretation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    String,
    Number,
    Boolean,
    Object,
    Any,
}

impl ParamType {
    /// Manifest representation of the type.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Any => "any",
        }
    }
}

/// Declaration of a single action parameter.
///
/// Invariant: a required parameter never carries a default, and a parameter
/// with a default is never required. The [`ActionSpecBuilder`] constructors
/// make the invalid combination unrepresentable.
#[derive(Debug, Clone)]
pub struct ParameterSpec {
    name: String,
    param_type: ParamType,
    description: String,
    required: bool,
    default: Option<Value>,
}

impl ParameterSpec {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn param_type(&self) -> ParamType {
        self.param_type
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Default value substituted when the parameter is absent.
    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }
}

/// Informational description of an action's return value (manifest only,
/// not enforced at runtime).
#[derive(Debug, Clone)]
pub struct ReturnSpec {
    return_type: String,
    description: String,
}

impl ReturnSpec {
    pub fn new(return_type: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            return_type: return_type.into(),
            description: description.into(),
        }
    }

    pub fn return_type(&self) -> &str {
        &self.return_type
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

/// Boxed future returned by an action handler.
pub type HandlerFuture = BoxFuture<'static, Result<Value, ToolError>>;

/// The executable side of an action: validated parameters in, result or
/// typed failure out. Side effects (network, subprocess, persistence) live
/// entirely behind this boundary.
pub type Handler = Arc<dyn Fn(Parameters) -> HandlerFuture + Send + Sync>;

/// Complete description of one action. Immutable once registered.
#[derive(Clone)]
pub struct ActionSpec {
    name: String,
    description: String,
    parameters: Vec<ParameterSpec>,
    returns: ReturnSpec,
    handler: Handler,
}

impl ActionSpec {
    /// Start building an action spec.
    pub fn builder(name: impl Into<String>, description: impl Into<String>) -> ActionSpecBuilder {
        ActionSpecBuilder {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
            returns: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Declared parameters, in declaration order.
    pub fn parameters(&self) -> &[ParameterSpec] {
        &self.parameters
    }

    pub fn returns(&self) -> &ReturnSpec {
        &self.returns
    }

    /// Invoke the handler with validated parameters.
    pub fn invoke(&self, params: Parameters) -> HandlerFuture {
        (self.handler)(params)
    }
}

impl fmt::Debug for ActionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionSpec")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

/// Builder for [`ActionSpec`].
pub struct ActionSpecBuilder {
    name: String,
    description: String,
    parameters: Vec<ParameterSpec>,
    returns: Option<ReturnSpec>,
}

impl ActionSpecBuilder {
    /// Declare a required parameter (no default by construction).
    pub fn required(
        mut self,
        name: impl Into<String>,
        param_type: ParamType,
        description: impl Into<String>,
    ) -> Self {
        self.parameters.push(ParameterSpec {
            name: name.into(),
            param_type,
            description: description.into(),
            required: true,
            default: None,
        });
        self
    }

    /// Declare an optional parameter without a default.
    pub fn optional(
        mut self,
        name: impl Into<String>,
        param_type: ParamType,
        description: impl Into<String>,
    ) -> Self {
        self.parameters.push(ParameterSpec {
            name: name.into(),
            param_type,
            description: description.into(),
            required: false,
            default: None,
        });
        self
    }

    /// Declare an optional parameter with a default value, substituted when
    /// the parameter is absent from a call.
    pub fn with_default(
        mut self,
        name: impl Into<String>,
        param_type: ParamType,
        description: impl Into<String>,
        default: Value,
    ) -> Self {
        self.parameters.push(ParameterSpec {
            name: name.into(),
            param_type,
            description: description.into(),
            required: false,
            default: Some(default),
        });
        self
    }

    /// Describe the return value for the manifest.
    pub fn returns(
        mut self,
        return_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        self.returns = Some(ReturnSpec::new(return_type, description));
        self
    }

    /// Attach the handler and finish the spec.
    pub fn handler<F, Fut>(self, f: F) -> ActionSpec
    where
        F: Fn(Parameters) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, ToolError>> + Send + 'static,
    {
        ActionSpec {
            name: self.name,
            description: self.description,
            parameters: self.parameters,
            returns: self
                .returns
                .unwrap_or_else(|| ReturnSpec::new("object", "Action result")),
            handler: Arc::new(move |params| f(params).boxed()),
        }
    }
}

/// Capability contract implemented by each backend integration: a tool is a
/// named bundle of actions. The registry is populated from these at startup
/// and treated as immutable afterward.
pub trait Tool {
    /// Tool name as addressed by dispatch requests.
    fn name(&self) -> &'static str;

    /// All action specs this tool exposes, in manifest order.
    fn actions(&self) -> Vec<ActionSpec>;
}
