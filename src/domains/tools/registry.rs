//! Tool Registry - central registration and lookup for all tools.
//!
//! The registry is the single source of truth for what the gateway can do.
//! It is built once at startup by [`ToolRegistryBuilder`] and read-only
//! afterward, so lookups need no locking; both the dispatcher and the
//! manifest publisher consume the same [`ActionSpec`] metadata.

use thiserror::Error;

use super::spec::{ActionSpec, Tool};

/// Errors from registry construction and lookup.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The (tool, action) pair was already registered.
    #[error("Action '{action}' is already registered for tool '{tool}'")]
    DuplicateRegistration { tool: String, action: String },

    /// The requested tool is not registered.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// The tool exists but does not expose the requested action.
    #[error("Unknown action '{action}' for tool '{tool}'")]
    UnknownAction { tool: String, action: String },
}

impl RegistryError {
    /// Stable kind for the response envelope.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DuplicateRegistration { .. } => "InternalError",
            Self::UnknownTool(_) => "UnknownTool",
            Self::UnknownAction { .. } => "UnknownAction",
        }
    }
}

struct ToolEntry {
    name: String,
    actions: Vec<ActionSpec>,
}

/// Immutable mapping from tool name to action table, insertion-ordered.
pub struct ToolRegistry {
    tools: Vec<ToolEntry>,
}

impl ToolRegistry {
    /// Start building a registry.
    pub fn builder() -> ToolRegistryBuilder {
        ToolRegistryBuilder { tools: Vec::new() }
    }

    /// Resolve an action spec by (tool, action).
    ///
    /// Distinguishes an absent tool from an absent action so callers can
    /// report precisely.
    pub fn resolve(&self, tool: &str, action: &str) -> Result<&ActionSpec, RegistryError> {
        let entry = self
            .tools
            .iter()
            .find(|t| t.name == tool)
            .ok_or_else(|| RegistryError::UnknownTool(tool.to_string()))?;

        entry
            .actions
            .iter()
            .find(|a| a.name() == action)
            .ok_or_else(|| RegistryError::UnknownAction {
                tool: tool.to_string(),
                action: action.to_string(),
            })
    }

    /// Registered tool names, in registration order.
    pub fn tools(&self) -> impl Iterator<Item = &str> {
        self.tools.iter().map(|t| t.name.as_str())
    }

    /// Action specs of one tool, in registration order.
    pub fn actions(&self, tool: &str) -> Result<impl Iterator<Item = &ActionSpec>, RegistryError> {
        self.tools
            .iter()
            .find(|t| t.name == tool)
            .map(|t| t.actions.iter())
            .ok_or_else(|| RegistryError::UnknownTool(tool.to_string()))
    }

    /// Total number of registered actions across all tools.
    pub fn action_count(&self) -> usize {
        self.tools.iter().map(|t| t.actions.len()).sum()
    }
}

/// Builder for [`ToolRegistry`]. Registration happens only here, before any
/// traffic; the built registry accepts no further mutation.
pub struct ToolRegistryBuilder {
    tools: Vec<ToolEntry>,
}

impl ToolRegistryBuilder {
    /// Register a single action under a tool name.
    pub fn register(&mut self, tool: &str, spec: ActionSpec) -> Result<(), RegistryError> {
        let idx = match self.tools.iter().position(|t| t.name == tool) {
            Some(idx) => idx,
            None => {
                self.tools.push(ToolEntry {
                    name: tool.to_string(),
                    actions: Vec::new(),
                });
                self.tools.len() - 1
            }
        };
        let entry = &mut self.tools[idx];

        if entry.actions.iter().any(|a| a.name() == spec.name()) {
            return Err(RegistryError::DuplicateRegistration {
                tool: tool.to_string(),
                action: spec.name().to_string(),
            });
        }

        entry.actions.push(spec);
        Ok(())
    }

    /// Register every action a backend exposes.
    pub fn register_tool(&mut self, tool: &dyn Tool) -> Result<(), RegistryError> {
        for spec in tool.actions() {
            self.register(tool.name(), spec)?;
        }
        Ok(())
    }

    /// Finish construction.
    pub fn build(self) -> ToolRegistry {
        ToolRegistry { tools: self.tools }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::spec::ParamType;
    use serde_json::json;

    fn spec(name: &str) -> ActionSpec {
        ActionSpec::builder(name, "test action")
            .required("id", ParamType::String, "identifier")
            .returns("object", "test result")
            .handler(|_| async { Ok(json!({})) })
    }

    fn sample_registry() -> ToolRegistry {
        let mut builder = ToolRegistry::builder();
        builder.register("github", spec("listRepos")).unwrap();
        builder.register("github", spec("getRepo")).unwrap();
        builder.register("memory", spec("get")).unwrap();
        builder.build()
    }

    #[test]
    fn test_resolve_known_pair() {
        let registry = sample_registry();
        assert!(registry.resolve("github", "listRepos").is_ok());
        assert!(registry.resolve("memory", "get").is_ok());
    }

    #[test]
    fn test_resolve_distinguishes_unknown_tool_from_action() {
        let registry = sample_registry();

        let err = registry.resolve("bitbucket", "listRepos").unwrap_err();
        assert_eq!(err.kind(), "UnknownTool");

        let err = registry.resolve("github", "deleteRepo").unwrap_err();
        assert_eq!(err.kind(), "UnknownAction");
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut builder = ToolRegistry::builder();
        builder.register("github", spec("listRepos")).unwrap();
        let err = builder.register("github", spec("listRepos")).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateRegistration { .. }));
    }

    #[test]
    fn test_same_action_name_allowed_across_tools() {
        let mut builder = ToolRegistry::builder();
        builder.register("github", spec("getIssues")).unwrap();
        builder.register("gitlab", spec("getIssues")).unwrap();
        let registry = builder.build();
        assert!(registry.resolve("github", "getIssues").is_ok());
        assert!(registry.resolve("gitlab", "getIssues").is_ok());
    }

    #[test]
    fn test_tools_in_insertion_order() {
        let registry = sample_registry();
        let names: Vec<_> = registry.tools().collect();
        assert_eq!(names, vec!["github", "memory"]);
    }

    #[test]
    fn test_actions_in_insertion_order() {
        let registry = sample_registry();
        let names: Vec<_> = registry
            .actions("github")
            .unwrap()
            .map(ActionSpec::name)
            .collect();
        assert_eq!(names, vec!["listRepos", "getRepo"]);
    }

    #[test]
    fn test_actions_unknown_tool() {
        let registry = sample_registry();
        assert!(registry.actions("gmaps").is_err());
    }
}
