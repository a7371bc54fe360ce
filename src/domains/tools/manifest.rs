//! Manifest publisher.
//!
//! Derives the machine-readable description of every tool, action, and
//! parameter from the registry's [`ActionSpec`] metadata - the same values
//! the dispatcher resolves. The manifest is a pure function of registry
//! state; with no registry mutation between calls, two calls yield
//! identical output.

use serde_json::{Map, Value, json};

use super::registry::ToolRegistry;

/// Manifest format version published to callers.
pub const MANIFEST_VERSION: &str = "1.0";

/// Produce the full manifest: `{"manifestVersion": "1.0", "tools": {...}}`.
pub fn describe(registry: &ToolRegistry) -> Value {
    let mut tools = Map::new();

    for tool in registry.tools() {
        let mut actions = Map::new();

        // tools() only yields registered names, so the lookup cannot miss;
        // skip defensively rather than panic if it ever did.
        let Ok(specs) = registry.actions(tool) else {
            continue;
        };

        for spec in specs {
            let mut parameters = Map::new();
            for param in spec.parameters() {
                let mut entry = Map::new();
                entry.insert("type".to_string(), json!(param.param_type().as_str()));
                entry.insert("description".to_string(), json!(param.description()));
                if let Some(default) = param.default() {
                    entry.insert("default".to_string(), default.clone());
                }
                parameters.insert(param.name().to_string(), Value::Object(entry));
            }

            actions.insert(
                spec.name().to_string(),
                json!({
                    "description": spec.description(),
                    "parameters": parameters,
                    "returns": {
                        "type": spec.returns().return_type(),
                        "description": spec.returns().description(),
                    },
                }),
            );
        }

        tools.insert(tool.to_string(), json!({ "actions": actions }));
    }

    json!({
        "manifestVersion": MANIFEST_VERSION,
        "tools": tools,
    })
}
