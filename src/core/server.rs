//! Gateway server implementation and lifecycle management.
//!
//! The server owns the immutable tool registry and coordinates dispatch
//! and manifest generation for the transport layer.
//!
//! ## Tool Architecture
//!
//! Tools are defined in `domains/tools/definitions/`, one module per
//! backend. Each implements the `Tool` capability trait; this file wires
//! them into the registry at construction time. Stateful collaborators
//! (the memory store) are opened here, before any traffic, and injected
//! into their tools as shared handles.

use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use super::config::Config;
use crate::domains::tools::definitions::{
    GithubTool, GitlabTool, GmapsTool, MemoryStore, MemoryTool, PuppeteerTool, SqliteMemoryStore,
};
use crate::domains::tools::{
    Parameters, ResponseEnvelope, ToolRegistry, dispatch, manifest,
};

/// The main gateway server.
///
/// Cheap to clone: the registry and configuration are shared behind `Arc`s.
/// Dispatch touches no mutable state, so a single instance serves all
/// concurrent requests.
#[derive(Clone)]
pub struct GatewayServer {
    /// Server configuration.
    config: Arc<Config>,

    /// Immutable registry of every tool and action.
    registry: Arc<ToolRegistry>,
}

impl GatewayServer {
    /// Construct the server: open the memory store, build the backends,
    /// and populate the registry.
    ///
    /// Fails on store/bootstrap errors and on duplicate action
    /// registration; no partial server is ever served.
    pub fn new(config: Config) -> crate::core::Result<Self> {
        let config = Arc::new(config);

        let store: Arc<dyn MemoryStore> =
            Arc::new(SqliteMemoryStore::open(&config.memory.db_path)?);

        let mut builder = ToolRegistry::builder();
        builder.register_tool(&GithubTool::new(&config.credentials))?;
        builder.register_tool(&GitlabTool::new(&config.credentials))?;
        builder.register_tool(&GmapsTool::new(&config.credentials))?;
        builder.register_tool(&MemoryTool::new(store))?;
        builder.register_tool(&PuppeteerTool::new(&config.browser)?)?;
        let registry = builder.build();

        info!(
            "Registered {} tools with {} actions",
            registry.tools().count(),
            registry.action_count()
        );

        Ok(Self {
            config,
            registry: Arc::new(registry),
        })
    }

    /// Construct a server over an already-built registry (used by tests).
    pub fn with_registry(config: Config, registry: ToolRegistry) -> Self {
        Self {
            config: Arc::new(config),
            registry: Arc::new(registry),
        }
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.config.server.name
    }

    /// Get the server version.
    pub fn version(&self) -> &str {
        &self.config.server.version
    }

    /// Get the server configuration.
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    /// Get the tool registry.
    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Dispatch a gateway request, producing exactly one envelope.
    pub async fn dispatch(
        &self,
        tool: Option<&str>,
        action: Option<&str>,
        params: Parameters,
    ) -> ResponseEnvelope {
        dispatch(&self.registry, tool, action, params).await
    }

    /// Run a known (tool, action) pair through the shared validation and
    /// handler pipeline, without the envelope (for the direct routes).
    pub async fn run_action(
        &self,
        tool: &str,
        action: &str,
        params: Parameters,
    ) -> Result<Value, crate::domains::tools::DispatchError> {
        crate::domains::tools::dispatch::run(&self.registry, tool, action, params).await
    }

    /// The manifest describing every registered tool and action.
    pub fn manifest(&self) -> Value {
        manifest::describe(&self.registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::spec::{ActionSpec, ParamType};
    use serde_json::json;

    fn test_server() -> GatewayServer {
        let mut builder = ToolRegistry::builder();
        builder
            .register(
                "echo",
                ActionSpec::builder("say", "Echo a message")
                    .required("message", ParamType::String, "Message to echo")
                    .returns("object", "Echoed message")
                    .handler(|params| async move {
                        Ok(json!({ "message": params.require_str("message")? }))
                    }),
            )
            .unwrap();
        GatewayServer::with_registry(Config::default(), builder.build())
    }

    #[tokio::test]
    async fn test_dispatch_and_manifest_share_metadata() {
        let server = test_server();

        let manifest = server.manifest();
        assert!(manifest["tools"]["echo"]["actions"]["say"].is_object());

        let params = Parameters::from_value(json!({"message": "hi"}));
        let envelope = server.dispatch(Some("echo"), Some("say"), params).await;
        assert!(envelope.is_success());
    }

    #[tokio::test]
    async fn test_run_action_bypasses_envelope() {
        let server = test_server();
        let params = Parameters::from_value(json!({"message": "hi"}));
        let result = server.run_action("echo", "say", params).await.unwrap();
        assert_eq!(result["message"], "hi");
    }

    #[test]
    fn test_full_bootstrap_registers_all_tools() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.memory.db_path = dir.path().join("memory.db");
        config.browser.script_dir = dir.path().join("scripts");

        let server = GatewayServer::new(config).unwrap();
        let tools: Vec<_> = server.registry().tools().collect();
        assert_eq!(tools, vec!["github", "gitlab", "gmaps", "memory", "puppeteer"]);
        assert_eq!(server.registry().action_count(), 24);
    }
}
