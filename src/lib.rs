//! MCP Gateway Server Library
//!
//! A gateway exposing a uniform `{tool, action, parameters}` dispatch
//! protocol over a set of pluggable backend integrations.
//!
//! # Architecture
//!
//! - **core**: Configuration, error handling, the gateway server, and the
//!   HTTP transport
//! - **domains**: Business logic organized by bounded contexts
//!   - **tools**: The registry, parameter validation, the dispatcher, the
//!     manifest publisher, and one definition module per backend
//!
//! # Example
//!
//! ```rust,no_run
//! use mcp_gateway_server::core::{Config, GatewayServer, HttpTransport};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env();
//!     let transport = HttpTransport::new(config.transport.clone());
//!     let server = GatewayServer::new(config)?;
//!     transport.run(server).await?;
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;

// Re-export commonly used types for convenience
pub use core::{Config, Error, GatewayServer, Result};
