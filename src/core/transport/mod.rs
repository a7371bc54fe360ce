//! Transport layer for the gateway server.
//!
//! The gateway speaks plain JSON over HTTP; this module owns the axum
//! router, the bind/serve lifecycle, and transport-level configuration.

mod config;
mod error;

pub mod http;

pub use config::HttpConfig;
pub use error::{TransportError, TransportResult};
pub use http::HttpTransport;
