//! Tool-specific error types.

use thiserror::Error;

/// Errors a tool handler can produce.
///
/// Every backend fault (non-2xx upstream response, transport failure,
/// malformed body, subprocess exit, store error) is translated into one of
/// these kinds at the handler boundary; raw transport errors never cross
/// into the envelope layer.
#[derive(Debug, Error)]
pub enum ToolError {
    /// A parameter was missing, empty, or otherwise unusable.
    #[error("{0}")]
    InvalidParameters(String),

    /// The requested entity does not exist.
    #[error("{0}")]
    NotFound(String),

    /// An upstream service or subprocess failed.
    #[error("{message}")]
    Backend {
        /// Upstream HTTP status, when the failure came from an HTTP API.
        status: Option<u16>,
        message: String,
    },

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ToolError {
    /// Create a new "invalid parameters" error.
    pub fn invalid_parameters(msg: impl Into<String>) -> Self {
        Self::InvalidParameters(msg.into())
    }

    /// Create an "invalid parameters" error naming a missing field.
    pub fn missing_parameter(name: &str) -> Self {
        Self::InvalidParameters(format!("Required parameter '{}' is missing", name))
    }

    /// Create a new "not found" error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a backend error without an upstream status.
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend {
            status: None,
            message: msg.into(),
        }
    }

    /// Create a backend error carrying the upstream HTTP status.
    pub fn backend_status(status: u16, msg: impl Into<String>) -> Self {
        Self::Backend {
            status: Some(status),
            message: msg.into(),
        }
    }

    /// Create a new "internal" error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Stable, programmatically matchable kind for the response envelope.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidParameters(_) => "InvalidParameters",
            Self::NotFound(_) => "NotFound",
            Self::Backend { .. } => "BackendError",
            Self::Internal(_) => "InternalError",
        }
    }
}

impl From<reqwest::Error> for ToolError {
    fn from(err: reqwest::Error) -> Self {
        Self::Backend {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_are_stable() {
        assert_eq!(ToolError::missing_parameter("key").kind(), "InvalidParameters");
        assert_eq!(ToolError::not_found("x").kind(), "NotFound");
        assert_eq!(ToolError::backend("boom").kind(), "BackendError");
        assert_eq!(ToolError::backend_status(502, "bad gateway").kind(), "BackendError");
        assert_eq!(ToolError::internal("x").kind(), "InternalError");
    }

    #[test]
    fn test_missing_parameter_names_field() {
        let err = ToolError::missing_parameter("username");
        assert!(err.to_string().contains("username"));
    }

    #[test]
    fn test_backend_status_preserved() {
        match ToolError::backend_status(404, "not found upstream") {
            ToolError::Backend { status, .. } => assert_eq!(status, Some(404)),
            other => panic!("unexpected variant: {:?}", other),
        }
    }
}
