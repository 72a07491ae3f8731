//! Errors surfaced by tool functions back to the agent runtime.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolError {
    /// A caller-supplied argument was missing, malformed or unparsable.
    #[error("invalid argument: {0}")]
    Validation(String),

    /// The metadata service was unreachable, refused the request or answered
    /// with something we could not decode.
    #[error("metadata service error: {0}")]
    Service(String),

    /// A single-entity lookup found nothing. Empty lists are not errors.
    #[error("not found: {0}")]
    NotFound(String),
}

pub type ToolResult<T> = std::result::Result<T, ToolError>;

impl ToolError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ToolError::Validation(msg.into())
    }

    pub fn service(msg: impl Into<String>) -> Self {
        ToolError::Service(msg.into())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ToolError::Validation(_) => "validation",
            ToolError::Service(_) => "service",
            ToolError::NotFound(_) => "not_found",
        }
    }
}

impl From<serde_json::Error> for ToolError {
    fn from(err: serde_json::Error) -> Self {
        ToolError::Service(format!("serialization failed: {err}"))
    }
}
