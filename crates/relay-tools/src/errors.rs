//! Tool error types.
//!
//! Unified error enum for all tool dispatch and execution failures. The
//! dispatcher converts every variant into an error-flagged tool result, so
//! a failing tool can never fault the turn.

use thiserror::Error;

/// Errors that can occur during tool dispatch and execution.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The requested tool is not in the registry.
    #[error("unknown tool: {name}")]
    UnknownTool {
        /// The tool name that was not found.
        name: String,
    },

    /// Arguments did not match the tool's parameter schema.
    #[error("schema violation: {message}")]
    SchemaViolation {
        /// Description of the mismatch.
        message: String,
    },

    /// Execution exceeded its time bound.
    #[error("timeout after {timeout_ms}ms")]
    Timeout {
        /// The timeout duration in milliseconds.
        timeout_ms: u64,
    },

    /// Execution was cancelled.
    #[error("cancelled")]
    Cancelled,

    /// The handler itself failed.
    #[error("execution error: {message}")]
    Execution {
        /// Description of the failure.
        message: String,
    },

    /// JSON serialization/deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
