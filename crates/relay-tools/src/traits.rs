//! Core trait and context for the tool system.
//!
//! Defines [`RelayTool`] — the trait every tool implements — and
//! [`ToolContext`], the read-only session snapshot handed to each
//! invocation. Handlers are functions of (context, arguments); they never
//! mutate session state directly.

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;
use relay_core::ids::{SessionId, ToolCallId};
use relay_core::tools::{Tool, ToolOutput};

use crate::customer::CustomerProfile;
use crate::errors::ToolError;

// ─────────────────────────────────────────────────────────────────────────────
// Tool context
// ─────────────────────────────────────────────────────────────────────────────

/// Execution context passed to every tool invocation.
///
/// A snapshot taken at dispatch time; tools read from it and return a
/// result, so two calls with the same context and arguments behave
/// identically at the dispatch level.
#[derive(Clone, Debug)]
pub struct ToolContext {
    /// Unique ID of this tool call.
    pub tool_call_id: ToolCallId,
    /// Session the call belongs to.
    pub session_id: SessionId,
    /// The customer the session is on behalf of.
    pub customer: CustomerProfile,
    /// Session scratch data (agent working notes).
    pub scratch: Map<String, Value>,
    /// Cancellation token for cooperative cancellation.
    pub cancellation: CancellationToken,
}

// ─────────────────────────────────────────────────────────────────────────────
// RelayTool trait
// ─────────────────────────────────────────────────────────────────────────────

/// The core trait that every tool must implement.
///
/// Each tool provides:
/// - **Schema** via [`definition()`](RelayTool::definition) — sent to the model
/// - **Execution** via [`execute()`](RelayTool::execute) — invoked with JSON params
#[async_trait]
pub trait RelayTool: Send + Sync {
    /// Tool name — the exact string sent to/from the model.
    fn name(&self) -> &str;

    /// Optional per-tool timeout in milliseconds.
    fn timeout_ms(&self) -> Option<u64> {
        None
    }

    /// Generate the [`Tool`] schema for the model.
    fn definition(&self) -> Tool;

    /// Execute the tool with JSON arguments.
    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<ToolOutput, ToolError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_context_construction() {
        let ctx = ToolContext {
            tool_call_id: ToolCallId::from("call-1"),
            session_id: SessionId::from("sess-1"),
            customer: CustomerProfile {
                customer_id: "CUST-123".into(),
                name: "Alice Johnson".into(),
                premium: true,
            },
            scratch: Map::new(),
            cancellation: CancellationToken::new(),
        };
        assert_eq!(ctx.tool_call_id.as_str(), "call-1");
        assert_eq!(ctx.session_id.as_str(), "sess-1");
        assert!(ctx.customer.premium);
    }

    #[test]
    fn relay_tool_is_object_safe() {
        fn assert_object_safe(_: &dyn RelayTool) {}
        let _ = assert_object_safe;
    }

    #[test]
    fn relay_tool_send_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn RelayTool>();
    }
}
