//! Tool dispatch: lookup, validation, bounded execution, wrapping.
//!
//! Every failure mode — unknown tool, schema violation, timeout,
//! cancellation, handler error — collapses into an error-flagged
//! [`ToolOutput`] that is fed back to the model, never a fault that
//! escapes the turn. Schema validation runs before the handler, so a
//! handler never sees arguments that don't match its schema.

use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, instrument, warn};
use relay_core::events::{BaseEvent, RelayEvent};
use relay_core::ids::ToolCallId;
use relay_core::messages::ToolCall;
use relay_core::tools::{ToolOutput, error_result};
use relay_tools::schema::validate_arguments;
use relay_tools::{ToolContext, ToolError, ToolRegistry};

use crate::event_emitter::EventEmitter;

/// Outcome of one tool dispatch.
#[derive(Clone, Debug)]
pub struct ToolExecutionResult {
    /// The call this result answers.
    pub tool_call_id: ToolCallId,
    /// Name of the dispatched tool.
    pub tool_name: String,
    /// The wrapped output (error-flagged on any failure).
    pub output: ToolOutput,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

/// Round a duration up to whole milliseconds, with a 1ms floor.
pub(crate) fn duration_ceil_ms(duration: Duration) -> u64 {
    let millis = duration.as_millis();
    let rounded = if duration.subsec_micros() % 1000 > 0 {
        millis + 1
    } else {
        millis.max(1)
    };
    u64::try_from(rounded).unwrap_or(u64::MAX)
}

/// Dispatch one tool call.
///
/// `default_timeout_ms` bounds execution unless the tool declares its
/// own timeout.
#[instrument(skip_all, fields(tool_name = %tool_call.name, tool_call_id = %tool_call.id))]
pub async fn execute_tool(
    tool_call: &ToolCall,
    registry: &ToolRegistry,
    ctx: &ToolContext,
    emitter: &EventEmitter,
    default_timeout_ms: u64,
) -> ToolExecutionResult {
    let _ = emitter.emit(RelayEvent::ToolExecutionStart {
        base: BaseEvent::now(ctx.session_id.clone()),
        tool_call_id: tool_call.id.clone(),
        tool_name: tool_call.name.clone(),
        arguments: tool_call.arguments.clone(),
    });

    let start = std::time::Instant::now();
    let output = run_dispatch(tool_call, registry, ctx, default_timeout_ms).await;
    let duration_ms = duration_ceil_ms(start.elapsed());

    if output.is_error() {
        warn!(duration_ms, error = %output.content, "tool execution failed");
    } else {
        debug!(duration_ms, "tool execution completed");
    }

    let _ = emitter.emit(RelayEvent::ToolExecutionEnd {
        base: BaseEvent::now(ctx.session_id.clone()),
        tool_call_id: tool_call.id.clone(),
        tool_name: tool_call.name.clone(),
        duration_ms,
        is_error: output.is_error(),
    });

    ToolExecutionResult {
        tool_call_id: tool_call.id.clone(),
        tool_name: tool_call.name.clone(),
        output,
        duration_ms,
    }
}

async fn run_dispatch(
    tool_call: &ToolCall,
    registry: &ToolRegistry,
    ctx: &ToolContext,
    default_timeout_ms: u64,
) -> ToolOutput {
    let Some(tool) = registry.get(&tool_call.name) else {
        return error_result(
            ToolError::UnknownTool {
                name: tool_call.name.clone(),
            }
            .to_string(),
        );
    };

    // The handler never runs on arguments that fail validation.
    if let Err(violation) = validate_arguments(&tool.definition().parameters, &tool_call.arguments)
    {
        return error_result(violation.to_string());
    }

    if ctx.cancellation.is_cancelled() {
        return error_result(ToolError::Cancelled.to_string());
    }

    let timeout_ms = tool.timeout_ms().unwrap_or(default_timeout_ms);
    let params = serde_json::Value::Object(tool_call.arguments.clone());
    match timeout(Duration::from_millis(timeout_ms), tool.execute(params, ctx)).await {
        Err(_) => error_result(ToolError::Timeout { timeout_ms }.to_string()),
        Ok(Err(error)) => error_result(error.to_string()),
        Ok(Ok(output)) => output,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde_json::{Map, Value, json};
    use tokio_util::sync::CancellationToken;
    use relay_core::ids::SessionId;
    use relay_core::tools::{Tool, ToolParameterSchema, text_result};
    use relay_tools::RelayTool;
    use relay_tools::customer::CustomerProfile;

    use super::*;

    struct EchoTool {
        executions: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl RelayTool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn definition(&self) -> Tool {
            Tool {
                name: "echo".into(),
                description: "Echo the text argument".into(),
                parameters: ToolParameterSchema {
                    schema_type: "object".into(),
                    properties: Some({
                        let mut m = Map::new();
                        let _ = m.insert("text".into(), json!({"type": "string"}));
                        m
                    }),
                    required: Some(vec!["text".into()]),
                    description: None,
                    extra: Map::new(),
                },
            }
        }

        async fn execute(
            &self,
            params: Value,
            _ctx: &ToolContext,
        ) -> Result<ToolOutput, ToolError> {
            let _ = self.executions.fetch_add(1, Ordering::SeqCst);
            let text = params["text"].as_str().unwrap_or_default();
            Ok(text_result(text, false))
        }
    }

    struct SlowTool;

    #[async_trait]
    impl RelayTool for SlowTool {
        fn name(&self) -> &str {
            "slow"
        }

        fn timeout_ms(&self) -> Option<u64> {
            Some(20)
        }

        fn definition(&self) -> Tool {
            Tool {
                name: "slow".into(),
                description: "Sleeps forever".into(),
                parameters: ToolParameterSchema::empty_object(),
            }
        }

        async fn execute(
            &self,
            _params: Value,
            _ctx: &ToolContext,
        ) -> Result<ToolOutput, ToolError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(text_result("never", false))
        }
    }

    struct FailingTool;

    #[async_trait]
    impl RelayTool for FailingTool {
        fn name(&self) -> &str {
            "failing"
        }

        fn definition(&self) -> Tool {
            Tool {
                name: "failing".into(),
                description: "Always fails".into(),
                parameters: ToolParameterSchema::empty_object(),
            }
        }

        async fn execute(
            &self,
            _params: Value,
            _ctx: &ToolContext,
        ) -> Result<ToolOutput, ToolError> {
            Err(ToolError::Execution {
                message: "inventory service unreachable".into(),
            })
        }
    }

    fn ctx() -> ToolContext {
        ToolContext {
            tool_call_id: ToolCallId::new(),
            session_id: SessionId::from("s1"),
            customer: CustomerProfile {
                customer_id: "CUST-123".into(),
                name: "Alice Johnson".into(),
                premium: true,
            },
            scratch: Map::new(),
            cancellation: CancellationToken::new(),
        }
    }

    fn call(name: &str, arguments: Map<String, Value>) -> ToolCall {
        ToolCall::new(name, arguments)
    }

    #[tokio::test]
    async fn dispatches_and_emits_events() {
        let executions = Arc::new(AtomicUsize::new(0));
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool {
            executions: executions.clone(),
        }));
        let emitter = EventEmitter::new();
        let mut rx = emitter.subscribe();

        let mut args = Map::new();
        let _ = args.insert("text".into(), json!("hi"));
        let result = execute_tool(&call("echo", args), &registry, &ctx(), &emitter, 1000).await;

        assert!(!result.output.is_error());
        assert_eq!(result.output.content, "hi");
        assert!(result.duration_ms >= 1);
        assert_eq!(executions.load(Ordering::SeqCst), 1);

        assert_eq!(rx.recv().await.unwrap().event_type(), "tool_execution_start");
        let end = rx.recv().await.unwrap();
        match end {
            RelayEvent::ToolExecutionEnd { is_error, .. } => assert!(!is_error),
            other => panic!("expected tool_execution_end, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unknown_tool_is_error_result() {
        let registry = ToolRegistry::new();
        let emitter = EventEmitter::new();

        let result =
            execute_tool(&call("ghost", Map::new()), &registry, &ctx(), &emitter, 1000).await;
        assert!(result.output.is_error());
        assert!(result.output.content.contains("unknown tool: ghost"));
    }

    #[tokio::test]
    async fn schema_violation_never_executes_handler() {
        let executions = Arc::new(AtomicUsize::new(0));
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool {
            executions: executions.clone(),
        }));
        let emitter = EventEmitter::new();

        // Missing required "text"
        let result =
            execute_tool(&call("echo", Map::new()), &registry, &ctx(), &emitter, 1000).await;
        assert!(result.output.is_error());
        assert!(result.output.content.contains("schema violation"));
        assert_eq!(executions.load(Ordering::SeqCst), 0, "handler must not run");

        // Wrong type
        let mut args = Map::new();
        let _ = args.insert("text".into(), json!(42));
        let result = execute_tool(&call("echo", args), &registry, &ctx(), &emitter, 1000).await;
        assert!(result.output.is_error());
        assert_eq!(executions.load(Ordering::SeqCst), 0, "handler must not run");
    }

    #[tokio::test]
    async fn per_tool_timeout_wraps_as_error() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(SlowTool));
        let emitter = EventEmitter::new();

        let result =
            execute_tool(&call("slow", Map::new()), &registry, &ctx(), &emitter, 60_000).await;
        assert!(result.output.is_error());
        assert!(result.output.content.contains("timeout after 20ms"));
    }

    #[tokio::test]
    async fn handler_error_wraps_as_error_result() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(FailingTool));
        let emitter = EventEmitter::new();

        let result =
            execute_tool(&call("failing", Map::new()), &registry, &ctx(), &emitter, 1000).await;
        assert!(result.output.is_error());
        assert!(result.output.content.contains("inventory service unreachable"));
    }

    #[tokio::test]
    async fn cancelled_context_skips_execution() {
        let executions = Arc::new(AtomicUsize::new(0));
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool {
            executions: executions.clone(),
        }));
        let emitter = EventEmitter::new();

        let ctx = ctx();
        ctx.cancellation.cancel();
        let mut args = Map::new();
        let _ = args.insert("text".into(), json!("hi"));
        let result = execute_tool(&call("echo", args), &registry, &ctx, &emitter, 1000).await;
        assert!(result.output.is_error());
        assert!(result.output.content.contains("cancelled"));
        assert_eq!(executions.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn duration_ceil_rounds_up() {
        assert_eq!(duration_ceil_ms(Duration::from_micros(1)), 1);
        assert_eq!(duration_ceil_ms(Duration::from_millis(5)), 5);
        assert_eq!(duration_ceil_ms(Duration::from_micros(5001)), 6);
    }
}
