//! The specialist turn loop.
//!
//! One invocation of [`run_specialist`] drives a single agent through
//! alternating model turns and tool dispatch until the agent produces a
//! final answer, requests a handoff, or runs out of turn budget. The
//! loop appends intermediate assistant text and tool results to the
//! session; the final answer is returned to the caller unappended so
//! that output guardrails run before anything is committed.

use std::sync::Arc;

use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use relay_core::agents::AgentDescriptor;
use relay_core::events::{BaseEvent, RelayEvent};
use relay_core::messages::{Context, Message, ToolCall};
use relay_llm::{ModelEvent, Provider, ProviderOptions, StopReason};
use relay_tools::{ToolContext, ToolRegistry};

use crate::errors::RuntimeError;
use crate::event_emitter::EventEmitter;
use crate::session::Session;
use crate::tool_executor::execute_tool;

/// Fallback answer when a specialist exhausts its turn budget or is
/// interrupted before finishing.
pub const COULD_NOT_COMPLETE: &str =
    "I'm sorry, I wasn't able to complete that request. Could you rephrase or try again?";

/// Bounds on one specialist invocation.
#[derive(Clone, Copy, Debug)]
pub struct SpecialistLimits {
    /// Maximum model turns before the loop gives up.
    pub max_turns: u32,
    /// Default per-tool execution timeout in milliseconds.
    pub tool_timeout_ms: u64,
}

/// How a specialist invocation ended.
#[derive(Clone, Debug, PartialEq)]
pub enum SpecialistOutcome {
    /// The agent produced a final answer. Not yet appended to the
    /// session; the caller commits it after output guardrails pass.
    FinalAnswer {
        /// The assembled answer text.
        text: String,
    },
    /// The agent asked to transfer the session to another agent.
    HandoffRequested {
        /// Capability tag the target agent must carry.
        capability: String,
        /// Why the transfer was requested.
        reason: String,
        /// Any answer text streamed before the handoff request.
        partial_text: String,
    },
    /// The loop stopped before the agent finished (cancellation or turn
    /// budget exhausted).
    Interrupted {
        /// Any answer text streamed before the interruption.
        partial_text: String,
    },
}

/// Drive one specialist until it finishes, hands off, or is stopped.
///
/// Appends mid-loop assistant text and tool results to `session` as the
/// loop progresses. Provider errors abort the invocation without
/// appending anything from the failed turn.
pub async fn run_specialist(
    agent: &AgentDescriptor,
    session: &mut Session,
    provider: &Arc<dyn Provider>,
    registry: &ToolRegistry,
    emitter: &EventEmitter,
    cancel: &CancellationToken,
    limits: &SpecialistLimits,
) -> Result<SpecialistOutcome, RuntimeError> {
    let tools = registry.definitions_for(&agent.tool_names);

    for turn in 0..limits.max_turns {
        if cancel.is_cancelled() {
            debug!(agent_id = %agent.id, turn, "specialist interrupted");
            return Ok(SpecialistOutcome::Interrupted {
                partial_text: String::new(),
            });
        }

        let context = Context {
            instructions: agent.instructions.clone(),
            messages: session.messages().to_vec(),
            tools: tools.clone(),
        };
        let mut stream = provider.stream(&context, &ProviderOptions::default()).await?;

        let mut text = String::new();
        let mut tool_calls: Vec<ToolCall> = Vec::new();
        let mut handoff: Option<(String, String)> = None;
        let mut stop_reason = StopReason::EndTurn;

        while let Some(event) = stream.next().await {
            match event? {
                ModelEvent::TextDelta { text: delta } => {
                    let _ = emitter.emit(RelayEvent::AssistantDelta {
                        base: BaseEvent::now(session.id().clone()),
                        text: delta.clone(),
                    });
                    text.push_str(&delta);
                }
                ModelEvent::ToolCall { tool_call } => tool_calls.push(tool_call),
                ModelEvent::Handoff { capability, reason } => {
                    handoff = Some((capability, reason));
                }
                ModelEvent::Done { stop_reason: sr } => stop_reason = sr,
            }
        }

        if let Some((capability, reason)) = handoff {
            debug!(agent_id = %agent.id, capability, "specialist requested handoff");
            return Ok(SpecialistOutcome::HandoffRequested {
                capability,
                reason,
                partial_text: text,
            });
        }

        if tool_calls.is_empty() {
            if stop_reason == StopReason::ToolUse {
                warn!(agent_id = %agent.id, "tool_use stop with no tool calls, treating as final");
            }
            return Ok(SpecialistOutcome::FinalAnswer { text });
        }

        // Tool turn: commit intermediate text, then every result, so the
        // next model turn sees them.
        if !text.is_empty() {
            session.push_message(Message::assistant(text));
        }
        for tool_call in &tool_calls {
            let ctx = ToolContext {
                tool_call_id: tool_call.id.clone(),
                session_id: session.id().clone(),
                customer: session.customer().clone(),
                scratch: session.scratch().clone(),
                cancellation: cancel.clone(),
            };
            let result =
                execute_tool(tool_call, registry, &ctx, emitter, limits.tool_timeout_ms).await;
            let is_error = result.output.is_error();
            session.push_message(Message::tool_result(
                result.tool_call_id,
                result.output.content,
                is_error,
            ));
        }
    }

    warn!(agent_id = %agent.id, max_turns = limits.max_turns, "specialist turn budget exhausted");
    Ok(SpecialistOutcome::Interrupted {
        partial_text: String::new(),
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
