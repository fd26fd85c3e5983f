//! Runtime event model.
//!
//! Everything observable about a turn is surfaced as a [`RelayEvent`]:
//! turn bracketing, incremental answer text, tool execution, handoffs,
//! guardrail blocks, and failures. Events are broadcast to subscribers
//! (chat surfaces, loggers) and are not a persistence format.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::agents::HandoffRecord;
use crate::ids::{AgentId, SessionId, ToolCallId};
use crate::messages::now_rfc3339;

/// Fields common to every event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseEvent {
    /// Session the event belongs to.
    pub session_id: SessionId,
    /// RFC 3339 UTC emission time.
    pub timestamp: String,
}

impl BaseEvent {
    /// Create a base event timestamped now.
    #[must_use]
    pub fn now(session_id: impl Into<SessionId>) -> Self {
        Self {
            session_id: session_id.into(),
            timestamp: now_rfc3339(),
        }
    }
}

/// All events emitted by the Relay runtime.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum RelayEvent {
    /// A user turn started processing.
    TurnStart {
        /// Common fields.
        #[serde(flatten)]
        base: BaseEvent,
        /// The agent that owned the session when the turn began, if any.
        #[serde(skip_serializing_if = "Option::is_none")]
        agent_id: Option<AgentId>,
    },

    /// An incremental chunk of assistant answer text.
    AssistantDelta {
        /// Common fields.
        #[serde(flatten)]
        base: BaseEvent,
        /// The text chunk.
        text: String,
    },

    /// A tool invocation is about to execute.
    ToolExecutionStart {
        /// Common fields.
        #[serde(flatten)]
        base: BaseEvent,
        /// ID of the tool call.
        tool_call_id: ToolCallId,
        /// Name of the tool.
        tool_name: String,
        /// Arguments passed to the tool.
        arguments: Map<String, Value>,
    },

    /// A tool invocation finished (successfully or not).
    ToolExecutionEnd {
        /// Common fields.
        #[serde(flatten)]
        base: BaseEvent,
        /// ID of the tool call.
        tool_call_id: ToolCallId,
        /// Name of the tool.
        tool_name: String,
        /// Wall-clock duration in milliseconds.
        duration_ms: u64,
        /// Whether the invocation produced an error result.
        is_error: bool,
    },

    /// Session ownership transferred between agents.
    Handoff {
        /// Common fields.
        #[serde(flatten)]
        base: BaseEvent,
        /// The completed transfer.
        record: HandoffRecord,
    },

    /// A guardrail tripwire fired and the turn was intercepted.
    GuardrailBlocked {
        /// Common fields.
        #[serde(flatten)]
        base: BaseEvent,
        /// `"input"` or `"output"`.
        direction: String,
        /// ID of the guardrail that fired.
        guardrail_id: String,
        /// Structured detail from the guardrail, if any.
        #[serde(skip_serializing_if = "Option::is_none")]
        info: Option<Value>,
    },

    /// A user turn completed and the session was persisted.
    TurnEnd {
        /// Common fields.
        #[serde(flatten)]
        base: BaseEvent,
        /// The agent that produced the final answer.
        agent_id: AgentId,
        /// Wall-clock duration in milliseconds.
        duration_ms: u64,
    },

    /// A user turn failed with a runtime error.
    TurnFailed {
        /// Common fields.
        #[serde(flatten)]
        base: BaseEvent,
        /// Error description.
        error: String,
        /// Error category string.
        category: String,
        /// Whether the caller may retry the turn.
        recoverable: bool,
    },
}

impl RelayEvent {
    /// The wire type tag for this event.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::TurnStart { .. } => "turn_start",
            Self::AssistantDelta { .. } => "assistant_delta",
            Self::ToolExecutionStart { .. } => "tool_execution_start",
            Self::ToolExecutionEnd { .. } => "tool_execution_end",
            Self::Handoff { .. } => "handoff",
            Self::GuardrailBlocked { .. } => "guardrail_blocked",
            Self::TurnEnd { .. } => "turn_end",
            Self::TurnFailed { .. } => "turn_failed",
        }
    }

    /// The session this event belongs to.
    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        match self {
            Self::TurnStart { base, .. }
            | Self::AssistantDelta { base, .. }
            | Self::ToolExecutionStart { base, .. }
            | Self::ToolExecutionEnd { base, .. }
            | Self::Handoff { base, .. }
            | Self::GuardrailBlocked { base, .. }
            | Self::TurnEnd { base, .. }
            | Self::TurnFailed { base, .. } => &base.session_id,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
