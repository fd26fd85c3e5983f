//! Conversation message types and the provider context.
//!
//! A session's history is an append-only sequence of [`Message`]s. Every
//! message carries an RFC 3339 UTC timestamp assigned when it is created;
//! messages are never edited after being appended.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ids::ToolCallId;
use crate::tools::Tool;

/// Current UTC time as an RFC 3339 string.
#[must_use]
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

// ─────────────────────────────────────────────────────────────────────────────
// Message
// ─────────────────────────────────────────────────────────────────────────────

/// A single entry in a session's conversation log.
///
/// Tagged by `role` on the wire: `user`, `assistant`, or `tool`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum Message {
    /// A message from the end user.
    User {
        /// Message text.
        content: String,
        /// RFC 3339 UTC creation time.
        timestamp: String,
    },
    /// A message produced by an agent.
    Assistant {
        /// Message text.
        content: String,
        /// RFC 3339 UTC creation time.
        timestamp: String,
    },
    /// The result of a tool invocation, fed back to the model.
    #[serde(rename = "tool")]
    ToolResult {
        /// The tool call this result answers.
        tool_call_id: ToolCallId,
        /// Result text (or error description).
        content: String,
        /// Whether the invocation failed.
        #[serde(skip_serializing_if = "Option::is_none")]
        is_error: Option<bool>,
        /// RFC 3339 UTC creation time.
        timestamp: String,
    },
}

impl Message {
    /// Create a user message timestamped now.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::User {
            content: content.into(),
            timestamp: now_rfc3339(),
        }
    }

    /// Create an assistant message timestamped now.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant {
            content: content.into(),
            timestamp: now_rfc3339(),
        }
    }

    /// Create a tool result message timestamped now.
    #[must_use]
    pub fn tool_result(
        tool_call_id: ToolCallId,
        content: impl Into<String>,
        is_error: bool,
    ) -> Self {
        Self::ToolResult {
            tool_call_id,
            content: content.into(),
            is_error: if is_error { Some(true) } else { None },
            timestamp: now_rfc3339(),
        }
    }

    /// The wire role string for this message.
    #[must_use]
    pub fn role(&self) -> &'static str {
        match self {
            Self::User { .. } => "user",
            Self::Assistant { .. } => "assistant",
            Self::ToolResult { .. } => "tool",
        }
    }

    /// The message text.
    #[must_use]
    pub fn content(&self) -> &str {
        match self {
            Self::User { content, .. }
            | Self::Assistant { content, .. }
            | Self::ToolResult { content, .. } => content,
        }
    }

    /// The creation timestamp.
    #[must_use]
    pub fn timestamp(&self) -> &str {
        match self {
            Self::User { timestamp, .. }
            | Self::Assistant { timestamp, .. }
            | Self::ToolResult { timestamp, .. } => timestamp,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tool calls and provider context
// ─────────────────────────────────────────────────────────────────────────────

/// A tool invocation requested by the model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCall {
    /// Unique ID for this call, echoed back in the tool result.
    pub id: ToolCallId,
    /// Name of the tool to invoke.
    pub name: String,
    /// JSON arguments for the tool.
    pub arguments: Map<String, Value>,
}

impl ToolCall {
    /// Create a tool call with a fresh ID.
    #[must_use]
    pub fn new(name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            id: ToolCallId::new(),
            name: name.into(),
            arguments,
        }
    }
}

/// The payload handed to a provider for one model turn.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Context {
    /// System instructions for the agent that owns this turn.
    pub instructions: String,
    /// Conversation history, oldest first.
    pub messages: Vec<Message>,
    /// Tool schemas available to the model this turn.
    pub tools: Vec<Tool>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
