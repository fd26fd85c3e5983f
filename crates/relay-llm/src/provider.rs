//! # Provider Trait
//!
//! Core abstraction for model backends. Every backend implements
//! [`Provider`] to expose a unified streaming interface plus a routing
//! classification call.
//!
//! The trait returns a boxed [`Stream`] of [`ModelEvent`]s, allowing the
//! runtime to process answer text, tool calls, and handoff requests
//! incrementally regardless of the underlying API format.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use relay_core::messages::{Context, ToolCall};

/// Result type alias for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Boxed stream of [`ModelEvent`]s returned by [`Provider::stream`].
pub type ModelEventStream =
    Pin<Box<dyn Stream<Item = Result<ModelEvent, ProviderError>> + Send>>;

// ─────────────────────────────────────────────────────────────────────────────
// Model events
// ─────────────────────────────────────────────────────────────────────────────

/// Why a model turn stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The model finished its answer.
    EndTurn,
    /// The model requested tool invocations.
    ToolUse,
    /// The model requested a transfer of control.
    Handoff,
}

/// One incremental event in a model turn.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ModelEvent {
    /// An incremental chunk of answer text.
    TextDelta {
        /// The text chunk.
        text: String,
    },
    /// A requested tool invocation.
    ToolCall {
        /// The invocation request.
        tool_call: ToolCall,
    },
    /// A request to transfer the session to another agent.
    Handoff {
        /// Capability tag the target agent must carry.
        capability: String,
        /// Why the transfer is requested.
        reason: String,
    },
    /// The turn is complete.
    Done {
        /// Why the turn stopped.
        stop_reason: StopReason,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

/// Errors that can occur during provider operations.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The model service is unreachable or overloaded. Retryable.
    #[error("model unavailable: {message}")]
    Unavailable {
        /// Error description.
        message: String,
    },

    /// The model's output could not be parsed.
    #[error("parse error: {message}")]
    Parse {
        /// Error description.
        message: String,
    },

    /// The stream was cancelled.
    #[error("stream cancelled")]
    Cancelled,

    /// Provider-specific error.
    #[error("{message}")]
    Other {
        /// Error description.
        message: String,
    },
}

impl ProviderError {
    /// Whether this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Unavailable { .. } => true,
            Self::Parse { .. } | Self::Cancelled | Self::Other { .. } => false,
        }
    }

    /// Error category string for event emission.
    #[must_use]
    pub fn category(&self) -> &'static str {
        match self {
            Self::Unavailable { .. } => "unavailable",
            Self::Parse { .. } => "parse",
            Self::Cancelled => "cancelled",
            Self::Other { .. } => "unknown",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Classification
// ─────────────────────────────────────────────────────────────────────────────

/// A routing verdict from [`Provider::classify`].
///
/// `capabilities` holds the candidate capability tags the message matched,
/// in descending preference order. An empty list means the classifier could
/// not place the message; the router falls back to the default agent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    /// Candidate capability tags (may be empty).
    pub capabilities: Vec<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Provider trait
// ─────────────────────────────────────────────────────────────────────────────

/// Options for a provider stream request.
///
/// All fields are optional — providers use sensible defaults when not
/// specified.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderOptions {
    /// Maximum tokens to generate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Sampling temperature (0.0 - 2.0).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

/// Core model provider trait.
///
/// Implementors must be `Send + Sync` for use across async tasks.
/// The [`stream`](Provider::stream) method returns an async stream of
/// [`ModelEvent`]s that the runtime consumes incrementally;
/// [`classify`](Provider::classify) produces the routing verdict the
/// triage layer uses to pick an owning agent.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider identifier (e.g. `"scripted"`).
    fn name(&self) -> &str;

    /// Stream a model turn for the given context.
    ///
    /// The caller should consume events until [`ModelEvent::Done`] or the
    /// stream ends.
    async fn stream(
        &self,
        context: &Context,
        options: &ProviderOptions,
    ) -> ProviderResult<ModelEventStream>;

    /// Classify a user message against the known capability tags.
    ///
    /// `capabilities` is the full set of tags carried by registered agents.
    /// The verdict lists the candidates the message matched, best first.
    async fn classify(
        &self,
        message: &str,
        capabilities: &[String],
    ) -> ProviderResult<Classification>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
