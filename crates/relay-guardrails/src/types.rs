//! Guardrail result and error types.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use relay_llm::ProviderError;

/// Which side of the turn a guardrail inspects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// The incoming user message, before any agent work.
    Input,
    /// The assembled assistant answer, before it is persisted.
    Output,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Input => "input",
            Self::Output => "output",
        };
        f.write_str(s)
    }
}

/// The verdict a single guardrail returns.
///
/// A pure value: `tripwire_triggered` decides whether the turn is
/// intercepted, `info` carries structured detail for events and logs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardrailResult {
    /// Whether the payload passed.
    pub passed: bool,
    /// Whether the turn must be intercepted.
    pub tripwire_triggered: bool,
    /// Structured detail (matched pattern, classifier reason, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<Value>,
}

impl GuardrailResult {
    /// A passing verdict.
    #[must_use]
    pub fn pass() -> Self {
        Self {
            passed: true,
            tripwire_triggered: false,
            info: None,
        }
    }

    /// A tripwire verdict with structured detail.
    #[must_use]
    pub fn tripwire(info: Value) -> Self {
        Self {
            passed: false,
            tripwire_triggered: true,
            info: Some(info),
        }
    }
}

/// Errors raised while evaluating a guardrail.
///
/// The pipeline converts any of these into a triggered tripwire — a
/// guardrail that cannot run is treated as a guardrail that fired.
#[derive(Debug, thiserror::Error)]
pub enum GuardrailError {
    /// The validator itself failed.
    #[error("guardrail evaluation failed: {message}")]
    Evaluation {
        /// Description of the failure.
        message: String,
    },

    /// A model-backed validator could not reach its provider.
    #[error("guardrail provider error: {0}")]
    Provider(#[from] ProviderError),
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
