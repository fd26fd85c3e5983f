//! Guardrail trait and the fail-closed evaluation pipeline.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use tracing::{debug, warn};
use relay_core::ids::SessionId;
use relay_core::messages::Message;

use crate::types::{Direction, GuardrailError, GuardrailResult};

/// Read-only view of the session handed to every guardrail.
///
/// Guardrails may consult history and scratch data but can never mutate
/// either.
#[derive(Clone, Copy, Debug)]
pub struct GuardrailView<'a> {
    /// Session being evaluated.
    pub session_id: &'a SessionId,
    /// Conversation history, oldest first.
    pub messages: &'a [Message],
    /// Session scratch data.
    pub scratch: &'a Map<String, Value>,
}

/// A single safety validator.
#[async_trait]
pub trait Guardrail: Send + Sync {
    /// Stable identifier, reported in events when the tripwire fires.
    fn id(&self) -> &str;

    /// Which payloads this guardrail inspects.
    fn direction(&self) -> Direction;

    /// Evaluate a payload against the session view.
    async fn evaluate(
        &self,
        payload: &str,
        view: &GuardrailView<'_>,
    ) -> Result<GuardrailResult, GuardrailError>;
}

/// Outcome of running a pipeline over one payload.
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineVerdict {
    /// Whether any tripwire fired.
    pub blocked: bool,
    /// ID of the guardrail that fired, if any.
    pub guardrail_id: Option<String>,
    /// Structured detail from the firing guardrail.
    pub info: Option<Value>,
}

impl PipelineVerdict {
    fn pass() -> Self {
        Self {
            blocked: false,
            guardrail_id: None,
            info: None,
        }
    }

    fn blocked(guardrail_id: &str, info: Option<Value>) -> Self {
        Self {
            blocked: true,
            guardrail_id: Some(guardrail_id.to_owned()),
            info,
        }
    }
}

/// Ordered collection of guardrails with fail-closed evaluation.
///
/// Validators run in registration order and the pipeline short-circuits
/// on the first tripwire. Ordering can only affect which guardrail is
/// reported, never whether a payload is blocked: any single tripwire
/// blocks the turn.
#[derive(Default)]
pub struct GuardrailPipeline {
    guardrails: Vec<Arc<dyn Guardrail>>,
}

impl GuardrailPipeline {
    /// Create an empty pipeline.
    #[must_use]
    pub fn new() -> Self {
        Self {
            guardrails: Vec::new(),
        }
    }

    /// Append a guardrail. Evaluation order is registration order.
    pub fn register(&mut self, guardrail: Arc<dyn Guardrail>) {
        debug!(guardrail_id = guardrail.id(), "guardrail registered");
        self.guardrails.push(guardrail);
    }

    /// Number of registered guardrails (both directions).
    #[must_use]
    pub fn len(&self) -> usize {
        self.guardrails.len()
    }

    /// Whether the pipeline has no guardrails.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.guardrails.is_empty()
    }

    /// Run every guardrail for `direction` over `payload`.
    ///
    /// A validator error is a triggered tripwire: if a guardrail cannot
    /// run, the payload is blocked rather than waved through.
    pub async fn evaluate(
        &self,
        direction: Direction,
        payload: &str,
        view: &GuardrailView<'_>,
    ) -> PipelineVerdict {
        for guardrail in &self.guardrails {
            if guardrail.direction() != direction {
                continue;
            }
            match guardrail.evaluate(payload, view).await {
                Ok(result) if result.tripwire_triggered => {
                    debug!(
                        guardrail_id = guardrail.id(),
                        %direction,
                        "guardrail tripwire triggered"
                    );
                    return PipelineVerdict::blocked(guardrail.id(), result.info);
                }
                Ok(_) => {}
                Err(error) => {
                    warn!(
                        guardrail_id = guardrail.id(),
                        %direction,
                        %error,
                        "guardrail failed to evaluate, blocking payload"
                    );
                    return PipelineVerdict::blocked(
                        guardrail.id(),
                        Some(json!({"error": error.to_string()})),
                    );
                }
            }
        }
        PipelineVerdict::pass()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
