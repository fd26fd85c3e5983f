//! Model-backed content guardrail.
//!
//! Asks a [`Provider`] to judge the payload and parses a JSON verdict of
//! the form `{"flagged": bool, "reason": "..."}`. A provider failure or an
//! unparseable verdict surfaces as an error, which the pipeline converts
//! into a triggered tripwire.

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use serde::Deserialize;
use serde_json::json;
use relay_core::messages::{Context, Message};
use relay_llm::{ModelEvent, Provider, ProviderOptions};

use crate::pipeline::{Guardrail, GuardrailView};
use crate::types::{Direction, GuardrailError, GuardrailResult};

#[derive(Debug, Deserialize)]
struct ModelVerdict {
    flagged: bool,
    #[serde(default)]
    reason: Option<String>,
}

/// A guardrail that delegates judgment to a model provider.
pub struct ModelRule {
    id: String,
    direction: Direction,
    provider: Arc<dyn Provider>,
    instructions: String,
}

impl ModelRule {
    /// Create a rule that judges payloads with the given instructions.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        direction: Direction,
        provider: Arc<dyn Provider>,
        instructions: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            direction,
            provider,
            instructions: instructions.into(),
        }
    }
}

#[async_trait]
impl Guardrail for ModelRule {
    fn id(&self) -> &str {
        &self.id
    }

    fn direction(&self) -> Direction {
        self.direction
    }

    async fn evaluate(
        &self,
        payload: &str,
        _view: &GuardrailView<'_>,
    ) -> Result<GuardrailResult, GuardrailError> {
        let context = Context {
            instructions: self.instructions.clone(),
            messages: vec![Message::user(payload)],
            tools: vec![],
        };
        let mut stream = self
            .provider
            .stream(&context, &ProviderOptions::default())
            .await?;

        let mut text = String::new();
        while let Some(item) = stream.next().await {
            match item? {
                ModelEvent::TextDelta { text: chunk } => text.push_str(&chunk),
                ModelEvent::Done { .. } => break,
                ModelEvent::ToolCall { .. } | ModelEvent::Handoff { .. } => {
                    return Err(GuardrailError::Evaluation {
                        message: "moderation turn produced a non-text event".into(),
                    });
                }
            }
        }

        let verdict: ModelVerdict =
            serde_json::from_str(text.trim()).map_err(|e| GuardrailError::Evaluation {
                message: format!("unparseable moderation verdict: {e}"),
            })?;

        if verdict.flagged {
            Ok(GuardrailResult::tripwire(json!({
                "reason": verdict.reason.unwrap_or_else(|| "flagged".to_owned()),
            })))
        } else {
            Ok(GuardrailResult::pass())
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
