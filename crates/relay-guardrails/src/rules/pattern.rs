//! Regex pattern guardrail.
//!
//! Trips when any configured pattern matches the payload. Deterministic
//! and cheap, so it runs before any model-backed rule.

use async_trait::async_trait;
use regex::Regex;
use serde_json::json;

use crate::pipeline::{Guardrail, GuardrailView};
use crate::types::{Direction, GuardrailError, GuardrailResult};

/// A guardrail that trips when any of its regex patterns matches.
pub struct PatternRule {
    id: String,
    direction: Direction,
    patterns: Vec<Regex>,
}

impl PatternRule {
    /// Compile a rule from pattern strings.
    ///
    /// Returns an error if any pattern fails to compile.
    pub fn new(
        id: impl Into<String>,
        direction: Direction,
        patterns: &[String],
    ) -> Result<Self, GuardrailError> {
        let compiled = patterns
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| GuardrailError::Evaluation {
                    message: format!("invalid pattern {p:?}: {e}"),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            id: id.into(),
            direction,
            patterns: compiled,
        })
    }
}

#[async_trait]
impl Guardrail for PatternRule {
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
        for pattern in &self.patterns {
            if pattern.is_match(payload) {
                return Ok(GuardrailResult::tripwire(json!({
                    "matchedPattern": pattern.as_str(),
                })));
            }
        }
        Ok(GuardrailResult::pass())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
