//! Deterministic scripted provider for tests and demo wiring.
//!
//! [`ScriptedProvider`] replays a queue of canned model turns and answers
//! classification requests with keyword matching. It gives the runtime an
//! end-to-end provider with no network dependency and fully predictable
//! behavior.

use std::collections::VecDeque;

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream;
use parking_lot::Mutex;
use relay_core::messages::{Context, ToolCall};

use crate::provider::{
    Classification, ModelEvent, ModelEventStream, Provider, ProviderError, ProviderOptions,
    ProviderResult, StopReason,
};

/// One queued response: either a complete model turn or an error returned
/// when the turn is requested.
enum ScriptedResponse {
    Turn(Vec<ModelEvent>),
    Error(ProviderError),
}

/// A provider that replays canned turns in order.
///
/// Turns are consumed FIFO by [`Provider::stream`]; classification is
/// answered from keyword routes and never consumes a turn.
pub struct ScriptedProvider {
    turns: Mutex<VecDeque<ScriptedResponse>>,
    routes: Vec<(String, String)>,
}

impl ScriptedProvider {
    /// Create a provider with an empty script and no routes.
    #[must_use]
    pub fn new() -> Self {
        Self {
            turns: Mutex::new(VecDeque::new()),
            routes: Vec::new(),
        }
    }

    /// Add a classification route: messages containing `keyword`
    /// (case-insensitive) match `capability`.
    #[must_use]
    pub fn with_route(mut self, keyword: impl Into<String>, capability: impl Into<String>) -> Self {
        self.routes
            .push((keyword.into().to_lowercase(), capability.into()));
        self
    }

    /// Queue a raw turn.
    pub fn push_turn(&self, events: Vec<ModelEvent>) {
        self.turns.lock().push_back(ScriptedResponse::Turn(events));
    }

    /// Queue a plain final-answer turn.
    pub fn push_text(&self, text: impl Into<String>) {
        self.push_turn(vec![
            ModelEvent::TextDelta { text: text.into() },
            ModelEvent::Done {
                stop_reason: StopReason::EndTurn,
            },
        ]);
    }

    /// Queue a turn that requests tool invocations.
    pub fn push_tool_calls(&self, tool_calls: Vec<ToolCall>) {
        let mut events: Vec<ModelEvent> = tool_calls
            .into_iter()
            .map(|tool_call| ModelEvent::ToolCall { tool_call })
            .collect();
        events.push(ModelEvent::Done {
            stop_reason: StopReason::ToolUse,
        });
        self.push_turn(events);
    }

    /// Queue a turn that requests a handoff.
    pub fn push_handoff(&self, capability: impl Into<String>, reason: impl Into<String>) {
        self.push_turn(vec![
            ModelEvent::Handoff {
                capability: capability.into(),
                reason: reason.into(),
            },
            ModelEvent::Done {
                stop_reason: StopReason::Handoff,
            },
        ]);
    }

    /// Queue an error to be returned in place of the next turn.
    pub fn push_error(&self, error: ProviderError) {
        self.turns.lock().push_back(ScriptedResponse::Error(error));
    }

    /// Number of turns left in the script.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.turns.lock().len()
    }
}

impl Default for ScriptedProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn stream(
        &self,
        _context: &Context,
        _options: &ProviderOptions,
    ) -> ProviderResult<ModelEventStream> {
        let next = self.turns.lock().pop_front();
        match next {
            Some(ScriptedResponse::Turn(events)) => {
                Ok(stream::iter(events.into_iter().map(Ok)).boxed())
            }
            Some(ScriptedResponse::Error(error)) => Err(error),
            None => Err(ProviderError::Other {
                message: "script exhausted".into(),
            }),
        }
    }

    async fn classify(
        &self,
        message: &str,
        capabilities: &[String],
    ) -> ProviderResult<Classification> {
        let haystack = message.to_lowercase();
        let mut matched: Vec<String> = Vec::new();
        for (keyword, capability) in &self.routes {
            if haystack.contains(keyword.as_str())
                && capabilities.contains(capability)
                && !matched.contains(capability)
            {
                matched.push(capability.clone());
            }
        }
        Ok(Classification {
            capabilities: matched,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
