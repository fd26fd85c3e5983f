//! Triage routing: pick the agent that owns a new conversation.
//!
//! The router asks the provider for a capability verdict and maps it to
//! exactly one agent. It can always produce an owner: an unavailable or
//! ambiguous classification falls back to the currently active agent
//! (continuity) and finally to the default agent — never to "no agent",
//! and never to a hard failure.

use std::sync::Arc;

use tracing::{debug, warn};
use relay_core::agents::AgentDescriptor;
use relay_core::ids::AgentId;
use relay_llm::Provider;

use crate::agents::AgentRegistry;

/// Capability-verdict router over the agent registry.
pub struct Router {
    agents: Arc<AgentRegistry>,
}

impl Router {
    /// Create a router over the given registry.
    #[must_use]
    pub fn new(agents: Arc<AgentRegistry>) -> Self {
        Self { agents }
    }

    /// Choose the agent that should own `message`.
    ///
    /// `active` is the specialist that owned the session before this
    /// turn, if any; it wins ties between equally likely candidates.
    pub async fn classify(
        &self,
        provider: &Arc<dyn Provider>,
        message: &str,
        active: Option<&AgentId>,
    ) -> Arc<AgentDescriptor> {
        let capabilities = self.agents.capabilities();
        let verdict = match provider.classify(message, &capabilities).await {
            Ok(verdict) => verdict,
            Err(error) => {
                warn!(%error, "classification unavailable, using default agent");
                return self.agents.default_agent();
            }
        };

        // Map capability candidates to distinct agents, preserving order.
        let mut candidates: Vec<Arc<AgentDescriptor>> = Vec::new();
        for capability in &verdict.capabilities {
            if let Some(agent) = self.agents.by_capability(capability) {
                if !candidates.iter().any(|c| c.id == agent.id) {
                    candidates.push(agent);
                }
            }
        }

        let chosen = match candidates.len() {
            0 => {
                debug!("no capability matched, using default agent");
                self.agents.default_agent()
            }
            1 => candidates.remove(0),
            _ => {
                // Ambiguous: prefer the agent already holding the session.
                if let Some(active) = active {
                    if let Some(agent) = candidates.iter().find(|c| &c.id == active) {
                        debug!(agent_id = %active, "ambiguous classification, keeping active agent");
                        return agent.clone();
                    }
                }
                debug!("ambiguous classification, using default agent");
                self.agents.default_agent()
            }
        };
        debug!(agent_id = %chosen.id, "message routed");
        chosen
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
