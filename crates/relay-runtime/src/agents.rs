//! Agent registry.
//!
//! Holds the immutable [`AgentDescriptor`]s built from settings at
//! startup, in registration order. Capability resolution is
//! deterministic: the first registered agent carrying a tag wins.

use std::collections::HashMap;
use std::sync::Arc;

use relay_core::agents::AgentDescriptor;
use relay_core::ids::AgentId;

use crate::errors::RuntimeError;

/// Registry of configured agents plus the designated default.
pub struct AgentRegistry {
    ordered: Vec<Arc<AgentDescriptor>>,
    by_id: HashMap<AgentId, Arc<AgentDescriptor>>,
    default_agent: AgentId,
}

impl AgentRegistry {
    /// Build a registry from descriptors.
    ///
    /// Fails if `default_agent` does not name one of the descriptors —
    /// every fallback path ends at the default agent, so it must exist.
    pub fn new(
        descriptors: Vec<AgentDescriptor>,
        default_agent: AgentId,
    ) -> Result<Self, RuntimeError> {
        let ordered: Vec<Arc<AgentDescriptor>> =
            descriptors.into_iter().map(Arc::new).collect();
        let mut by_id = HashMap::new();
        for agent in &ordered {
            let _ = by_id.insert(agent.id.clone(), agent.clone());
        }
        if !by_id.contains_key(&default_agent) {
            return Err(RuntimeError::Internal {
                message: format!("default agent {default_agent:?} is not registered"),
            });
        }
        Ok(Self {
            ordered,
            by_id,
            default_agent,
        })
    }

    /// Look up an agent by ID.
    #[must_use]
    pub fn get(&self, id: &AgentId) -> Option<Arc<AgentDescriptor>> {
        self.by_id.get(id).cloned()
    }

    /// The default agent.
    #[must_use]
    pub fn default_agent(&self) -> Arc<AgentDescriptor> {
        self.by_id[&self.default_agent].clone()
    }

    /// The first registered agent carrying the given capability tag.
    #[must_use]
    pub fn by_capability(&self, capability: &str) -> Option<Arc<AgentDescriptor>> {
        self.ordered
            .iter()
            .find(|a| a.has_capability(capability))
            .cloned()
    }

    /// Every capability tag carried by any agent, in registration order,
    /// deduplicated.
    #[must_use]
    pub fn capabilities(&self) -> Vec<String> {
        let mut tags: Vec<String> = Vec::new();
        for agent in &self.ordered {
            for tag in &agent.capabilities {
                if !tags.contains(tag) {
                    tags.push(tag.clone());
                }
            }
        }
        tags
    }

    /// Number of registered agents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(id: &str, capabilities: &[&str]) -> AgentDescriptor {
        AgentDescriptor {
            id: AgentId::from(id),
            display_name: id.to_owned(),
            capabilities: capabilities.iter().map(|&c| c.to_owned()).collect(),
            instructions: String::new(),
            tool_names: vec![],
            output_schema: None,
        }
    }

    fn registry() -> AgentRegistry {
        AgentRegistry::new(
            vec![
                descriptor("concierge", &["general"]),
                descriptor("orders", &["orders", "shipping"]),
                descriptor("refunds", &["refunds"]),
            ],
            AgentId::from("concierge"),
        )
        .unwrap()
    }

    #[test]
    fn missing_default_agent_is_error() {
        let result = AgentRegistry::new(
            vec![descriptor("orders", &["orders"])],
            AgentId::from("ghost"),
        );
        assert!(matches!(result, Err(RuntimeError::Internal { .. })));
    }

    #[test]
    fn get_and_default() {
        let reg = registry();
        assert_eq!(reg.len(), 3);
        assert!(reg.get(&AgentId::from("orders")).is_some());
        assert!(reg.get(&AgentId::from("ghost")).is_none());
        assert_eq!(reg.default_agent().id.as_str(), "concierge");
    }

    #[test]
    fn by_capability_first_registered_wins() {
        let reg = AgentRegistry::new(
            vec![
                descriptor("a", &["shared"]),
                descriptor("b", &["shared"]),
            ],
            AgentId::from("a"),
        )
        .unwrap();
        assert_eq!(reg.by_capability("shared").unwrap().id.as_str(), "a");
    }

    #[test]
    fn by_capability_unknown_is_none() {
        assert!(registry().by_capability("billing").is_none());
    }

    #[test]
    fn capabilities_in_registration_order() {
        let caps = registry().capabilities();
        assert_eq!(caps, vec!["general", "orders", "shipping", "refunds"]);
    }
}
