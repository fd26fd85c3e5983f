//! Agent descriptors and handoff records.
//!
//! An [`AgentDescriptor`] is the static identity of one agent: who it is,
//! what it can do, and which tools it may call. Descriptors are built from
//! configuration at startup and never change afterwards.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::AgentId;

/// Static definition of a single agent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentDescriptor {
    /// Stable agent identifier.
    pub id: AgentId,
    /// Human-readable name shown in transcripts.
    pub display_name: String,
    /// Capability tags used for routing and handoff resolution.
    pub capabilities: Vec<String>,
    /// System instructions for the model.
    pub instructions: String,
    /// Names of the tools this agent may invoke.
    pub tool_names: Vec<String>,
    /// Optional JSON Schema constraining the agent's final answer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<Value>,
}

impl AgentDescriptor {
    /// Whether this agent advertises the given capability tag.
    #[must_use]
    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.iter().any(|c| c == capability)
    }
}

/// A completed transfer of session ownership between agents.
///
/// Emitted as an event payload; never stored in the session itself.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandoffRecord {
    /// The agent that gave up ownership (`None` when routing assigned the
    /// first owner of the session).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_agent: Option<AgentId>,
    /// The agent that received ownership.
    pub to_agent: AgentId,
    /// Why the transfer happened.
    pub reason: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn orders_agent() -> AgentDescriptor {
        AgentDescriptor {
            id: AgentId::from("orders"),
            display_name: "Order Support".into(),
            capabilities: vec!["orders".into(), "shipping".into()],
            instructions: "You help customers with order status.".into(),
            tool_names: vec!["lookup_order".into(), "list_customer_orders".into()],
            output_schema: None,
        }
    }

    #[test]
    fn has_capability_matches() {
        let agent = orders_agent();
        assert!(agent.has_capability("orders"));
        assert!(agent.has_capability("shipping"));
        assert!(!agent.has_capability("refunds"));
    }

    #[test]
    fn descriptor_serde_roundtrip() {
        let agent = orders_agent();
        let json = serde_json::to_value(&agent).unwrap();
        assert_eq!(json["displayName"], "Order Support");
        assert!(json.get("outputSchema").is_none());
        let back: AgentDescriptor = serde_json::from_value(json).unwrap();
        assert_eq!(back, agent);
    }

    #[test]
    fn handoff_record_serde() {
        let record = HandoffRecord {
            from_agent: Some(AgentId::from("orders")),
            to_agent: AgentId::from("refunds"),
            reason: "customer asked for a refund".into(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["fromAgent"], "orders");
        assert_eq!(json["toAgent"], "refunds");
    }

    #[test]
    fn handoff_record_initial_assignment_omits_from() {
        let record = HandoffRecord {
            from_agent: None,
            to_agent: AgentId::from("orders"),
            reason: "routed".into(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("fromAgent").is_none());
    }
}
