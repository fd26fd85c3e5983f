//! Settings data model with compiled defaults.
//!
//! The defaults describe the demo customer-service deployment: a
//! concierge triage agent plus order and refund specialists, the abuse
//! pattern list, and the runtime bounds. Any field can be overridden by a
//! JSON file or `RELAY_*` environment variables (see the loader).

use serde::{Deserialize, Serialize};
use relay_core::agents::AgentDescriptor;
use relay_core::ids::AgentId;

// ─────────────────────────────────────────────────────────────────────────────
// Runtime settings
// ─────────────────────────────────────────────────────────────────────────────

/// Bounds and canned responses for the turn runtime.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RuntimeSettings {
    /// Maximum model turns in one specialist loop.
    pub max_turns: u32,
    /// Maximum turns processing concurrently across all sessions.
    pub max_concurrent_runs: usize,
    /// Default per-tool execution timeout in milliseconds.
    pub tool_timeout_ms: u64,
    /// Agent that owns unclassifiable messages.
    pub default_agent: String,
    /// Answer appended when an input guardrail blocks the turn.
    pub blocked_input_message: String,
    /// Answer substituted when an output guardrail blocks the answer.
    pub blocked_output_message: String,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            max_turns: 8,
            max_concurrent_runs: 32,
            tool_timeout_ms: 10_000,
            default_agent: "concierge".into(),
            blocked_input_message: "I can't continue with this conversation while it includes \
                                    threats or abusive language. If you'd like help with your \
                                    account or an order, I'm happy to assist."
                .into(),
            blocked_output_message: "I'm sorry, I can't share that response. Is there something \
                                     else I can help you with?"
                .into(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Agent settings
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration for one agent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AgentSettings {
    /// Stable agent identifier.
    pub id: String,
    /// Human-readable name.
    pub display_name: String,
    /// Capability tags used for routing and handoffs.
    pub capabilities: Vec<String>,
    /// System instructions.
    pub instructions: String,
    /// Names of the tools this agent may call.
    pub tools: Vec<String>,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            id: String::new(),
            display_name: String::new(),
            capabilities: Vec::new(),
            instructions: String::new(),
            tools: Vec::new(),
        }
    }
}

impl AgentSettings {
    /// Build the immutable descriptor used by the runtime.
    #[must_use]
    pub fn into_descriptor(self) -> AgentDescriptor {
        AgentDescriptor {
            id: AgentId::from(self.id),
            display_name: self.display_name,
            capabilities: self.capabilities,
            instructions: self.instructions,
            tool_names: self.tools,
            output_schema: None,
        }
    }
}

fn default_agents() -> Vec<AgentSettings> {
    vec![
        AgentSettings {
            id: "concierge".into(),
            display_name: "Customer Concierge".into(),
            capabilities: vec!["general".into()],
            instructions: "You are a friendly customer service concierge. Greet the customer, \
                           answer general questions about the store, and hand the conversation \
                           to a specialist when the customer asks about a specific order or a \
                           refund."
                .into(),
            tools: vec![],
        },
        AgentSettings {
            id: "orders".into(),
            display_name: "Order Support".into(),
            capabilities: vec!["orders".into(), "shipping".into()],
            instructions: "You help customers check on their orders. Use lookup_order for a \
                           specific order ID and list_customer_orders to show everything on \
                           the account. Report status, tracking, and delivery dates plainly. \
                           If the customer asks for a refund, hand off to the refunds \
                           specialist."
                .into(),
            tools: vec!["lookup_order".into(), "list_customer_orders".into()],
        },
        AgentSettings {
            id: "refunds".into(),
            display_name: "Refund Support".into(),
            capabilities: vec!["refunds".into()],
            instructions: "You handle refund requests. Always calculate_refund first to check \
                           eligibility, explain the result, and only process_refund once the \
                           customer confirms. Orders still processing get a full refund; \
                           shipped orders are refundable on return for premium customers only; \
                           delivered orders over $50 need manager approval."
                .into(),
            tools: vec![
                "lookup_order".into(),
                "calculate_refund".into(),
                "process_refund".into(),
            ],
        },
    ]
}

// ─────────────────────────────────────────────────────────────────────────────
// Guardrail settings
// ─────────────────────────────────────────────────────────────────────────────

/// Guardrail configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GuardrailSettings {
    /// Regex patterns for the input abuse guardrail.
    pub abuse_patterns: Vec<String>,
}

impl Default for GuardrailSettings {
    fn default() -> Self {
        Self {
            abuse_patterns: vec![
                r"(?i)\b(destroy|kill|hurt|attack|murder)\b.*\b(you|your|everyone|all)\b".into(),
                r"(?i)\byou\s+(idiots?|morons?|fools?)\b".into(),
                r"(?i)\bi('ll| will)\s+(hurt|find|get)\s+you\b".into(),
            ],
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Top level
// ─────────────────────────────────────────────────────────────────────────────

/// The full Relay configuration tree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RelaySettings {
    /// Turn runtime bounds and canned responses.
    pub runtime: RuntimeSettings,
    /// The agents to register at startup.
    pub agents: Vec<AgentSettings>,
    /// Guardrail configuration.
    pub guardrails: GuardrailSettings,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            runtime: RuntimeSettings::default(),
            agents: default_agents(),
            guardrails: GuardrailSettings::default(),
        }
    }
}

impl RelaySettings {
    /// Build the agent descriptors this configuration defines.
    #[must_use]
    pub fn agent_descriptors(&self) -> Vec<AgentDescriptor> {
        self.agents
            .iter()
            .cloned()
            .map(AgentSettings::into_descriptor)
            .collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
