//! Session state: the append-only conversation log and its store.

pub mod store;

pub use store::SessionStore;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use relay_core::ids::{AgentId, SessionId};
use relay_core::messages::Message;
use relay_tools::customer::CustomerProfile;

/// One conversation with one customer.
///
/// The message log is append-only: entries are added through
/// [`push_message`](Session::push_message) and never edited or removed.
/// `active_agent` tracks which specialist owns the conversation between
/// turns; `scratch` is free-form working data for agents and guardrails.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    id: SessionId,
    customer: CustomerProfile,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    active_agent: Option<AgentId>,
    #[serde(default)]
    scratch: Map<String, Value>,
}

impl Session {
    /// Create an empty session for a customer.
    #[must_use]
    pub fn new(id: SessionId, customer: CustomerProfile) -> Self {
        Self {
            id,
            customer,
            messages: Vec::new(),
            active_agent: None,
            scratch: Map::new(),
        }
    }

    /// Session identifier.
    #[must_use]
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// The customer this session is on behalf of.
    #[must_use]
    pub fn customer(&self) -> &CustomerProfile {
        &self.customer
    }

    /// The conversation log, oldest first.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Append a message to the log.
    pub fn push_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// The specialist that owns the conversation, if any.
    #[must_use]
    pub fn active_agent(&self) -> Option<&AgentId> {
        self.active_agent.as_ref()
    }

    /// Set or clear the owning specialist.
    pub fn set_active_agent(&mut self, agent: Option<AgentId>) {
        self.active_agent = agent;
    }

    /// Session scratch data.
    #[must_use]
    pub fn scratch(&self) -> &Map<String, Value> {
        &self.scratch
    }

    /// Set one scratch entry.
    pub fn set_scratch(&mut self, key: impl Into<String>, value: Value) {
        let _ = self.scratch.insert(key.into(), value);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
