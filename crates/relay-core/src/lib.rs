//! # relay-core
//!
//! Shared vocabulary for the Relay multi-agent dispatch core.
//!
//! This crate defines the types every other Relay crate speaks:
//! branded IDs, the conversation message log, agent descriptors,
//! tool schemas and results, and the runtime event model. It has no
//! runtime behavior of its own.

pub mod agents;
pub mod events;
pub mod ids;
pub mod messages;
pub mod tools;

pub use agents::{AgentDescriptor, HandoffRecord};
pub use events::{BaseEvent, RelayEvent};
pub use ids::{AgentId, RunId, SessionId, ToolCallId};
pub use messages::{Context, Message, ToolCall};
pub use tools::{Tool, ToolOutput, ToolParameterSchema, error_result, text_result};
