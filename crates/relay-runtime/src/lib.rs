//! # relay-runtime
//!
//! The turn engine of the Relay dispatch core.
//!
//! One user message becomes one turn: the [`Orchestrator`] registers the
//! run, applies input guardrails, routes the message to an owning agent
//! (the session's active specialist, or the [`router`] for new
//! conversations), drives the bounded specialist loop with tool dispatch,
//! allows at most one handoff, applies output guardrails to the assembled
//! answer, and persists the session. Everything observable along the way
//! is broadcast as [`relay_core::events::RelayEvent`]s.

pub mod agents;
pub mod errors;
pub mod event_emitter;
pub mod orchestrator;
pub mod router;
pub mod session;
pub mod specialist;
pub mod tool_executor;

pub use agents::AgentRegistry;
pub use errors::RuntimeError;
pub use event_emitter::{EventEmitter, SessionEvents};
pub use orchestrator::{Orchestrator, TurnResponse};
pub use router::Router;
pub use session::{Session, SessionStore};
pub use specialist::{SpecialistLimits, SpecialistOutcome};
