//! # relay-llm
//!
//! The model-invocation contract for the Relay dispatch core.
//!
//! [`Provider`] is the seam between the runtime and whatever
//! classification/generation service backs it. The runtime consumes a
//! stream of [`ModelEvent`]s per turn and a [`Classification`] verdict
//! for routing; everything upstream of that boundary is a black box.
//!
//! [`ScriptedProvider`] is an in-memory implementation used by tests and
//! demo wiring: canned turns plus keyword-based classification.

pub mod provider;
pub mod scripted;

pub use provider::{
    Classification, ModelEvent, ModelEventStream, Provider, ProviderError, ProviderOptions,
    ProviderResult, StopReason,
};
pub use scripted::ScriptedProvider;
