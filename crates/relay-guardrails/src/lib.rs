//! # relay-guardrails
//!
//! Safety validators for the Relay dispatch core.
//!
//! Guardrails evaluate a payload (a user message on the way in, an
//! assembled answer on the way out) against a read-only session view and
//! return a pure [`GuardrailResult`] — there is no exception-based control
//! flow. The [`GuardrailPipeline`] runs validators in registration order,
//! short-circuits on the first tripwire, and treats a validator failure as
//! a triggered tripwire (fail-closed).

pub mod pipeline;
pub mod rules;
pub mod types;

pub use pipeline::{Guardrail, GuardrailPipeline, GuardrailView, PipelineVerdict};
pub use rules::{ModelRule, PatternRule};
pub use types::{Direction, GuardrailError, GuardrailResult};
