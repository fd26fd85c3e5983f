//! # relay-settings
//!
//! Layered configuration for the Relay dispatch core.
//!
//! Precedence, lowest to highest: compiled defaults → JSON config file →
//! `RELAY_*` environment variables. The compiled defaults describe the
//! demo customer-service deployment, so the runtime starts with no config
//! at all.

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::SettingsError;
pub use loader::{load, load_from};
pub use types::{AgentSettings, GuardrailSettings, RelaySettings, RuntimeSettings};
