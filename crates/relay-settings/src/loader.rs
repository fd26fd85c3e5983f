//! Layered configuration loading.
//!
//! Precedence, lowest to highest: compiled defaults, a JSON config file,
//! `RELAY_*` environment variables (nested keys joined with `__`, e.g.
//! `RELAY_RUNTIME__MAX_TURNS=4`).

use std::path::Path;

use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized};
use tracing::debug;

use crate::errors::SettingsError;
use crate::types::RelaySettings;

/// Load settings from defaults and the environment only.
pub fn load() -> Result<RelaySettings, SettingsError> {
    load_from(None)
}

/// Load settings, merging the given JSON file over the defaults.
pub fn load_from(path: Option<&Path>) -> Result<RelaySettings, SettingsError> {
    let mut figment = Figment::from(Serialized::defaults(RelaySettings::default()));
    if let Some(path) = path {
        debug!(path = %path.display(), "merging config file");
        figment = figment.merge(Json::file(path));
    }
    figment = figment.merge(Env::prefixed("RELAY_").split("__"));

    let settings: RelaySettings = figment.extract()?;
    validate(&settings)?;
    Ok(settings)
}

/// Reject configurations the runtime cannot start with.
fn validate(settings: &RelaySettings) -> Result<(), SettingsError> {
    if settings.runtime.max_turns == 0 {
        return Err(SettingsError::Invalid {
            message: "runtime.maxTurns must be at least 1".into(),
        });
    }
    if settings.agents.is_empty() {
        return Err(SettingsError::Invalid {
            message: "at least one agent must be defined".into(),
        });
    }
    let default = &settings.runtime.default_agent;
    if !settings.agents.iter().any(|a| &a.id == default) {
        return Err(SettingsError::Invalid {
            message: format!("default agent {default:?} is not defined in agents"),
        });
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
