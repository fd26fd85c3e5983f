//! Settings error types.

use thiserror::Error;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// A configuration source failed to load or merge.
    #[error("config error: {0}")]
    Figment(#[from] figment::Error),

    /// The merged configuration is not usable.
    #[error("invalid config: {message}")]
    Invalid {
        /// Description of the problem.
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_display() {
        let err = SettingsError::Invalid {
            message: "default agent not defined".into(),
        };
        assert_eq!(err.to_string(), "invalid config: default agent not defined");
    }
}
