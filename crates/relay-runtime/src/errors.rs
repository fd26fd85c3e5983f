//! Runtime error types.

use thiserror::Error;
use relay_llm::ProviderError;

/// Errors that can abort a turn.
///
/// Tool failures, guardrail blocks, and ambiguous classification never
/// surface here — they all resolve to a safe response inside the turn.
/// What remains is the caller's problem: retry, back off, or fix the
/// request.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The model provider failed.
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    /// A turn is already in flight for this session.
    #[error("session busy: {session_id}")]
    SessionBusy {
        /// The busy session.
        session_id: String,
    },

    /// The concurrent-run cap is exhausted.
    #[error("server busy: {active} of {max} runs in flight")]
    ServerBusy {
        /// Runs currently in flight.
        active: usize,
        /// The configured cap.
        max: usize,
    },

    /// No session with the given ID exists.
    #[error("session not found: {session_id}")]
    SessionNotFound {
        /// The unknown session.
        session_id: String,
    },

    /// Internal error (catch-all).
    #[error("{message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl RuntimeError {
    /// Whether the caller may retry the turn as-is.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Provider(e) => e.is_retryable(),
            Self::SessionBusy { .. } | Self::ServerBusy { .. } => true,
            Self::SessionNotFound { .. } | Self::Internal { .. } => false,
        }
    }

    /// Error category string for event emission.
    #[must_use]
    pub fn category(&self) -> &'static str {
        match self {
            Self::Provider(_) => "provider",
            Self::SessionBusy { .. } => "session_busy",
            Self::ServerBusy { .. } => "server_busy",
            Self::SessionNotFound { .. } => "session_not_found",
            Self::Internal { .. } => "internal",
        }
    }
}
