//! Fan-out of [`RelayEvent`]s to chat surfaces.
//!
//! One orchestrator serves many sessions, but a surface renders exactly
//! one conversation. All events go onto a single broadcast channel;
//! [`EventEmitter::subscribe_session`] layers a per-session filter on
//! top so a surface only ever sees its own turn's traffic.

use tokio::sync::broadcast;
use tracing::trace;
use relay_core::events::RelayEvent;
use relay_core::ids::SessionId;

/// Default broadcast channel capacity.
const DEFAULT_CAPACITY: usize = 1024;

/// Publishes runtime events to any number of subscribers.
///
/// `emit` never awaits; a receiver that falls further behind than the
/// channel capacity loses the overwritten events rather than slowing
/// the turn down.
pub struct EventEmitter {
    tx: broadcast::Sender<RelayEvent>,
}

impl EventEmitter {
    /// An emitter with the default channel capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// An emitter with a custom channel capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish an event, returning how many receivers took it.
    ///
    /// With no subscribers the event is simply dropped; turns never
    /// depend on anyone listening.
    pub fn emit(&self, event: RelayEvent) -> usize {
        self.tx.send(event).unwrap_or(0)
    }

    /// Every event for every session, starting from this call.
    pub fn subscribe(&self) -> broadcast::Receiver<RelayEvent> {
        self.tx.subscribe()
    }

    /// Events for a single session, starting from this call.
    pub fn subscribe_session(&self, session_id: &SessionId) -> SessionEvents {
        SessionEvents {
            session_id: session_id.clone(),
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::new()
    }
}

/// A per-session view over the broadcast stream.
///
/// Other sessions' events are skipped, so a surface polling this never
/// renders someone else's conversation.
pub struct SessionEvents {
    session_id: SessionId,
    rx: broadcast::Receiver<RelayEvent>,
}

impl SessionEvents {
    /// The next event belonging to this session.
    ///
    /// A lagged receiver resumes at the oldest retained event. Returns
    /// `None` once the emitter has been dropped and the backlog is
    /// drained.
    pub async fn recv(&mut self) -> Option<RelayEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) if *event.session_id() == self.session_id => return Some(event),
                Ok(other) => {
                    trace!(
                        session_id = %self.session_id,
                        other = %other.session_id(),
                        "skipping event for another session"
                    );
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    trace!(session_id = %self.session_id, skipped, "subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
