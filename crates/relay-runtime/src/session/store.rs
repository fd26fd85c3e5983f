//! Concurrent session store.
//!
//! Sessions live behind per-session `tokio::sync::Mutex`es inside a
//! [`DashMap`]: turns on different sessions never contend, while two
//! turns on the same session serialize on its lock. Eviction policy is
//! the host's job; the store only offers `remove`.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use relay_core::ids::SessionId;
use relay_tools::customer::CustomerProfile;

use crate::session::Session;

/// Shared handle to one session.
pub type SessionHandle = Arc<Mutex<Session>>;

/// In-memory map of live sessions.
#[derive(Default)]
pub struct SessionStore {
    sessions: DashMap<SessionId, SessionHandle>,
}

impl SessionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Fetch a session, creating an empty one for `customer` if absent.
    pub fn get_or_create(&self, id: &SessionId, customer: &CustomerProfile) -> SessionHandle {
        self.sessions
            .entry(id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(Session::new(id.clone(), customer.clone()))))
            .clone()
    }

    /// Fetch a session if it exists.
    #[must_use]
    pub fn get(&self, id: &SessionId) -> Option<SessionHandle> {
        self.sessions.get(id).map(|entry| entry.clone())
    }

    /// Drop a session, returning its handle if it existed.
    pub fn remove(&self, id: &SessionId) -> Option<SessionHandle> {
        self.sessions.remove(id).map(|(_, handle)| handle)
    }

    /// Whether a session with the given ID exists.
    #[must_use]
    pub fn contains(&self, id: &SessionId) -> bool {
        self.sessions.contains_key(id)
    }

    /// Number of live sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
