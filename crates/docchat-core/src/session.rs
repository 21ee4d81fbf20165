//! Conversation session id cache.

use std::sync::Arc;

use anyhow::Result;
use parking_lot::RwLock;

/// Durable home of the session id.
///
/// The tracker calls this after every change; failures are logged, never
/// surfaced to the turn that caused them.
pub trait SessionPersistence: Send + Sync {
    fn load(&self) -> Result<Option<String>>;
    fn store(&self, session_id: &str) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// Persistence that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemorySessionPersistence {
    value: RwLock<Option<String>>,
}

impl MemorySessionPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session_id: impl Into<String>) -> Self {
        Self {
            value: RwLock::new(Some(session_id.into())),
        }
    }

    pub fn stored(&self) -> Option<String> {
        self.value.read().clone()
    }
}

impl SessionPersistence for MemorySessionPersistence {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.stored())
    }

    fn store(&self, session_id: &str) -> Result<()> {
        *self.value.write() = Some(session_id.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.value.write() = None;
        Ok(())
    }
}

/// Holds at most one active session id and mirrors it to persistence.
///
/// Overlapping turns race on the id; the last write wins.
pub struct SessionTracker {
    current: RwLock<Option<String>>,
    persistence: Arc<dyn SessionPersistence>,
}

impl SessionTracker {
    /// Create a tracker primed with whatever the persistence layer remembers.
    pub fn load(persistence: Arc<dyn SessionPersistence>) -> Self {
        let current = match persistence.load() {
            Ok(id) => id.filter(|id| !id.is_empty()),
            Err(err) => {
                tracing::warn!(error = %err, "Failed to load persisted session id");
                None
            }
        };
        if let Some(id) = &current {
            tracing::debug!(session_id = %id, "Resumed persisted session");
        }
        Self {
            current: RwLock::new(current),
            persistence,
        }
    }

    /// Tracker with no durable storage.
    pub fn in_memory() -> Self {
        Self::load(Arc::new(MemorySessionPersistence::new()))
    }

    pub fn session_id(&self) -> Option<String> {
        self.current.read().clone()
    }

    /// Adopt a server-issued id, replacing any cached one.
    ///
    /// Persistence happens under the write lock so the stored id always
    /// matches the cached one.
    pub fn set_session_id(&self, session_id: &str) {
        let mut current = self.current.write();
        if current.as_deref() != Some(session_id) {
            tracing::info!(session_id, "Session id updated");
        }
        *current = Some(session_id.to_string());
        if let Err(err) = self.persistence.store(session_id) {
            tracing::warn!(error = %err, "Failed to persist session id");
        }
    }

    /// Forget the current session so the next turn starts a new one.
    pub fn clear(&self) {
        let mut current = self.current.write();
        current.take();
        if let Err(err) = self.persistence.clear() {
            tracing::warn!(error = %err, "Failed to clear persisted session id");
        }
        tracing::info!("Session cleared");
    }
}

impl std::fmt::Debug for SessionTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTracker")
            .field("current", &*self.current.read())
            .finish_non_exhaustive()
    }
}
