use super::session::{DataSourceMode, SessionContext};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;
use uuid::Uuid;

/// Keeps one [`SessionContext`] per dashboard session. A session's mode is
/// only reachable through its own id.
#[derive(Debug, Default)]
pub struct SessionManager {
    sessions: RwLock<HashMap<Uuid, SessionContext>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<Uuid, SessionContext>> {
        self.sessions.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<Uuid, SessionContext>> {
        self.sessions.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn start_session(&self) -> Uuid {
        let session = SessionContext::new();
        let id = session.id();
        self.write().insert(id, session);
        debug!(session = %id, "Session started");
        id
    }

    /// Snapshot of the session's context, to be passed to data fetches.
    pub fn context(&self, id: Uuid) -> Option<SessionContext> {
        self.read().get(&id).cloned()
    }

    pub fn mode(&self, id: Uuid) -> Option<DataSourceMode> {
        self.read().get(&id).map(SessionContext::mode)
    }

    /// Returns false when the session does not exist.
    pub fn set_mode(&self, id: Uuid, mode: DataSourceMode) -> bool {
        match self.write().get_mut(&id) {
            Some(session) => {
                session.select_mode(mode);
                true
            }
            None => false,
        }
    }

    pub fn end_session(&self, id: Uuid) -> bool {
        let removed = self.write().remove(&id).is_some();
        if removed {
            debug!(session = %id, "Session ended");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}
