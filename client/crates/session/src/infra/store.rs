//! Session Store
//!
//! Best-effort persistence for the token bundle. Every storage failure is
//! logged and swallowed: reads degrade to "absent", writes and removals become
//! no-ops. Nothing here ever returns an error to the caller.

use std::sync::Arc;

use platform::storage::KeyValueStorage;

use crate::domain::entity::session::Session;

/// Storage key the session is persisted under
pub const DEFAULT_STORAGE_KEY: &str = "learning-platform-auth-token";

/// Best-effort wrapper over a [`KeyValueStorage`]
#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn KeyValueStorage>,
    session_key: String,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self::with_key(storage, DEFAULT_STORAGE_KEY)
    }

    pub fn with_key(storage: Arc<dyn KeyValueStorage>, session_key: impl Into<String>) -> Self {
        Self {
            storage,
            session_key: session_key.into(),
        }
    }

    pub fn session_key(&self) -> &str {
        &self.session_key
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match self.storage.get(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "Storage read failed");
                None
            }
        }
    }

    pub fn set(&self, key: &str, value: &str) {
        if let Err(e) = self.storage.set(key, value) {
            tracing::warn!(key, error = %e, "Storage write failed");
        }
    }

    pub fn remove(&self, key: &str) {
        if let Err(e) = self.storage.remove(key) {
            tracing::warn!(key, error = %e, "Storage removal failed");
        }
    }

    /// Persisted session, or `None` if absent, unreadable or malformed
    pub fn load_session(&self) -> Option<Session> {
        let raw = self.get(&self.session_key)?;
        match serde_json::from_str(&raw) {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::warn!(key = %self.session_key, error = %e, "Persisted session is malformed");
                None
            }
        }
    }

    pub fn save_session(&self, session: &Session) {
        match serde_json::to_string(session) {
            Ok(json) => self.set(&self.session_key, &json),
            Err(e) => tracing::warn!(error = %e, "Session could not be serialized"),
        }
    }

    pub fn clear_session(&self) {
        self.remove(&self.session_key);
    }

    /// Write-through: save when present, clear when absent
    pub fn persist(&self, session: Option<&Session>) {
        match session {
            Some(session) => self.save_session(session),
            None => self.clear_session(),
        }
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("session_key", &self.session_key)
            .finish_non_exhaustive()
    }
}
