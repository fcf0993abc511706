//! Durable token persistence.
//!
//! ARCHITECTURE
//! ============
//! A single key holds the raw token string; an absent key means logged out.
//! The store is shared across tabs/processes on the same origin, so the
//! transport re-reads it on every request instead of trusting in-memory
//! session state.
//!
//! TRADE-OFFS
//! ==========
//! Storage never fails a request: `FileTokenStore` logs IO errors and
//! carries on, degrading to a logged-out view rather than surfacing a
//! persistence fault into the request path.

use std::path::PathBuf;
use std::sync::Mutex;

/// Synchronous persistence for the session token.
pub trait TokenStore: Send + Sync {
    /// Read the persisted token, if any.
    fn load(&self) -> Option<String>;
    /// Persist the token, replacing any previous value.
    fn save(&self, token: &str);
    /// Remove the persisted token.
    fn clear(&self);
}

/// In-memory store for tests and hosts that manage their own persistence.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start pre-populated, as after a prior session's page reload.
    #[must_use]
    pub fn with_token(token: &str) -> Self {
        Self { token: Mutex::new(Some(token.to_owned())) }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<String> {
        self.token.lock().expect("token store poisoned").clone()
    }

    fn save(&self, token: &str) {
        *self.token.lock().expect("token store poisoned") = Some(token.to_owned());
    }

    fn clear(&self) {
        *self.token.lock().expect("token store poisoned") = None;
    }
}

/// File-backed store: one file holding the raw token string.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Option<String> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => {
                let token = raw.trim();
                if token.is_empty() { None } else { Some(token.to_owned()) }
            }
            Err(_) => None,
        }
    }

    fn save(&self, token: &str) {
        if let Err(e) = std::fs::write(&self.path, token) {
            tracing::warn!(error = %e, path = %self.path.display(), "failed to persist token");
        }
    }

    fn clear(&self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(error = %e, path = %self.path.display(), "failed to clear token");
            }
        }
    }
}

#[cfg(test)]
#[path = "storage_test.rs"]
mod tests;
