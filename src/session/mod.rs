//! Session Handling
//!
//! A session is a single bearer token kept in a local key/value store.
//! Holding a non-empty token means "logged in"; only the backend can say the
//! token has expired.
//!
//! The store is injected into the API client and the page layer through the
//! cloneable [`Session`] handle, so a logout anywhere is seen by the next call
//! everywhere else.

mod store;

pub use store::{FileSessionStore, MemorySessionStore};

use std::sync::Arc;
use thiserror::Error;

/// Backend that persists the bearer token
pub trait SessionStore: Send + Sync {
    /// Read the stored token, if any
    fn load(&self) -> Result<Option<String>, SessionError>;

    /// Store a token, replacing any previous one
    fn save(&self, token: &str) -> Result<(), SessionError>;

    /// Remove the stored token
    fn clear(&self) -> Result<(), SessionError>;
}

/// Errors from a session store
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("IO error on session file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session store lock poisoned")]
    Poisoned,
}

/// Shared handle to the session store
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn SessionStore>,
}

impl Session {
    pub fn new(store: impl SessionStore + 'static) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    /// Session backed by process memory only
    pub fn in_memory() -> Self {
        Self::new(MemorySessionStore::default())
    }

    /// Current credential; unreadable or blank values count as absent
    pub fn credential(&self) -> Option<String> {
        match self.store.load() {
            Ok(token) => token.filter(|t| !t.trim().is_empty()),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read session credential");
                None
            }
        }
    }

    pub fn set_credential(&self, token: &str) -> Result<(), SessionError> {
        self.store.save(token)?;
        tracing::debug!("Session credential stored");
        Ok(())
    }

    pub fn clear_credential(&self) -> Result<(), SessionError> {
        self.store.clear()?;
        tracing::debug!("Session credential cleared");
        Ok(())
    }

    pub fn is_logged_in(&self) -> bool {
        self.credential().is_some()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("logged_in", &self.is_logged_in())
            .finish()
    }
}
