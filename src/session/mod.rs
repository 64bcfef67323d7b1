//! Session reference handling.
//!
//! The backend hands out an opaque session id for every scrape session. The
//! controller keeps exactly one current id in [`Session`]; ids that belong to
//! a completed login are also written to a [`SessionStore`] so they survive a
//! restart of the client.

mod store;

pub use store::{FileStore, MemoryStore, SessionStore};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Opaque backend-issued session identifier.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionRef(String);

impl SessionRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for SessionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Only a short prefix goes into logs and debug output.
impl fmt::Debug for SessionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix: String = self.0.chars().take(8).collect();
        write!(f, "SessionRef({}…)", prefix)
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("session file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to encode session: {0}")]
    Encode(#[from] toml::ser::Error),
}

/// The controller's single read/write path for the session reference.
///
/// `current` is the page-lifetime id used to build requests. It changes with
/// every new CAPTCHA. The store only ever holds the id of a completed login.
pub struct Session {
    current: Option<SessionRef>,
    store: Box<dyn SessionStore>,
}

impl Session {
    pub fn new(store: Box<dyn SessionStore>) -> Self {
        Self {
            current: None,
            store,
        }
    }

    pub fn current(&self) -> Option<&SessionRef> {
        self.current.as_ref()
    }

    /// Replace the current id without touching the store.
    pub fn replace(&mut self, session: SessionRef) {
        self.current = Some(session);
    }

    /// Drop the current id; a stored login is kept.
    pub fn forget_current(&mut self) {
        self.current = None;
    }

    /// Load the stored id and make it current.
    ///
    /// An unreadable store is treated as logged out and wiped.
    pub fn recover(&mut self) -> Option<SessionRef> {
        match self.store.load() {
            Ok(Some(session)) => {
                self.current = Some(session.clone());
                Some(session)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, "discarding unreadable stored session");
                if let Err(e) = self.store.clear() {
                    tracing::warn!(error = %e, "failed to remove stored session");
                }
                None
            }
        }
    }

    /// Make `session` current and write it to the store.
    pub fn persist(&mut self, session: SessionRef) -> Result<(), SessionError> {
        self.current = Some(session.clone());
        self.store.save(&session)
    }

    /// Forget the session everywhere. The in-memory id is always dropped,
    /// even when the store fails.
    pub fn clear(&mut self) -> Result<(), SessionError> {
        self.current = None;
        self.store.clear()
    }

    #[cfg(test)]
    pub fn stored(&self) -> Result<Option<SessionRef>, SessionError> {
        self.store.load()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_recover_from_empty_store() {
        let mut session = Session::new(Box::new(MemoryStore::default()));
        assert_eq!(session.recover(), None);
        assert!(session.current().is_none());
    }

    #[test]
    fn test_persist_then_recover_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("session.toml");

        let mut first = Session::new(Box::new(FileStore::new(path.clone())));
        first.persist(SessionRef::new("abc-123")).unwrap();
        assert_eq!(first.current(), Some(&SessionRef::new("abc-123")));

        let mut second = Session::new(Box::new(FileStore::new(path)));
        assert_eq!(second.recover(), Some(SessionRef::new("abc-123")));
        assert_eq!(second.current(), Some(&SessionRef::new("abc-123")));
    }

    #[test]
    fn test_replace_does_not_touch_store() {
        let mut session = Session::new(Box::new(MemoryStore::default()));
        session.replace(SessionRef::new("captcha-session"));
        assert_eq!(session.current(), Some(&SessionRef::new("captcha-session")));
        assert_eq!(session.stored().unwrap(), None);
    }

    #[test]
    fn test_clear_removes_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.toml");
        let mut session = Session::new(Box::new(FileStore::new(path.clone())));
        session.persist(SessionRef::new("xyz")).unwrap();
        assert!(path.exists());

        session.clear().unwrap();
        assert!(!path.exists());
        assert!(session.current().is_none());
        // Clearing twice is fine.
        session.clear().unwrap();
    }

    #[test]
    fn test_corrupt_file_is_discarded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.toml");
        std::fs::write(&path, "this is = = not toml").unwrap();

        let mut session = Session::new(Box::new(FileStore::new(path.clone())));
        assert_eq!(session.recover(), None);
        assert!(!path.exists());
    }

    #[test]
    fn test_debug_hides_full_id() {
        let session = SessionRef::new("0123456789abcdef");
        assert_eq!(format!("{:?}", session), "SessionRef(01234567…)");
    }
}
