use super::{SessionError, SessionRef};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

/// Durable storage for the session reference of a completed login.
pub trait SessionStore: Send {
    fn load(&self) -> Result<Option<SessionRef>, SessionError>;
    fn save(&mut self, session: &SessionRef) -> Result<(), SessionError>;
    fn clear(&mut self) -> Result<(), SessionError>;
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredSession {
    session_id: SessionRef,
    #[serde(default)]
    saved_at: Option<String>,
}

/// Keeps the reference in a small TOML file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn io_error(&self, source: std::io::Error) -> SessionError {
        SessionError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl SessionStore for FileStore {
    fn load(&self) -> Result<Option<SessionRef>, SessionError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };
        let stored: StoredSession =
            toml::from_str(&contents).map_err(|source| SessionError::Corrupt {
                path: self.path.clone(),
                source,
            })?;
        if stored.session_id.is_empty() {
            return Ok(None);
        }
        Ok(Some(stored.session_id))
    }

    fn save(&mut self, session: &SessionRef) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let stored = StoredSession {
            session_id: session.clone(),
            saved_at: Some(Local::now().to_rfc3339()),
        };
        let contents = toml::to_string_pretty(&stored)?;
        fs::write(&self.path, contents).map_err(|e| self.io_error(e))?;
        tracing::debug!(path = %self.path.display(), "session saved");
        Ok(())
    }

    fn clear(&mut self) -> Result<(), SessionError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}

/// Process-lifetime storage, used when the backend keeps the login itself.
#[derive(Debug, Default)]
pub struct MemoryStore {
    value: Option<SessionRef>,
}

impl SessionStore for MemoryStore {
    fn load(&self) -> Result<Option<SessionRef>, SessionError> {
        Ok(self.value.clone())
    }

    fn save(&mut self, session: &SessionRef) -> Result<(), SessionError> {
        self.value = Some(session.clone());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), SessionError> {
        self.value = None;
        Ok(())
    }
}
