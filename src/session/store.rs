//! Session persistence
//!
//! The session file stands in for browser local storage: a single JSON
//! object `{ "token": ..., "user": {...} }` under a fixed path.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::{SessionError, SessionResult};
use crate::models::Session;

/// Where a session lives between runs
pub trait SessionStore: Send + Sync {
    /// Read the stored session, if any
    ///
    /// Unreadable or malformed data is treated as "no session".
    fn load(&self) -> Option<Session>;

    /// Replace the stored session
    fn save(&self, session: &Session) -> SessionResult<()>;

    /// Remove the stored session; a no-op when nothing is stored
    fn clear(&self) -> SessionResult<()>;
}

/// JSON file backed store
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_error(&self, e: impl ToString) -> SessionError {
        SessionError::Write {
            path: self.path.clone(),
            error: e.to_string(),
        }
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Option<Session> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!("Cannot read session file {:?}: {}", self.path, e);
                return None;
            }
        };

        match serde_json::from_str::<Session>(&content) {
            Ok(session) if !session.token.is_empty() => Some(session),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!("Ignoring malformed session file {:?}: {}", self.path, e);
                None
            }
        }
    }

    fn save(&self, session: &Session) -> SessionResult<()> {
        let json = serde_json::to_vec_pretty(session)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| self.write_error(e))?;
            }
        }

        // Write to a sibling temp file then rename so a crash never leaves half a token
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| self.write_error(e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| self.write_error(e))?;

        tracing::debug!("Session saved to {:?}", self.path);
        Ok(())
    }

    fn clear(&self) -> SessionResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!("Session file {:?} removed", self.path);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SessionError::Remove {
                path: self.path.clone(),
                error: e.to_string(),
            }),
        }
    }
}

/// In-process store, used by tests and one-shot embeddings
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    slot: Mutex<Option<Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            slot: Mutex::new(Some(session)),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Option<Session> {
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }

    fn save(&self, session: &Session) -> SessionResult<()> {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = Some(session.clone());
        }
        Ok(())
    }

    fn clear(&self) -> SessionResult<()> {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = None;
        }
        Ok(())
    }
}
