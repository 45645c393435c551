//! Token-based session state with pluggable durable storage.
//!
//! The in-memory session is the single source of truth for "is the user
//! authenticated" and for the bearer token attached to outgoing requests.
//! Durable storage only exists so the session survives a restart; if a
//! write fails, the in-memory value stays authoritative for the rest of
//! the process lifetime.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::models::User;

/// Session file name in the app data directory
const SESSION_FILE: &str = "session.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionData {
    pub token: String,
    pub user: User,
    pub created_at: DateTime<Utc>,
}

impl SessionData {
    pub fn new(token: String, user: User) -> Self {
        Self {
            token,
            user,
            created_at: Utc::now(),
        }
    }
}

/// Durable storage for the session record.
///
/// Injected into [`Session`] so tests can substitute an in-memory fake
/// for the filesystem.
pub trait TokenStorage: Send {
    fn load(&self) -> Result<Option<SessionData>>;
    fn save(&self, data: &SessionData) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// Session persisted as a JSON file under the app data directory.
pub struct FileStorage {
    data_dir: PathBuf,
}

impl FileStorage {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    fn session_path(&self) -> PathBuf {
        self.data_dir.join(SESSION_FILE)
    }
}

impl TokenStorage for FileStorage {
    fn load(&self) -> Result<Option<SessionData>> {
        let path = self.session_path();
        if !path.exists() {
            return Ok(None);
        }
        let contents =
            std::fs::read_to_string(&path).context("Failed to read session file")?;
        let data: SessionData =
            serde_json::from_str(&contents).context("Failed to parse session file")?;
        Ok(Some(data))
    }

    fn save(&self, data: &SessionData) -> Result<()> {
        let path = self.session_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(data)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let path = self.session_path();
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

/// In-memory storage: nothing survives the process. Used by tests and
/// useful for one-shot invocations that should not leave state behind.
#[derive(Default)]
pub struct MemoryStorage {
    data: std::sync::Mutex<Option<SessionData>>,
}

impl TokenStorage for MemoryStorage {
    fn load(&self) -> Result<Option<SessionData>> {
        Ok(self.data.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn save(&self, data: &SessionData) -> Result<()> {
        *self.data.lock().unwrap_or_else(|e| e.into_inner()) = Some(data.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.data.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}

pub struct Session {
    storage: Box<dyn TokenStorage>,
    data: Option<SessionData>,
}

impl Session {
    pub fn new(storage: Box<dyn TokenStorage>) -> Self {
        Self {
            storage,
            data: None,
        }
    }

    /// Restore a previously persisted session, if any.
    /// Returns true if a session was found.
    pub fn load(&mut self) -> Result<bool> {
        match self.storage.load()? {
            Some(data) => {
                debug!(user = %data.user.display_name(), "Restored persisted session");
                self.data = Some(data);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Replace the current session. Last write wins; any previous token is
    /// gone after this returns. Persistence failures are logged and
    /// swallowed - the in-memory session remains authoritative.
    pub fn update(&mut self, data: SessionData) {
        if let Err(e) = self.storage.save(&data) {
            warn!(error = %e, "Failed to persist session; continuing in-memory only");
        }
        self.data = Some(data);
    }

    /// Drop the session from memory and durable storage. The in-memory
    /// clear always succeeds; a storage failure is logged and swallowed.
    pub fn clear(&mut self) {
        self.data = None;
        if let Err(e) = self.storage.clear() {
            warn!(error = %e, "Failed to clear persisted session");
        }
    }

    /// Bearer token for outgoing requests, if authenticated.
    pub fn token(&self) -> Option<&str> {
        self.data.as_ref().map(|d| d.token.as_str())
    }

    pub fn user(&self) -> Option<&User> {
        self.data.as_ref().map(|d| &d.user)
    }

    pub fn is_authenticated(&self) -> bool {
        self.data.is_some()
    }
}
