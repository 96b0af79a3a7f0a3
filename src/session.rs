use std::fs::{self, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The locally persisted login: bearer token plus the acting user's id.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoredSession {
    pub token: String,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl StoredSession {
    pub fn new(token: impl Into<String>, user_id: impl Into<String>) -> StoredSession {
        StoredSession {
            token: token.into(),
            user_id: user_id.into(),
            expires_at: None,
        }
    }
}

/// Persistence for the current login.
///
/// Written only by a successful login, read before every request and
/// cleared on logout or when the server rejects the token.
pub trait SessionStore: Send + Sync {
    fn get(&self) -> Option<StoredSession>;
    fn set(&self, session: StoredSession) -> std::io::Result<()>;
    fn clear(&self) -> std::io::Result<()>;
}

/// Keeps the session in a JSON file so it survives between runs.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> FileSessionStore {
        FileSessionStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    /// Returns `None` if the file does not exist or cannot be parsed.
    fn get(&self) -> Option<StoredSession> {
        if !self.path.exists() {
            return None;
        }
        let mut f = OpenOptions::new().read(true).open(&self.path).ok()?;
        let mut s = String::new();
        f.read_to_string(&mut s).ok()?;
        match serde_json::from_str(&s) {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "ignoring unreadable session file: {}", e);
                None
            }
        }
    }

    fn set(&self, session: StoredSession) -> std::io::Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }
        let s = serde_json::to_string_pretty(&session)?;
        let mut f = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)?;
        f.write_all(s.as_bytes())?;
        Ok(())
    }

    fn clear(&self) -> std::io::Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

/// Session held only for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    inner: Mutex<Option<StoredSession>>,
}

impl MemorySessionStore {
    pub fn new() -> MemorySessionStore {
        MemorySessionStore::default()
    }

    pub fn with_session(session: StoredSession) -> MemorySessionStore {
        MemorySessionStore {
            inner: Mutex::new(Some(session)),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self) -> Option<StoredSession> {
        self.inner.lock().ok().and_then(|s| s.clone())
    }

    fn set(&self, session: StoredSession) -> std::io::Result<()> {
        if let Ok(mut s) = self.inner.lock() {
            *s = Some(session);
        }
        Ok(())
    }

    fn clear(&self) -> std::io::Result<()> {
        if let Ok(mut s) = self.inner.lock() {
            *s = None;
        }
        Ok(())
    }
}
