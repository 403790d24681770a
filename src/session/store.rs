//! Session store backends

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use super::{SessionError, SessionStore};

/// Token kept in process memory
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    token: RwLock<Option<String>>,
}

impl MemorySessionStore {
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<String>, SessionError> {
        let token = self.token.read().map_err(|_| SessionError::Poisoned)?;
        Ok(token.clone())
    }

    fn save(&self, token: &str) -> Result<(), SessionError> {
        let mut slot = self.token.write().map_err(|_| SessionError::Poisoned)?;
        *slot = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        let mut slot = self.token.write().map_err(|_| SessionError::Poisoned)?;
        *slot = None;
        Ok(())
    }
}

/// Token kept in a single file, the CLI's equivalent of browser local storage
///
/// The file holds exactly the token string. A missing file means logged out.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<data_local_dir>/boxbook/session`, falling back to `./.boxbook_session`
    pub fn default_path() -> PathBuf {
        dirs::data_local_dir()
            .map(|p| p.join("boxbook").join("session"))
            .unwrap_or_else(|| PathBuf::from("./.boxbook_session"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<String>, SessionError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(content.trim().to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, token: &str) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut options = std::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);

        // New files are created owner-only; an existing file is narrowed before writing
        #[cfg(unix)]
        {
            use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
            options.mode(0o600);
            if self.path.exists() {
                std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))?;
            }
        }

        let mut file = options.open(&self.path)?;
        file.write_all(token.as_bytes())?;
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
