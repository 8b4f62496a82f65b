//! JSON file backing for the session endpoint.

use std::path::{Path, PathBuf};

use tracing::debug;

use adbterm_core::{CoreError, Endpoint, SessionStore};

use crate::ConfigError;

/// `{"ip": "...", "port": "..." | null}`, rewritten on every save.
#[derive(Debug, Clone)]
pub struct JsonSessionStore {
    path: PathBuf,
}

impl JsonSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read(&self) -> Result<Option<Endpoint>, ConfigError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&raw)?))
    }

    pub fn write(&self, endpoint: &Endpoint) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(endpoint)?)?;
        debug!(path = %self.path.display(), %endpoint, "session saved");
        Ok(())
    }
}

impl SessionStore for JsonSessionStore {
    fn load(&self) -> Result<Option<Endpoint>, CoreError> {
        self.read().map_err(|e| CoreError::Persistence {
            message: format!("{}: {e}", self.path.display()),
        })
    }

    fn save(&self, endpoint: &Endpoint) -> Result<(), CoreError> {
        self.write(endpoint).map_err(|e| CoreError::Persistence {
            message: format!("{}: {e}", self.path.display()),
        })
    }
}
