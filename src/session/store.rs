//! Session store backed by a JSON file

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

use super::state::{SessionKey, SessionState};
use crate::error::{EpqcError, Result};

/// Owns the session state and, unless in-memory, the file it lives in
#[derive(Debug)]
pub struct SessionStore {
    path: Option<PathBuf>,
    state: SessionState,
}

impl SessionStore {
    /// A store that never touches disk
    pub fn in_memory() -> Self {
        Self {
            path: None,
            state: SessionState::default(),
        }
    }

    /// Load the session at `path`, or start empty if the file does not exist.
    ///
    /// A file that exists but cannot be read or parsed is an error; the
    /// session is never reset behind the caller's back.
    pub fn open(path: PathBuf) -> Result<Self> {
        let state = if path.exists() {
            let contents = fs::read_to_string(&path).map_err(|e| persist_error(&path, "read", e))?;
            serde_json::from_str(&contents).map_err(|e| persist_error(&path, "parsed", e))?
        } else {
            SessionState::default()
        };
        debug!("Session loaded from {}", path.display());
        trace!("Session state: {:?}", state);
        Ok(Self {
            path: Some(path),
            state,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut SessionState {
        &mut self.state
    }

    pub fn get(&self, key: SessionKey) -> Option<&Path> {
        self.state.get(key)
    }

    pub fn set(&mut self, key: SessionKey, value: PathBuf) {
        self.state.set(key, value);
    }

    /// Forget both keys and persist the empty session
    pub fn clear(&mut self) -> Result<()> {
        self.state.clear();
        self.save()
    }

    /// Write the state with an atomic temp-file rename
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir).map_err(|e| persist_error(path, "written", e))?;

        let json = serde_json::to_string_pretty(&self.state)
            .map_err(|e| persist_error(path, "written", e))?;
        let mut temp =
            tempfile::NamedTempFile::new_in(dir).map_err(|e| persist_error(path, "written", e))?;
        temp.write_all(json.as_bytes())
            .map_err(|e| persist_error(path, "written", e))?;
        temp.persist(path)
            .map_err(|e| persist_error(path, "written", e.error))?;

        debug!("Session saved to {}", path.display());
        Ok(())
    }
}

fn persist_error(
    path: &Path,
    operation: &'static str,
    source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
) -> EpqcError {
    EpqcError::SessionPersistFailure {
        path: path.to_path_buf(),
        operation,
        source: source.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_missing_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::open(dir.path().join("s.json")).unwrap();
        assert!(store.state().is_empty());
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sessions").join("s.json");

        let mut store = SessionStore::open(path.clone()).unwrap();
        store.set(SessionKey::WeatherPath, PathBuf::from("/data/city.epw"));
        store.save().unwrap();

        let reopened = SessionStore::open(path).unwrap();
        assert_eq!(
            reopened.get(SessionKey::WeatherPath),
            Some(Path::new("/data/city.epw"))
        );
    }

    #[test]
    fn test_clear_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("s.json");

        let mut store = SessionStore::open(path.clone()).unwrap();
        store.set(SessionKey::EnginePath, PathBuf::from("/e/energyplus"));
        store.save().unwrap();
        store.clear().unwrap();

        assert!(SessionStore::open(path).unwrap().state().is_empty());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("s.json");
        fs::write(&path, "{not json").unwrap();

        let err = SessionStore::open(path).unwrap_err();
        assert!(matches!(
            err,
            EpqcError::SessionPersistFailure {
                operation: "parsed",
                ..
            }
        ));
    }

    #[test]
    fn test_in_memory_save_is_noop() {
        let mut store = SessionStore::in_memory();
        store.set(SessionKey::EnginePath, PathBuf::from("/e"));
        store.save().unwrap();
        assert!(store.path().is_none());
    }
}
