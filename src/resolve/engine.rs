//! Engine executable and dictionary resolution
//!
//! Precedence for an explicit argument is fixed: an existing executable path
//! first, version shorthand second. Without an argument the session value is
//! used and re-validated.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::EngineLayout;
use crate::error::{EpqcError, Result};
use crate::model::{absolute_file_path, extension_with_dot, is_valid_file_type};
use crate::session::{SessionKey, SessionState};

/// A validated engine executable and the dictionary file that goes with it
///
/// Only [`ExecutableResolver`] hands these out, so both paths have passed
/// validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSelection {
    pub(crate) engine: PathBuf,
    pub(crate) dictionary: PathBuf,
}

impl EngineSelection {
    pub fn engine(&self) -> &Path {
        &self.engine
    }

    pub fn dictionary(&self) -> &Path {
        &self.dictionary
    }
}

pub struct ExecutableResolver<'a> {
    layout: &'a EngineLayout,
}

impl<'a> ExecutableResolver<'a> {
    pub fn new(layout: &'a EngineLayout) -> Self {
        Self { layout }
    }

    /// Resolve the engine and its dictionary.
    ///
    /// A successfully resolved engine is written to `session` before the
    /// dictionary lookup, so it is remembered even if that lookup fails.
    pub fn resolve(
        &self,
        argument: Option<&str>,
        dictionary_override: Option<&Path>,
        session: &mut SessionState,
    ) -> Result<EngineSelection> {
        let engine = self.resolve_executable(argument, session)?;
        session.set(SessionKey::EnginePath, engine.clone());

        let dictionary = match dictionary_override {
            Some(path) => self.validate_dictionary(path)?,
            None => self.locate_dictionary(&engine)?,
        };
        debug!("Dictionary file: {}", dictionary.display());

        Ok(EngineSelection { engine, dictionary })
    }

    /// Resolve only the executable path
    pub fn resolve_executable(
        &self,
        argument: Option<&str>,
        session: &SessionState,
    ) -> Result<PathBuf> {
        let Some(argument) = argument else {
            let stored = session
                .get(SessionKey::EnginePath)
                .ok_or(EpqcError::MissingEngineReference)?;
            if !is_valid_file_type(stored, &self.layout.executable_ext) {
                return Err(EpqcError::EngineNotResolvable {
                    argument: stored.display().to_string(),
                    tried: stored.to_path_buf(),
                });
            }
            info!(
                "The engine was inferred from the session: {}",
                stored.display()
            );
            return Ok(stored.to_path_buf());
        };

        let as_path = absolute_file_path(Path::new(argument));
        if is_valid_file_type(&as_path, &self.layout.executable_ext) {
            info!("Custom engine located and validated at {}", as_path.display());
            return Ok(as_path);
        }
        debug!(
            "\"{}\" is not an engine executable, trying it as a version",
            argument
        );

        let derived = self.layout.executable_for_version(argument);
        if is_valid_file_type(&derived, &self.layout.executable_ext) {
            info!("Engine located and validated at {}", derived.display());
            return Ok(derived);
        }

        Err(EpqcError::EngineNotResolvable {
            argument: argument.to_string(),
            tried: derived,
        })
    }

    /// First dictionary file, by name, in the engine's directory
    pub fn locate_dictionary(&self, engine: &Path) -> Result<PathBuf> {
        let dir = engine.parent().unwrap_or_else(|| Path::new("."));
        let not_found = || EpqcError::DictionaryNotFound {
            location: dir.to_path_buf(),
            extension: self.layout.dictionary_ext.clone(),
        };

        let mut candidates: Vec<PathBuf> = fs::read_dir(dir)
            .map_err(|_| not_found())?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.is_file() && extension_with_dot(path) == self.layout.dictionary_ext
            })
            .collect();
        candidates.sort();

        candidates.into_iter().next().ok_or_else(not_found)
    }

    fn validate_dictionary(&self, path: &Path) -> Result<PathBuf> {
        let path = absolute_file_path(path);
        if is_valid_file_type(&path, &self.layout.dictionary_ext) {
            info!("Custom dictionary turned on: {}", path.display());
            Ok(path)
        } else {
            Err(EpqcError::DictionaryNotFound {
                location: path,
                extension: self.layout.dictionary_ext.clone(),
            })
        }
    }
}
