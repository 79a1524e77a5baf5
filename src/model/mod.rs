//! Model file handling
//!
//! A [`ModelFile`] is only ever built from a path that passed validation.
//! Its contents are read on demand as raw bytes and never cached, and rewrites
//! always produce a sibling file so the original stays untouched for the whole
//! run.

pub mod timestep;
pub mod validator;
pub mod version;

pub use timestep::{rewrite_timestep, TimestepValue, VALID_TIMESTEPS};
pub use validator::{absolute_file_path, extension_with_dot, is_valid_file_type};
pub use version::{extract_version, VersionTag};

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{EpqcError, Result};
use crate::pipeline::Stage;

/// A validated model file on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelFile {
    path: PathBuf,
}

impl ModelFile {
    /// Validate `path` against `extension` and wrap it
    pub fn open(path: &Path, extension: &str) -> Result<Self> {
        let path = absolute_file_path(path);
        if !is_valid_file_type(&path, extension) {
            return Err(EpqcError::InvalidModelFile {
                path,
                expected: extension.to_string(),
            });
        }
        debug!("Model file validated at {}", path.display());
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding the model; the engine runs from here
    pub fn directory(&self) -> PathBuf {
        self.path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// File name without its extension
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Read the current contents of the model, in whatever encoding it uses
    pub fn read_bytes(&self, stage: Stage) -> Result<Vec<u8>> {
        fs::read(&self.path).map_err(|source| EpqcError::ModelReadFailure {
            path: self.path.clone(),
            stage,
            source,
        })
    }

    /// Extract the model version, failing when no version block exists
    pub fn version(&self) -> Result<VersionTag> {
        let contents = self.read_bytes(Stage::VersionReport)?;
        extract_version(&contents).ok_or_else(|| EpqcError::VersionNotFound {
            path: self.path.clone(),
        })
    }

    /// Sibling path with `suffix` inserted before the extension
    /// (`house.idf` -> `house_qc.idf`)
    pub fn mutated_path(&self, suffix: &str) -> PathBuf {
        let mut name = format!("{}{}", self.stem(), suffix);
        if let Some(ext) = self.path.extension() {
            name.push('.');
            name.push_str(&ext.to_string_lossy());
        }
        self.path.with_file_name(name)
    }

    /// Write a copy of the model with its timestep block replaced and return
    /// the new file. The receiver's file is not modified.
    pub fn with_timestep(&self, timestep: TimestepValue, suffix: &str) -> Result<ModelFile> {
        let contents = self.read_bytes(Stage::TimestepRewrite)?;
        let updated =
            rewrite_timestep(&contents, timestep).ok_or_else(|| EpqcError::TimestepNotFound {
                path: self.path.clone(),
            })?;

        let target = self.mutated_path(suffix);
        fs::write(&target, updated).map_err(|source| EpqcError::MutationWriteFailure {
            path: target.clone(),
            source,
        })?;

        info!(
            "The timestep was changed to {} in {}",
            timestep,
            target.display()
        );
        Ok(ModelFile { path: target })
    }
}
