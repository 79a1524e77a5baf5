//! Weather file resolution
//!
//! Only an explicit argument or the session value is considered; there is no
//! derivation fallback for weather files.

use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{EpqcError, Result};
use crate::model::{absolute_file_path, is_valid_file_type};
use crate::session::{SessionKey, SessionState};

pub struct WeatherResolver<'a> {
    extension: &'a str,
}

impl<'a> WeatherResolver<'a> {
    pub fn new(extension: &'a str) -> Self {
        Self { extension }
    }

    pub fn resolve(&self, argument: Option<&Path>, session: &mut SessionState) -> Result<PathBuf> {
        match argument {
            Some(argument) => {
                let path = absolute_file_path(argument);
                if !is_valid_file_type(&path, self.extension) {
                    return Err(EpqcError::InvalidWeatherFile {
                        path,
                        expected: self.extension.to_string(),
                    });
                }
                if session.get(SessionKey::WeatherPath).is_some() {
                    info!("The weather file was reset to {}", path.display());
                } else {
                    info!("The weather file was set to {}", path.display());
                }
                session.set(SessionKey::WeatherPath, path.clone());
                Ok(path)
            }
            None => {
                let stored = session
                    .get(SessionKey::WeatherPath)
                    .ok_or(EpqcError::MissingWeatherReference)?;
                if !is_valid_file_type(stored, self.extension) {
                    return Err(EpqcError::InvalidWeatherFile {
                        path: stored.to_path_buf(),
                        expected: self.extension.to_string(),
                    });
                }
                info!(
                    "The weather file was inferred from the session: {}",
                    stored.display()
                );
                Ok(stored.to_path_buf())
            }
        }
    }
}
