use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub mod codes;

pub use codes::{describe_error_code, ErrorCode};

use crate::pipeline::Stage;

/// The unified error type for a launcher run
///
/// Every variant carries the offending argument or value so the message can
/// name it. Nothing here is retried; the first error aborts the run.
#[derive(Error, Debug)]
pub enum EpqcError {
    #[error("Settings file {} is invalid: {message}", .path.display())]
    SettingsInvalid { path: PathBuf, message: String },

    #[error("Cannot open log file {}", .path.display())]
    LogOpenFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("The model file at \"{}\" was invalid (expected an existing {expected} file)", .path.display())]
    InvalidModelFile { path: PathBuf, expected: String },

    #[error("Cannot read model file {}", .path.display())]
    ModelReadFailure {
        path: PathBuf,
        stage: Stage,
        #[source]
        source: std::io::Error,
    },

    #[error("The model version could not be extracted from {}", .path.display())]
    VersionNotFound { path: PathBuf },

    #[error("No Timestep block found in {}", .path.display())]
    TimestepNotFound { path: PathBuf },

    #[error("Invalid timestep value \"{value}\": valid options are 1, 2, 4, 6")]
    InvalidTimestepValue { value: String },

    #[error("Cannot write rewritten model file {}", .path.display())]
    MutationWriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No engine was given and none is stored in the session; pass -e once per session")]
    MissingEngineReference,

    #[error("No valid engine executable can be inferred from \"{argument}\" (tried {})", .tried.display())]
    EngineNotResolvable { argument: String, tried: PathBuf },

    #[error("No {extension} dictionary file found in {}", .location.display())]
    DictionaryNotFound { location: PathBuf, extension: String },

    #[error("The weather file \"{}\" did not pass validation (expected an existing {expected} file)", .path.display())]
    InvalidWeatherFile { path: PathBuf, expected: String },

    #[error("No weather file was given and none is stored in the session; pass -w once per session")]
    MissingWeatherReference,

    #[error("Session state at {} could not be {operation}", .path.display())]
    SessionPersistFailure {
        path: PathBuf,
        operation: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Cannot start engine {}", .program.display())]
    EngineLaunchFailure {
        program: PathBuf,
        #[source]
        source: crate::subprocess::ProcessError,
    },

    #[error("Engine did not finish within {timeout:?}")]
    EngineTimeout { timeout: Duration },

    #[error("Engine exited with status {code}")]
    EngineFailed { code: i32 },
}

impl EpqcError {
    /// The pipeline stage that produced this error
    pub fn stage(&self) -> Stage {
        match self {
            Self::SettingsInvalid { .. } | Self::LogOpenFailure { .. } => Stage::Setup,
            Self::InvalidModelFile { .. } => Stage::ModelValidation,
            Self::ModelReadFailure { stage, .. } => *stage,
            Self::VersionNotFound { .. } => Stage::VersionReport,
            Self::TimestepNotFound { .. }
            | Self::InvalidTimestepValue { .. }
            | Self::MutationWriteFailure { .. } => Stage::TimestepRewrite,
            Self::MissingEngineReference
            | Self::EngineNotResolvable { .. }
            | Self::DictionaryNotFound { .. } => Stage::EngineResolution,
            Self::InvalidWeatherFile { .. } | Self::MissingWeatherReference => {
                Stage::WeatherResolution
            }
            Self::SessionPersistFailure { .. } => Stage::Session,
            Self::EngineLaunchFailure { .. }
            | Self::EngineTimeout { .. }
            | Self::EngineFailed { .. } => Stage::Dispatch,
        }
    }

    /// Get the error code
    pub fn code(&self) -> u16 {
        match self {
            Self::SettingsInvalid { .. } => ErrorCode::SETTINGS_INVALID,
            Self::LogOpenFailure { .. } => ErrorCode::LOG_OPEN_FAILED,
            Self::InvalidModelFile { .. } => ErrorCode::MODEL_INVALID_FILE,
            Self::ModelReadFailure { .. } => ErrorCode::MODEL_READ_FAILED,
            Self::VersionNotFound { .. } => ErrorCode::MODEL_VERSION_NOT_FOUND,
            Self::TimestepNotFound { .. } => ErrorCode::MODEL_TIMESTEP_NOT_FOUND,
            Self::InvalidTimestepValue { .. } => ErrorCode::MODEL_INVALID_TIMESTEP,
            Self::MutationWriteFailure { .. } => ErrorCode::MODEL_WRITE_FAILED,
            Self::MissingEngineReference => ErrorCode::RESOLVE_MISSING_ENGINE,
            Self::EngineNotResolvable { .. } => ErrorCode::RESOLVE_ENGINE_NOT_RESOLVABLE,
            Self::DictionaryNotFound { .. } => ErrorCode::RESOLVE_DICTIONARY_NOT_FOUND,
            Self::InvalidWeatherFile { .. } => ErrorCode::RESOLVE_INVALID_WEATHER,
            Self::MissingWeatherReference => ErrorCode::RESOLVE_MISSING_WEATHER,
            Self::SessionPersistFailure { .. } => ErrorCode::SESSION_PERSIST_FAILED,
            Self::EngineLaunchFailure { .. } => ErrorCode::EXEC_SPAWN_FAILED,
            Self::EngineTimeout { .. } => ErrorCode::EXEC_TIMEOUT,
            Self::EngineFailed { .. } => ErrorCode::EXEC_ENGINE_FAILED,
        }
    }

    /// Get the process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self.code() / 1000 {
            1 | 2 => 2,
            3 => 3,
            4 => 4,
            5 => 5,
            _ => 1,
        }
    }

    /// Get a user-friendly error message naming the failing stage
    pub fn user_message(&self) -> String {
        format!("error[{}] [E{:04}]: {}", self.stage(), self.code(), self)
    }

    /// Get a developer-friendly error message with the full source chain
    pub fn developer_message(&self) -> String {
        let mut msg = format!("{} ({})", self, describe_error_code(self.code()));
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            msg.push_str(&format!("\n  caused by: {}", cause));
            source = cause.source();
        }
        msg
    }
}

/// Type alias for Results using EpqcError
pub type Result<T> = std::result::Result<T, EpqcError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_and_exit_code_mapping() {
        let err = EpqcError::MissingEngineReference;
        assert_eq!(err.stage(), Stage::EngineResolution);
        assert_eq!(err.exit_code(), 4);

        let err = EpqcError::InvalidTimestepValue {
            value: "3".to_string(),
        };
        assert_eq!(err.stage(), Stage::TimestepRewrite);
        assert_eq!(err.exit_code(), 2);

        let err = EpqcError::EngineTimeout {
            timeout: Duration::from_secs(5),
        };
        assert_eq!(err.stage(), Stage::Dispatch);
        assert_eq!(err.exit_code(), 5);
    }

    #[test]
    fn test_user_message_names_stage_and_value() {
        let err = EpqcError::EngineNotResolvable {
            argument: "9.5.0".to_string(),
            tried: PathBuf::from("/opt/EnergyPlus-9-5-0/energyplus"),
        };
        let msg = err.user_message();
        assert!(msg.starts_with("error[engine resolution] [E4002]"));
        assert!(msg.contains("\"9.5.0\""));
    }

    #[test]
    fn test_developer_message_includes_source_chain() {
        let err = EpqcError::MutationWriteFailure {
            path: PathBuf::from("/read-only/house_qc.idf"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let msg = err.developer_message();
        assert!(msg.contains("caused by: denied"));
        assert!(msg.contains("Rewritten model file could not be written"));
    }
}
