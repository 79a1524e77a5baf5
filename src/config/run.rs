//! The static option set for one launcher run
//!
//! Built once by the CLI front-end and handed to the pipeline unchanged.

use std::path::PathBuf;
use std::time::Duration;

use crate::invocation::RunOptions;

#[derive(Debug, Clone, Default)]
pub struct RunConfig {
    /// Model file to run (required)
    pub model: PathBuf,
    /// Engine path or version shorthand; falls back to the session
    pub engine: Option<String>,
    /// Weather file; falls back to the session
    pub weather: Option<PathBuf>,
    /// Print the model version and stop
    pub report_version: bool,
    /// Raw timesteps-per-hour argument, checked against 1, 2, 4, 6 before any write
    pub timestep: Option<String>,
    /// Dictionary file used instead of the one next to the engine
    pub dictionary: Option<PathBuf>,
    /// Limit on the blocking engine call
    pub timeout: Option<Duration>,
    /// Stop after building the invocation
    pub dry_run: bool,
    pub options: RunOptions,
}

impl RunConfig {
    pub fn new(model: impl Into<PathBuf>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    pub fn with_engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = Some(engine.into());
        self
    }

    pub fn with_weather(mut self, weather: impl Into<PathBuf>) -> Self {
        self.weather = Some(weather.into());
        self
    }

    pub fn with_timestep(mut self, timestep: impl ToString) -> Self {
        self.timestep = Some(timestep.to_string());
        self
    }

    pub fn with_dictionary(mut self, dictionary: impl Into<PathBuf>) -> Self {
        self.dictionary = Some(dictionary.into());
        self
    }

    pub fn with_report_version(mut self, report: bool) -> Self {
        self.report_version = report;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }
}
