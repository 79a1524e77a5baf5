//! Assembly of the engine command line
//!
//! [`ResolvedConfig`] can only be built from values that already passed
//! validation, so [`build`] does no checking of its own.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::model::{ModelFile, TimestepValue};
use crate::resolve::EngineSelection;
use crate::subprocess::{ProcessCommand, ProcessCommandBuilder};

/// Output file suffix style passed to the engine (`eplusout` -> `<prefix>C`)
pub const OUTPUT_SUFFIX: &str = "C";

/// Toggles forwarded to the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Run the variable post-processor after the simulation
    pub readvars: bool,
    /// Expand template objects before the simulation
    pub expandobjects: bool,
    /// Force an annual run regardless of the model's run periods
    pub annual: bool,
    /// Where outputs go; the model directory when unset
    pub output_dir: Option<PathBuf>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            readvars: true,
            expandobjects: true,
            annual: false,
            output_dir: None,
        }
    }
}

/// Every input the engine needs, each one already validated
///
/// Built only by the pipeline, from values the resolvers returned.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    model: ModelFile,
    engine: EngineSelection,
    weather: PathBuf,
    timestep: Option<TimestepValue>,
    options: RunOptions,
}

impl ResolvedConfig {
    pub(crate) fn new(
        model: ModelFile,
        engine: EngineSelection,
        weather: PathBuf,
        timestep: Option<TimestepValue>,
        options: RunOptions,
    ) -> Self {
        Self {
            model,
            engine,
            weather,
            timestep,
            options,
        }
    }

    pub fn model(&self) -> &ModelFile {
        &self.model
    }

    pub fn engine(&self) -> &Path {
        &self.engine.engine
    }

    pub fn dictionary(&self) -> &Path {
        &self.engine.dictionary
    }

    pub fn weather(&self) -> &Path {
        &self.weather
    }

    pub fn timestep(&self) -> Option<TimestepValue> {
        self.timestep
    }
}

/// The engine command line and the directory it runs from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
}

impl Invocation {
    /// Program followed by its arguments
    pub fn tokens(&self) -> Vec<String> {
        std::iter::once(self.program.display().to_string())
            .chain(self.args.iter().cloned())
            .collect()
    }

    pub fn to_command(&self, timeout: Option<Duration>) -> ProcessCommand {
        ProcessCommandBuilder::new(&self.program.to_string_lossy())
            .args(&self.args)
            .current_dir(&self.working_dir)
            .timeout(timeout)
            .build()
    }
}

/// Build the engine invocation. Consumes the resolved configuration.
pub fn build(config: ResolvedConfig) -> Invocation {
    let working_dir = config.model.directory();
    let output_dir = config
        .options
        .output_dir
        .clone()
        .unwrap_or_else(|| working_dir.clone());

    let mut args = vec![
        "--weather".to_string(),
        config.weather.display().to_string(),
        "--idd".to_string(),
        config.engine.dictionary.display().to_string(),
        "--output-directory".to_string(),
        output_dir.display().to_string(),
        "--output-prefix".to_string(),
        config.model.stem(),
        "--output-suffix".to_string(),
        OUTPUT_SUFFIX.to_string(),
    ];
    if config.options.readvars {
        args.push("--readvars".to_string());
    }
    if config.options.expandobjects {
        args.push("--expandobjects".to_string());
    }
    if config.options.annual {
        args.push("--annual".to_string());
    }
    args.push(config.model.path().display().to_string());

    Invocation {
        program: config.engine.engine,
        args,
        working_dir,
    }
}
