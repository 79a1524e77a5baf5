//! The run pipeline
//!
//! Stages run in a fixed order and each at most once:
//!
//! ```text
//! Init -> ModelValidated -> [VersionReported] -> [TimestepRewritten]
//!      -> EngineResolved -> WeatherResolved -> InvocationBuilt -> Dispatched
//! ```
//!
//! `VersionReported` ends the run early. Any failure moves to `Failed` and
//! nothing is dispatched.

use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::{RunConfig, Settings};
use crate::error::{EpqcError, Result};
use crate::invocation::{self, Invocation, ResolvedConfig};
use crate::model::{ModelFile, TimestepValue, VersionTag};
use crate::resolve::{ExecutableResolver, WeatherResolver};
use crate::session::SessionStore;
use crate::subprocess::{ProcessError, ProcessOutput, ProcessRunner};

/// The unit of work an error is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Setup,
    Session,
    ModelValidation,
    VersionReport,
    TimestepRewrite,
    EngineResolution,
    WeatherResolution,
    InvocationBuild,
    Dispatch,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Setup => "setup",
            Stage::Session => "session",
            Stage::ModelValidation => "model validation",
            Stage::VersionReport => "version report",
            Stage::TimestepRewrite => "timestep rewrite",
            Stage::EngineResolution => "engine resolution",
            Stage::WeatherResolution => "weather resolution",
            Stage::InvocationBuild => "invocation build",
            Stage::Dispatch => "dispatch",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Init,
    ModelValidated,
    VersionReported,
    TimestepRewritten,
    EngineResolved,
    WeatherResolved,
    InvocationBuilt,
    Dispatched,
    Failed(Stage),
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PipelineState::VersionReported | PipelineState::Dispatched | PipelineState::Failed(_)
        )
    }
}

/// What a successful run produced
#[derive(Debug)]
pub enum RunOutcome {
    /// `--report-version`: the model version, nothing else ran
    VersionReported(VersionTag),
    /// `--dry-run`: the invocation that would have been dispatched
    Planned(Invocation),
    /// The engine ran and exited successfully
    Completed {
        invocation: Invocation,
        output: ProcessOutput,
    },
}

pub struct RunPipeline<'a> {
    config: &'a RunConfig,
    settings: &'a Settings,
    session: &'a mut SessionStore,
    runner: Arc<dyn ProcessRunner>,
    history: Vec<PipelineState>,
}

impl<'a> RunPipeline<'a> {
    pub fn new(
        config: &'a RunConfig,
        settings: &'a Settings,
        session: &'a mut SessionStore,
        runner: Arc<dyn ProcessRunner>,
    ) -> Self {
        Self {
            config,
            settings,
            session,
            runner,
            history: vec![PipelineState::Init],
        }
    }

    /// Run every stage; consumes the pipeline so it cannot run twice
    pub async fn run(self) -> Result<RunOutcome> {
        self.run_traced().await.0
    }

    /// Like [`run`](Self::run), also returning the states visited
    pub async fn run_traced(mut self) -> (Result<RunOutcome>, Vec<PipelineState>) {
        let result = self.execute().await;
        if let Err(ref err) = result {
            self.transition(PipelineState::Failed(err.stage()));
        }
        (result, self.history)
    }

    fn transition(&mut self, next: PipelineState) {
        debug!("Pipeline state: {:?}", next);
        self.history.push(next);
    }

    async fn execute(&mut self) -> Result<RunOutcome> {
        info!(
            "The model supplied to the program was \"{}\"",
            self.config.model.display()
        );
        let mut model = ModelFile::open(&self.config.model, &self.settings.model.extension)?;
        self.transition(PipelineState::ModelValidated);

        if self.config.report_version {
            let version = model.version()?;
            info!("Model version is {}", version);
            self.transition(PipelineState::VersionReported);
            return Ok(RunOutcome::VersionReported(version));
        }

        let timestep = match &self.config.timestep {
            Some(raw) => {
                info!("The argument given for the timestep was {}", raw);
                let value: TimestepValue = raw.parse()?;
                model = model.with_timestep(value, &self.settings.model.mutation_suffix)?;
                self.transition(PipelineState::TimestepRewritten);
                Some(value)
            }
            None => None,
        };

        let engine = ExecutableResolver::new(&self.settings.engine).resolve(
            self.config.engine.as_deref(),
            self.config.dictionary.as_deref(),
            self.session.state_mut(),
        );
        // A resolution error outranks a failed save
        let saved = match self.config.engine {
            Some(_) => self.session.save(),
            None => Ok(()),
        };
        let engine = engine?;
        saved?;
        self.transition(PipelineState::EngineResolved);

        let weather = WeatherResolver::new(&self.settings.weather.extension)
            .resolve(self.config.weather.as_deref(), self.session.state_mut());
        let saved = match self.config.weather {
            Some(_) => self.session.save(),
            None => Ok(()),
        };
        let weather = weather?;
        saved?;
        self.transition(PipelineState::WeatherResolved);

        let resolved = ResolvedConfig::new(
            model,
            engine,
            weather,
            timestep,
            self.config.options.clone(),
        );
        let invocation = invocation::build(resolved);
        debug!("Invocation: {:?}", invocation.tokens());
        self.transition(PipelineState::InvocationBuilt);

        if self.config.dry_run {
            info!("Dry run: the engine was not started");
            return Ok(RunOutcome::Planned(invocation));
        }

        let output = self.dispatch(&invocation).await?;
        self.transition(PipelineState::Dispatched);
        Ok(RunOutcome::Completed { invocation, output })
    }

    async fn dispatch(&self, invocation: &Invocation) -> Result<ProcessOutput> {
        info!(
            "A simulation run was started for \"{}\"",
            invocation
                .args
                .last()
                .map(String::as_str)
                .unwrap_or_default()
        );
        let command = invocation.to_command(self.config.timeout);
        let output = self
            .runner
            .run(command)
            .await
            .map_err(|source| match source {
                ProcessError::Timeout(timeout) => EpqcError::EngineTimeout { timeout },
                source => EpqcError::EngineLaunchFailure {
                    program: invocation.program.clone(),
                    source,
                },
            })?;

        for line in output.stdout.lines() {
            info!(target: "engine", "{}", line);
        }
        for line in output.stderr.lines() {
            warn!(target: "engine", "{}", line);
        }

        if !output.status.success() {
            return Err(EpqcError::EngineFailed {
                code: output.status.code().unwrap_or(-1),
            });
        }
        info!("Simulation finished in {:?}", output.duration);
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineLayout;
    use crate::invocation::RunOptions;
    use crate::session::SessionKey;
    use crate::subprocess::{MockProcessRunner, SubprocessManager};
    use std::fs;
    use std::path::PathBuf;
    use std::time::Duration;
    use tempfile::TempDir;

    struct Fixture {
        dir: TempDir,
        settings: Settings,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let settings = Settings {
                engine: EngineLayout {
                    install_root: dir
                        .path()
                        .join("EnergyPlus-{version}")
                        .to_string_lossy()
                        .into_owned(),
                    executable: "energyplus".to_string(),
                    executable_ext: String::new(),
                    dictionary_ext: ".idd".to_string(),
                },
                ..Settings::default()
            };
            Self { dir, settings }
        }

        fn path(&self, name: &str) -> PathBuf {
            self.dir.path().join(name)
        }

        fn write(&self, name: &str, text: &str) -> PathBuf {
            let path = self.path(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(&path, text).unwrap();
            path
        }

        fn install(&self, version: &str) -> PathBuf {
            let dir = format!("EnergyPlus-{}", version.replace('.', "-"));
            self.write(&format!("{dir}/Energy+.idd"), "");
            self.write(&format!("{dir}/energyplus"), "")
        }

        fn model(&self) -> PathBuf {
            self.write("house.idf", "Version,9.5;\nTimestep,\n    4;\n")
        }
    }

    async fn run(
        config: &RunConfig,
        fixture: &Fixture,
        session: &mut SessionStore,
        runner: MockProcessRunner,
    ) -> (Result<RunOutcome>, Vec<PipelineState>) {
        RunPipeline::new(config, &fixture.settings, session, Arc::new(runner))
            .run_traced()
            .await
    }

    #[tokio::test]
    async fn test_report_version_short_circuits() {
        let fx = Fixture::new();
        let config = RunConfig::new(fx.model()).with_report_version(true);
        let mut session = SessionStore::in_memory();

        let (result, history) = run(&config, &fx, &mut session, MockProcessRunner::new()).await;

        match result.unwrap() {
            RunOutcome::VersionReported(v) => assert_eq!(v.as_str(), "9.5"),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(
            history,
            vec![
                PipelineState::Init,
                PipelineState::ModelValidated,
                PipelineState::VersionReported
            ]
        );
    }

    #[tokio::test]
    async fn test_report_version_missing_fails() {
        let fx = Fixture::new();
        let model = fx.write("bare.idf", "Building,X;\n");
        let config = RunConfig::new(model).with_report_version(true);
        let mut session = SessionStore::in_memory();

        let (result, history) = run(&config, &fx, &mut session, MockProcessRunner::new()).await;

        assert!(matches!(result, Err(EpqcError::VersionNotFound { .. })));
        assert_eq!(
            history.last(),
            Some(&PipelineState::Failed(Stage::VersionReport))
        );
    }

    #[tokio::test]
    async fn test_invalid_model_fails_first() {
        let fx = Fixture::new();
        let config = RunConfig::new(fx.path("missing.idf"));
        let mut session = SessionStore::in_memory();

        let (result, history) = run(&config, &fx, &mut session, MockProcessRunner::new()).await;

        assert!(matches!(result, Err(EpqcError::InvalidModelFile { .. })));
        assert_eq!(
            history,
            vec![
                PipelineState::Init,
                PipelineState::Failed(Stage::ModelValidation)
            ]
        );
    }

    #[tokio::test]
    async fn test_invalid_timestep_writes_nothing() {
        let fx = Fixture::new();
        for value in ["0", "3", "5", "10", "-1", "2.5"] {
            let config = RunConfig::new(fx.model()).with_timestep(value);
            let mut session = SessionStore::in_memory();

            let (result, _) = run(&config, &fx, &mut session, MockProcessRunner::new()).await;

            assert!(matches!(
                result,
                Err(EpqcError::InvalidTimestepValue { value: ref v }) if v == value
            ));
            assert!(!fx.path("house_qc.idf").exists());
        }
    }

    #[tokio::test]
    async fn test_missing_engine_reference() {
        let fx = Fixture::new();
        let config = RunConfig::new(fx.model());
        let mut session = SessionStore::in_memory();

        let (result, history) = run(&config, &fx, &mut session, MockProcessRunner::new()).await;

        assert!(matches!(result, Err(EpqcError::MissingEngineReference)));
        assert_eq!(
            history.last(),
            Some(&PipelineState::Failed(Stage::EngineResolution))
        );
    }

    #[tokio::test]
    async fn test_unresolvable_version() {
        let fx = Fixture::new();
        let config = RunConfig::new(fx.model()).with_engine("9.5.0");
        let mut session = SessionStore::in_memory();

        let (result, _) = run(&config, &fx, &mut session, MockProcessRunner::new()).await;

        assert!(matches!(result, Err(EpqcError::EngineNotResolvable { .. })));
    }

    /// A session file that can never be saved: its parent is a plain file
    fn unsaveable_session(fx: &Fixture) -> SessionStore {
        let blocker = fx.write("blocker", "");
        SessionStore::open(blocker.join("session.json")).unwrap()
    }

    #[tokio::test]
    async fn test_resolution_error_reported_before_save_failure() {
        let fx = Fixture::new();
        let config = RunConfig::new(fx.model()).with_engine("9.9.9");
        let mut session = unsaveable_session(&fx);

        let (result, history) = run(&config, &fx, &mut session, MockProcessRunner::new()).await;

        assert!(matches!(result, Err(EpqcError::EngineNotResolvable { .. })));
        assert_eq!(
            history.last(),
            Some(&PipelineState::Failed(Stage::EngineResolution))
        );
    }

    #[tokio::test]
    async fn test_save_failure_after_successful_resolution() {
        let fx = Fixture::new();
        fx.install("9.5.0");
        let config = RunConfig::new(fx.model()).with_engine("9.5.0");
        let mut session = unsaveable_session(&fx);

        let (result, history) = run(&config, &fx, &mut session, MockProcessRunner::new()).await;

        assert!(matches!(
            result,
            Err(EpqcError::SessionPersistFailure { .. })
        ));
        assert_eq!(history.last(), Some(&PipelineState::Failed(Stage::Session)));
    }

    #[tokio::test]
    async fn test_weather_error_reported_before_save_failure() {
        let fx = Fixture::new();
        let exe = fx.install("9.5.0");
        let config = RunConfig::new(fx.model()).with_weather(fx.path("absent.epw"));
        let mut session = unsaveable_session(&fx);
        session.set(SessionKey::EnginePath, exe);

        let (result, _) = run(&config, &fx, &mut session, MockProcessRunner::new()).await;

        assert!(matches!(result, Err(EpqcError::InvalidWeatherFile { .. })));
    }

    #[tokio::test]
    async fn test_dictionary_override_reaches_invocation() {
        let fx = Fixture::new();
        fx.install("9.5.0");
        let epw = fx.write("city.epw", "");
        let idd = fx.write("custom/V9-5-0-Energy+.idd", "");
        let config = RunConfig::new(fx.model())
            .with_engine("9.5.0")
            .with_weather(&epw)
            .with_dictionary(&idd)
            .with_dry_run(true);
        let mut session = SessionStore::in_memory();

        let (result, _) = run(&config, &fx, &mut session, MockProcessRunner::new()).await;

        match result.unwrap() {
            RunOutcome::Planned(invocation) => {
                let idd_arg = invocation
                    .args
                    .iter()
                    .position(|a| a == "--idd")
                    .map(|i| invocation.args[i + 1].clone());
                assert_eq!(idd_arg, Some(idd.display().to_string()));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_spawn_failure_is_launch_failure() {
        let fx = Fixture::new();
        fx.install("9.5.0");
        let epw = fx.write("city.epw", "");
        let config = RunConfig::new(fx.model())
            .with_engine("9.5.0")
            .with_weather(&epw);
        let mut session = SessionStore::in_memory();

        // No expectation registered, so the runner refuses to start anything
        let (result, history) = run(&config, &fx, &mut session, MockProcessRunner::new()).await;

        let err = result.unwrap_err();
        assert!(matches!(err, EpqcError::EngineLaunchFailure { .. }));
        assert_eq!(err.stage(), Stage::Dispatch);
        assert_eq!(err.exit_code(), 5);
        assert_eq!(history.last(), Some(&PipelineState::Failed(Stage::Dispatch)));
    }

    #[tokio::test]
    async fn test_missing_weather_reference() {
        let fx = Fixture::new();
        fx.install("9.5.0");
        let config = RunConfig::new(fx.model()).with_engine("9.5.0");
        let mut session = SessionStore::in_memory();

        let (result, _) = run(&config, &fx, &mut session, MockProcessRunner::new()).await;

        assert!(matches!(result, Err(EpqcError::MissingWeatherReference)));
        assert!(session.get(SessionKey::EnginePath).is_some());
    }

    #[tokio::test]
    async fn test_full_run_dispatches_rewritten_model() {
        let fx = Fixture::new();
        let exe = fx.install("9.5.0");
        let epw = fx.write("city.epw", "LOCATION");
        let program = exe.display().to_string();
        let expected_model = fx.path("house_qc.idf").display().to_string();

        let mut mock = MockProcessRunner::new();
        let last = expected_model.clone();
        mock.expect_command(&program)
            .with_args(move |args| args.last() == Some(&last))
            .returns_stdout("EnergyPlus Completed Successfully.\n")
            .finish();

        let config = RunConfig::new(fx.model())
            .with_engine("9.5.0")
            .with_weather(&epw)
            .with_timestep(6);
        let mut session = SessionStore::in_memory();

        let (result, history) = run(&config, &fx, &mut session, mock.clone()).await;

        match result.unwrap() {
            RunOutcome::Completed { invocation, output } => {
                assert_eq!(invocation.program, exe);
                assert_eq!(invocation.working_dir, fx.dir.path());
                assert!(output.status.success());
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(
            history,
            vec![
                PipelineState::Init,
                PipelineState::ModelValidated,
                PipelineState::TimestepRewritten,
                PipelineState::EngineResolved,
                PipelineState::WeatherResolved,
                PipelineState::InvocationBuilt,
                PipelineState::Dispatched,
            ]
        );
        assert!(mock.verify_called(&program, 1));
        let text = fs::read_to_string(fx.path("house_qc.idf")).unwrap();
        assert!(text.contains("Timestep,\n    6;"));
        assert_eq!(session.get(SessionKey::WeatherPath), Some(epw.as_path()));
    }

    #[tokio::test]
    async fn test_session_values_reused_across_runs() {
        let fx = Fixture::new();
        let exe = fx.install("9.5.0");
        let epw = fx.write("city.epw", "LOCATION");
        let session_file = fx.path("session/shell.json");

        let first = RunConfig::new(fx.model())
            .with_engine("9.5.0")
            .with_weather(&epw)
            .with_dry_run(true);
        let mut session = SessionStore::open(session_file.clone()).unwrap();
        let (result, _) = run(&first, &fx, &mut session, MockProcessRunner::new()).await;
        assert!(result.is_ok());

        let second = RunConfig::new(fx.model()).with_dry_run(true);
        let mut reopened = SessionStore::open(session_file).unwrap();
        let (result, _) = run(&second, &fx, &mut reopened, MockProcessRunner::new()).await;

        match result.unwrap() {
            RunOutcome::Planned(invocation) => {
                assert_eq!(invocation.program, exe);
                assert!(invocation.args.contains(&epw.display().to_string()));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_dry_run_does_not_dispatch() {
        let fx = Fixture::new();
        let exe = fx.install("9.5.0");
        let epw = fx.write("city.epw", "");
        let mock = MockProcessRunner::new();
        let config = RunConfig::new(fx.model())
            .with_engine(exe.display().to_string())
            .with_weather(&epw)
            .with_dry_run(true)
            .with_options(RunOptions {
                annual: true,
                ..RunOptions::default()
            });
        let mut session = SessionStore::in_memory();

        let (result, history) = run(&config, &fx, &mut session, mock.clone()).await;

        assert!(matches!(result, Ok(RunOutcome::Planned(ref i)) if i.args.contains(&"--annual".to_string())));
        assert_eq!(history.last(), Some(&PipelineState::InvocationBuilt));
        assert!(mock.get_call_history().is_empty());
    }

    #[tokio::test]
    async fn test_engine_timeout() {
        let fx = Fixture::new();
        let exe = fx.install("9.5.0");
        let epw = fx.write("city.epw", "");
        let mut mock = MockProcessRunner::new();
        mock.expect_command(&exe.display().to_string())
            .times_out(Duration::from_secs(1))
            .finish();
        let config = RunConfig::new(fx.model())
            .with_engine("9.5.0")
            .with_weather(&epw)
            .with_timeout(Duration::from_secs(1));
        let mut session = SessionStore::in_memory();

        let (result, history) = run(&config, &fx, &mut session, mock).await;

        assert!(matches!(result, Err(EpqcError::EngineTimeout { .. })));
        assert_eq!(history.last(), Some(&PipelineState::Failed(Stage::Dispatch)));
    }

    #[tokio::test]
    async fn test_engine_failure_status() {
        let fx = Fixture::new();
        let exe = fx.install("9.5.0");
        let epw = fx.write("city.epw", "");
        let (manager, mut mock) = SubprocessManager::mock();
        mock.expect_command(&exe.display().to_string())
            .returns_stderr("** Severe  ** missing object\n")
            .returns_exit_code(1)
            .finish();
        let config = RunConfig::new(fx.model())
            .with_engine("9.5.0")
            .with_weather(&epw);
        let mut session = SessionStore::in_memory();

        let result = RunPipeline::new(&config, &fx.settings, &mut session, manager.runner())
            .run()
            .await;

        assert!(matches!(result, Err(EpqcError::EngineFailed { code: 1 })));
    }

    #[test]
    fn test_terminal_states() {
        assert!(PipelineState::VersionReported.is_terminal());
        assert!(PipelineState::Failed(Stage::Setup).is_terminal());
        assert!(!PipelineState::InvocationBuilt.is_terminal());
        assert_eq!(Stage::WeatherResolution.to_string(), "weather resolution");
    }
}
