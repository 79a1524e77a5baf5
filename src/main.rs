use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

use epqc::app::{handle_fatal_error, init_logging, AppConfig};
use epqc::config::{RunConfig, Settings};
use epqc::invocation::RunOptions;
use epqc::pipeline::{RunOutcome, RunPipeline};
use epqc::session::open_session;
use epqc::subprocess::SubprocessManager;

/// Run EnergyPlus model files in QC mode
#[derive(Parser, Debug)]
#[command(name = "epqc", version)]
#[command(about = "Validate, adjust and launch EnergyPlus runs with session-remembered engine and weather selections", long_about = None)]
#[command(after_help = "Engine and weather selections are remembered per console. Set EPQC_SESSION \
to a name of your choosing to scope them explicitly; otherwise the console is identified \
by its process id and start time where the platform exposes it.")]
struct Cli {
    /// A file path for an EnergyPlus .idf model file
    #[arg(value_name = "MODEL", required_unless_present = "clear_session")]
    model: Option<PathBuf>,

    /// Engine executable path or version shorthand, e.g. "9.5.0"
    #[arg(short = 'e', long, value_name = "ARG", help_heading = "Once per session")]
    engine: Option<String>,

    /// EnergyPlus .epw weather file
    #[arg(short = 'w', long, value_name = "ARG", help_heading = "Once per session")]
    weather: Option<PathBuf>,

    /// Forget the engine and weather stored for this console session and exit
    #[arg(long, help_heading = "Once per session")]
    clear_session: bool,

    /// Use this session file instead of the per-console default
    #[arg(long, value_name = "PATH", help_heading = "Once per session")]
    session_file: Option<PathBuf>,

    /// Print the model version and exit
    #[arg(short = 'v', long)]
    report_version: bool,

    /// Simulation timesteps per hour. Valid options {6,4,2,1}
    #[arg(short = 't', long, value_name = "N", allow_hyphen_values = true)]
    timestep: Option<String>,

    /// Print the engine command line instead of running it
    #[arg(long)]
    dry_run: bool,

    /// Give up on the engine after this many seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Skip the variable post-processor after the simulation
    #[arg(long)]
    no_readvars: bool,

    /// Skip template object expansion
    #[arg(long)]
    no_expandobjects: bool,

    /// Force an annual simulation
    #[arg(long)]
    annual: bool,

    /// Directory for simulation outputs (default: next to the model)
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Custom Energy+.idd dictionary (default: the one next to the engine)
    #[arg(long, value_name = "PATH", help_heading = "Overrides")]
    dictionary: Option<PathBuf>,

    /// Write diagnostics and engine output to this file instead of stdout
    #[arg(long, value_name = "PATH", help_heading = "Overrides")]
    log: Option<PathBuf>,

    /// Settings file (default: config.toml in the user config directory)
    #[arg(long, value_name = "PATH", help_heading = "Overrides")]
    config: Option<PathBuf>,

    /// Increase diagnostic output (-d for debug, -dd for trace, -ddd for all)
    #[arg(short = 'd', long = "debug", action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn run_config(&self) -> anyhow::Result<RunConfig> {
        let model = self
            .model
            .clone()
            .ok_or_else(|| anyhow::anyhow!("A model file argument is required"))?;

        Ok(RunConfig {
            model,
            engine: self.engine.clone(),
            weather: self.weather.clone(),
            report_version: self.report_version,
            timestep: self.timestep.clone(),
            dictionary: self.dictionary.clone(),
            timeout: self.timeout.map(Duration::from_secs),
            dry_run: self.dry_run,
            options: RunOptions {
                readvars: !self.no_readvars,
                expandobjects: !self.no_expandobjects,
                annual: self.annual,
                output_dir: self.output_dir.clone(),
            },
        })
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    let verbose = cli.verbose;

    if let Err(e) = run(cli).await {
        handle_fatal_error(e, verbose);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let app_config = AppConfig::new(cli.verbose).with_log_file(cli.log.clone());
    init_logging(&app_config)?;

    let settings = Settings::load(cli.config.as_deref())?;
    let mut session = open_session(cli.session_file.clone())?;
    if let Some(path) = session.path() {
        debug!("Session file: {}", path.display());
    }

    if cli.clear_session {
        session.clear()?;
        println!("The session engine and weather selections were cleared.");
        return Ok(());
    }

    let config = cli.run_config()?;
    let runner = SubprocessManager::production().runner();
    let outcome = RunPipeline::new(&config, &settings, &mut session, runner)
        .run()
        .await?;

    match outcome {
        RunOutcome::VersionReported(version) => println!("{version}"),
        RunOutcome::Planned(invocation) => {
            println!("{}", shell_words::join(invocation.tokens()));
        }
        RunOutcome::Completed { invocation, .. } => {
            info!(
                "Simulation outputs are in {}",
                config
                    .options
                    .output_dir
                    .as_ref()
                    .unwrap_or(&invocation.working_dir)
                    .display()
            );
        }
    }

    Ok(())
}
