//! Logging configuration and initialization
//!
//! Diagnostics and captured engine output go to standard output, or to the
//! file given with `--log` (appended, no colors).

use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing::{debug, trace};
use tracing_subscriber::EnvFilter;

use crate::app::config::AppConfig;
use crate::error::{EpqcError, Result};

/// Environment variable that overrides the verbosity-derived filter
pub const LOG_FILTER_ENV: &str = "EPQC_LOG";

fn env_filter(config: &AppConfig) -> EnvFilter {
    EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new(config.log_level()))
}

/// Initialize tracing/logging for the application
pub fn init_logging(config: &AppConfig) -> Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(config))
        .with_target(config.verbose >= 2)
        .with_thread_ids(config.verbose >= 3)
        .with_line_number(config.verbose >= 3);

    match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| EpqcError::LogOpenFailure {
                    path: path.clone(),
                    source,
                })?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(std::io::stdout).init(),
    }

    debug!("epqc started with verbosity level: {}", config.verbose);
    trace!("Full CLI args: {:?}", std::env::args().collect::<Vec<_>>());
    Ok(())
}
