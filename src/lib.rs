//! # epqc
//!
//! A command-line front-end that prepares and launches EnergyPlus runs.
//!
//! ## Usage
//!
//! ```bash
//! epqc house.idf -e 9.5.0 -w city.epw [-t 6] [--dry-run]
//! epqc house.idf            # engine and weather remembered for this console
//! epqc house.idf -v         # print the model version
//! ```
//!
//! ## Modules
//!
//! - `app` - Logging setup and fatal error reporting
//! - `config` - Engine layout settings and the per-run option set
//! - `error` - Error type with stage attribution and exit codes
//! - `invocation` - Engine command line assembly
//! - `model` - Model file validation, version extraction, timestep rewriting
//! - `pipeline` - The ordered run stages
//! - `resolve` - Engine, dictionary and weather resolution
//! - `session` - Console-scoped persistence of engine and weather selections
//! - `subprocess` - External process abstraction with a mock for tests
pub mod app;
pub mod config;
pub mod error;
pub mod invocation;
pub mod model;
pub mod pipeline;
pub mod resolve;
pub mod session;
pub mod subprocess;
