//! Error handling utilities
//!
//! This module provides centralized error handling for the application.

use tracing::error;

use crate::error::EpqcError;

/// Report a fatal error on standard error and exit with its status code
///
/// - For `EpqcError`: prints the stage-tagged message; `-d` adds the source chain
/// - For other errors: prints the message and exits with 1
pub fn handle_fatal_error(error: anyhow::Error, verbose: u8) -> ! {
    error!("Fatal error: {}", error);

    let exit_code = if let Some(err) = error.downcast_ref::<EpqcError>() {
        eprintln!("{}", err.user_message());
        if verbose >= 1 {
            eprintln!("\nContext Chain:\n{}", err.developer_message());
        }
        err.exit_code()
    } else {
        eprintln!("Error: {error}");
        if verbose >= 1 {
            eprintln!("\nError chain:");
            for (i, cause) in error.chain().enumerate() {
                eprintln!("  {}: {}", i, cause);
            }
        }
        1
    };

    std::process::exit(exit_code)
}
