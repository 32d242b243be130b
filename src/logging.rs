//! Console logging setup
//!
//! Errors and warnings are always shown. Progress messages only appear with
//! `--verbose`. `RUST_LOG` overrides both.

use std::io::{self, IsTerminal};

use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. Calling it more than once is harmless.
pub fn init(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stdout)
        .with_ansi(io::stdout().is_terminal())
        .with_target(false)
        .without_time()
        .try_init();
}
