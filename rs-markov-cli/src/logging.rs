//! Logging initialisation for the rs-markov CLI.
//!
//! Installs `env_logger` behind the `log` facade. Diagnostics go to `stderr`
//! so generated sentences on `stdout` stay clean.

use std::sync::OnceLock;

use env_logger::{Builder, Env, Target};
use thiserror::Error;

static INITIALISED: OnceLock<()> = OnceLock::new();

/// Errors raised while initialising logging.
#[derive(Debug, Error)]
pub enum LoggingError {
	/// Another logger already owns the global slot.
	#[error("failed to install logger: {source}")]
	InstallFailed {
		#[source]
		source: log::SetLoggerError,
	},
}

/// Maps the `-v` count to a default filter; `RUST_LOG` still wins.
pub fn default_filter(verbosity: u8) -> &'static str {
	match verbosity {
		0 => "warn",
		1 => "info",
		2 => "debug",
		_ => "trace",
	}
}

/// Install the global logger if it has not already been configured.
///
/// # Errors
/// Returns [`LoggingError`] if a different logger is already installed.
pub fn init_logging(verbosity: u8) -> Result<(), LoggingError> {
	if INITIALISED.get().is_some() {
		return Ok(());
	}

	Builder::from_env(Env::default().default_filter_or(default_filter(verbosity)))
		.target(Target::Stderr)
		.format_timestamp(None)
		.try_init()
		.map_err(|source| LoggingError::InstallFailed { source })?;

	let _ = INITIALISED.set(());
	Ok(())
}
