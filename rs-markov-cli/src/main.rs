//! CLI entry point for building Markov text models and generating sentences.
//!
//! Parses command-line arguments with clap, dispatches to build or run mode
//! and reports any failure on stdout. Failures are reported, not signalled:
//! the process exits successfully either way.

use std::io::{self, BufWriter, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use log::error;

use rs_markov_cli::{
	cli::{Cli, run_cli},
	logging::{self, LoggingError},
};

/// Execute the selected mode and flush the output stream.
fn try_main<W: Write>(cli: &Cli, writer: &mut W) -> Result<()> {
	run_cli(cli, writer)?;
	writer.flush().context("failed to flush output")?;
	Ok(())
}

fn main() -> ExitCode {
	let cli = Cli::parse();

	if let Err(err) = logging::init_logging(cli.verbose) {
		report_logging_init_error(&err);
	}

	let stdout = io::stdout();
	let mut writer = BufWriter::new(stdout.lock());

	if let Err(err) = try_main(&cli, &mut writer) {
		error!("command failed: {err:#}");
		let _ = writeln!(writer, "{err:#}");
		let _ = writer.flush();
	}

	ExitCode::SUCCESS
}

fn report_logging_init_error(err: &LoggingError) {
	eprintln!("failed to initialize logging: {err}");
}
